use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use tracing::{info, warn};
use uuid::Uuid;

use aloite_types::models::User;

use crate::Platform;
use crate::actor::ActorContext;
use crate::authz::{Action, Target, authorize};
use crate::convert::user_from_row;
use crate::error::{CoreError, CoreResult};

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=32;
const MIN_NAME_LEN: usize = 2;

/// Registration form as received from the request layer.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

impl Platform {
    pub fn register(&self, reg: &Registration<'_>) -> CoreResult<User> {
        let username = reg.username.trim();
        if !USERNAME_LEN.contains(&username.chars().count()) {
            return Err(CoreError::validation(format!(
                "username must be {} to {} characters",
                USERNAME_LEN.start(),
                USERNAME_LEN.end()
            )));
        }
        if reg.password.chars().count() < self.config.min_password_len {
            return Err(CoreError::validation(format!(
                "password must be at least {} characters",
                self.config.min_password_len
            )));
        }
        if reg.password != reg.password_confirm {
            return Err(CoreError::validation("passwords do not match"));
        }
        let first_name = optional_name(reg.first_name, "first name")?;
        let last_name = optional_name(reg.last_name, "last name")?;

        self.create_account(username, reg.password, first_name, last_name, false)
    }

    pub fn login(&self, username: &str, password: &str) -> CoreResult<User> {
        let row = self
            .db
            .get_user_by_username(username.trim())?
            .ok_or(CoreError::InvalidCredentials)?;

        if !verify_password(password, &row.password_hash)? {
            return Err(CoreError::InvalidCredentials);
        }
        Ok(user_from_row(row))
    }

    /// Turn a session's user id into an actor. A user deleted since the
    /// session began resolves to an anonymous actor; the admin flag is always
    /// the current one.
    pub fn resolve_actor(&self, user_id: Uuid) -> CoreResult<ActorContext> {
        let actor = match self.db.get_user_by_id(&user_id.to_string())? {
            Some(row) if row.is_admin => ActorContext::admin(user_id),
            Some(_) => ActorContext::user(user_id),
            None => ActorContext::anonymous(),
        };
        Ok(actor)
    }

    pub fn user(&self, id: Uuid) -> CoreResult<User> {
        self.db
            .get_user_by_id(&id.to_string())?
            .map(user_from_row)
            .ok_or(CoreError::NotFound("user"))
    }

    pub fn list_users(&self, actor: &ActorContext) -> CoreResult<Vec<User>> {
        authorize(actor, Action::AdminList, &Target::None).into_result()?;
        Ok(self.db.list_users()?.into_iter().map(user_from_row).collect())
    }

    /// Returns whether the flag actually changed.
    pub fn grant_admin(&self, actor: &ActorContext, user_id: Uuid) -> CoreResult<bool> {
        self.set_admin_flag(actor, user_id, Action::GrantAdmin, true)
    }

    pub fn revoke_admin(&self, actor: &ActorContext, user_id: Uuid) -> CoreResult<bool> {
        self.set_admin_flag(actor, user_id, Action::RevokeAdmin, false)
    }

    fn set_admin_flag(
        &self,
        actor: &ActorContext,
        user_id: Uuid,
        action: Action,
        is_admin: bool,
    ) -> CoreResult<bool> {
        if let Err(denial) = authorize(actor, action, &Target::User(user_id)).into_result() {
            warn!("{:?} on {} refused for {:?}: {:?}", action, user_id, actor.user_id(), denial);
            return Err(denial.into());
        }

        let target = self.user(user_id)?;
        if target.is_admin == is_admin {
            return Ok(false);
        }
        if !self.db.set_admin(&user_id.to_string(), is_admin)? {
            return Err(CoreError::NotFound("user"));
        }

        info!("User {} admin={} set by {:?}", target.username, is_admin, actor.user_id());
        Ok(true)
    }

    /// Make sure an administrator account called `username` exists. Used at
    /// startup; an existing account is promoted and keeps its password.
    pub fn ensure_admin(&self, username: &str, password: &str) -> CoreResult<User> {
        if let Some(row) = self.db.get_user_by_username(username)? {
            if !row.is_admin {
                self.db.set_admin(&row.id, true)?;
                info!("Promoted existing user {} to admin", username);
            }
            let mut user = user_from_row(row);
            user.is_admin = true;
            return Ok(user);
        }
        self.create_account(username, password, None, None, true)
    }

    fn create_account(
        &self,
        username: &str,
        password: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        is_admin: bool,
    ) -> CoreResult<User> {
        let password_hash = hash_password(password)?;
        let id = Uuid::new_v4();

        let inserted = self.db.create_user(
            &id.to_string(),
            username,
            &password_hash,
            first_name,
            last_name,
            is_admin,
        )?;
        if !inserted {
            return Err(CoreError::DuplicateUsername(username.to_string()));
        }

        info!("Registered user {} ({})", username, id);
        self.user(id)
    }
}

fn optional_name<'a>(value: Option<&'a str>, field: &str) -> CoreResult<Option<&'a str>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() < MIN_NAME_LEN => Err(CoreError::validation(format!(
            "{field} must be at least {MIN_NAME_LEN} characters"
        ))),
        other => Ok(other),
    }
}

/// Argon2id with a random salt, PHC string format.
fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is malformed.
fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
