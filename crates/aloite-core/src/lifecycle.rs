//! Lifecycle controller.
//!
//! An initiative is `Active`, `Inactive`, `SoftDeleted` or `Purged` (row
//! gone). The state is derived from the stored `active`/`deleted` flags;
//! [`LifecycleState::apply`] is the transition table and the `Platform`
//! methods below authorize, apply and persist.

use std::fmt;

use tracing::{debug, info};
use uuid::Uuid;

use aloite_db::models::{InitiativeRow, PurgeCounts};

use crate::Platform;
use crate::actor::ActorContext;
use crate::authz::{self, Action, Target, authorize};
use crate::convert::facts;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Active,
    Inactive,
    /// Remembers the `active` flag so a restore can put it back.
    SoftDeleted { was_active: bool },
    Purged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate,
    Deactivate,
    SoftDelete,
    Restore,
    Purge,
}

impl LifecycleState {
    pub fn from_flags(active: bool, deleted: bool) -> Self {
        match (deleted, active) {
            (true, was_active) => LifecycleState::SoftDeleted { was_active },
            (false, true) => LifecycleState::Active,
            (false, false) => LifecycleState::Inactive,
        }
    }

    /// Next state, or `InvalidTransition`. Moving into the state already held
    /// returns it unchanged.
    pub fn apply(self, transition: Transition) -> CoreResult<LifecycleState> {
        use LifecycleState::*;
        use Transition::*;

        let next = match (self, transition) {
            (Active | Inactive, Activate) => Active,
            (Active | Inactive, Deactivate) => Inactive,
            (Active, SoftDelete) => SoftDeleted { was_active: true },
            (Inactive, SoftDelete) => SoftDeleted { was_active: false },
            (SoftDeleted { .. }, SoftDelete) => self,
            (SoftDeleted { was_active: true }, Restore) => Active,
            (SoftDeleted { was_active: false }, Restore) => Inactive,
            (SoftDeleted { .. }, Purge) => Purged,
            (from, transition) => return Err(CoreError::InvalidTransition { from, transition }),
        };
        Ok(next)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleState::Active => "active",
            LifecycleState::Inactive => "inactive",
            LifecycleState::SoftDeleted { .. } => "deleted",
            LifecycleState::Purged => "purged",
        })
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transition::Activate => "activate",
            Transition::Deactivate => "deactivate",
            Transition::SoftDelete => "delete",
            Transition::Restore => "restore",
            Transition::Purge => "purge",
        })
    }
}

impl Transition {
    fn action(self) -> Action {
        match self {
            Transition::Activate | Transition::Deactivate => Action::SetActive,
            Transition::SoftDelete => Action::SoftDelete,
            Transition::Restore => Action::Restore,
            Transition::Purge => Action::Purge,
        }
    }
}

/// Result of a sign/unsign call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementOutcome {
    /// `false` when the call was a no-op (already signed / not signed).
    pub changed: bool,
    pub count: u64,
}

impl Platform {
    /// Look an initiative up as `actor` sees it. Soft-deleted initiatives
    /// exist only for admins.
    pub(crate) fn find_initiative(&self, actor: &ActorContext, id: Uuid) -> CoreResult<InitiativeRow> {
        match self.db.get_initiative(&id.to_string())? {
            Some(row) if !row.deleted || actor.is_admin() => Ok(row),
            _ => Err(CoreError::NotFound("initiative")),
        }
    }

    /// Lookup for read paths. On top of [`Self::find_initiative`], inactive
    /// initiatives exist only for their creator and admins.
    pub(crate) fn visible_initiative(&self, actor: &ActorContext, id: Uuid) -> CoreResult<InitiativeRow> {
        let row = self.find_initiative(actor, id)?;
        if !row.active && !actor.is_admin() && !actor.is(facts(&row).creator_id) {
            return Err(CoreError::NotFound("initiative"));
        }
        Ok(row)
    }

    pub fn set_active(&self, actor: &ActorContext, id: Uuid, active: bool) -> CoreResult<LifecycleState> {
        let transition = if active {
            Transition::Activate
        } else {
            Transition::Deactivate
        };
        self.transition(actor, id, transition)
    }

    pub fn soft_delete(&self, actor: &ActorContext, id: Uuid) -> CoreResult<LifecycleState> {
        self.transition(actor, id, Transition::SoftDelete)
    }

    pub fn restore(&self, actor: &ActorContext, id: Uuid) -> CoreResult<LifecycleState> {
        self.transition(actor, id, Transition::Restore)
    }

    /// Irreversibly remove a soft-deleted initiative and its engagements.
    pub fn purge(&self, actor: &ActorContext, id: Uuid) -> CoreResult<LifecycleState> {
        self.transition(actor, id, Transition::Purge)
    }

    fn transition(&self, actor: &ActorContext, id: Uuid, transition: Transition) -> CoreResult<LifecycleState> {
        let action = transition.action();
        authz::check_authenticated(actor, action)?;
        // Restore and purge only ever target rows that non-admins cannot see,
        // so the admin rule has to run before the lookup.
        if action.is_admin_only() {
            authorize(actor, action, &Target::None).into_result()?;
        }

        let row = self.find_initiative(actor, id)?;
        authorize(actor, action, &Target::Initiative(facts(&row))).into_result()?;

        let from = LifecycleState::from_flags(row.active, row.deleted);
        let to = from.apply(transition)?;
        if to == from {
            debug!("Initiative {} already {}, {} is a no-op", id, from, transition);
            return Ok(to);
        }

        let key = id.to_string();
        let found = match to {
            LifecycleState::Active | LifecycleState::Inactive if transition == Transition::Restore => {
                self.db.set_initiative_deleted(&key, false)?
            }
            LifecycleState::Active => self.db.set_initiative_active(&key, true)?,
            LifecycleState::Inactive => self.db.set_initiative_active(&key, false)?,
            LifecycleState::SoftDeleted { .. } => self.db.set_initiative_deleted(&key, true)?,
            LifecycleState::Purged => match self.db.purge_initiative(&key)? {
                Some(signatures) => {
                    info!(
                        "Initiative {} purged with {} {}s",
                        id, signatures, self.config.engagement_label
                    );
                    true
                }
                None => false,
            },
        };
        if !found {
            // Removed between the lookup and the write.
            return Err(CoreError::NotFound("initiative"));
        }

        info!(
            "Initiative {} moved {} -> {} by {:?}",
            id,
            from,
            to,
            actor.user_id()
        );
        Ok(to)
    }

    /// Admin-only: remove a user, everything they created and every
    /// engagement they made, as one transaction.
    pub fn delete_user(&self, actor: &ActorContext, user_id: Uuid) -> CoreResult<PurgeCounts> {
        authorize(actor, Action::DeleteUser, &Target::User(user_id)).into_result()?;

        let counts = self
            .db
            .delete_user_cascade(&user_id.to_string())?
            .ok_or(CoreError::NotFound("user"))?;

        info!(
            "User {} deleted by {:?}: {} initiatives, {} {}s removed",
            user_id,
            actor.user_id(),
            counts.initiatives,
            counts.signatures,
            self.config.engagement_label
        );
        Ok(counts)
    }

    // -- Engagements --

    /// Record the actor's signature (or vote). Signing twice is a no-op: the
    /// store's uniqueness constraint absorbs the duplicate and `changed` is
    /// `false`.
    pub fn sign(&self, actor: &ActorContext, id: Uuid) -> CoreResult<EngagementOutcome> {
        let action = Action::engage(self.config.engagement_label);
        let user_id = self.engagement_guard(actor, id, action)?;

        let changed = self.db.insert_signature(&user_id.to_string(), &id.to_string())?;
        if !changed {
            debug!("User {} already gave a {} to {}", user_id, self.config.engagement_label, id);
        }
        let count = self.db.count_signatures(&id.to_string())?;
        Ok(EngagementOutcome { changed, count })
    }

    /// Withdraw the actor's own signature. Withdrawing one that does not
    /// exist is a no-op.
    pub fn unsign(&self, actor: &ActorContext, id: Uuid) -> CoreResult<EngagementOutcome> {
        let action = Action::disengage(self.config.engagement_label);
        let user_id = self.engagement_guard(actor, id, action)?;

        let changed = self.db.delete_signature(&user_id.to_string(), &id.to_string())?;
        let count = self.db.count_signatures(&id.to_string())?;
        Ok(EngagementOutcome { changed, count })
    }

    /// Authorize an engagement action and return the acting user's id.
    /// Soft-deleted initiatives take no engagement from anyone.
    fn engagement_guard(&self, actor: &ActorContext, id: Uuid, action: Action) -> CoreResult<Uuid> {
        authz::check_authenticated(actor, action)?;
        let user_id = actor.user_id().ok_or(CoreError::NotAuthenticated)?;

        let row = self.find_initiative(actor, id)?;
        if row.deleted {
            return Err(CoreError::NotFound("initiative"));
        }
        authorize(actor, action, &Target::Initiative(facts(&row))).into_result()?;
        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::LifecycleState::*;

    #[test]
    fn flags_map_to_states() {
        assert_eq!(LifecycleState::from_flags(true, false), Active);
        assert_eq!(LifecycleState::from_flags(false, false), Inactive);
        assert_eq!(LifecycleState::from_flags(false, true), SoftDeleted { was_active: false });
    }

    #[test]
    fn toggling_active_is_idempotent() {
        assert_eq!(Active.apply(Transition::Deactivate).unwrap(), Inactive);
        assert_eq!(Inactive.apply(Transition::Deactivate).unwrap(), Inactive);
        assert_eq!(Inactive.apply(Transition::Activate).unwrap(), Active);
    }

    #[test]
    fn restore_brings_back_previous_active_flag() {
        let deleted = Inactive.apply(Transition::SoftDelete).unwrap();
        assert_eq!(deleted, SoftDeleted { was_active: false });
        assert_eq!(deleted.apply(Transition::Restore).unwrap(), Inactive);

        let deleted = Active.apply(Transition::SoftDelete).unwrap();
        assert_eq!(deleted.apply(Transition::Restore).unwrap(), Active);
    }

    #[test]
    fn purge_only_from_soft_deleted() {
        assert_eq!(
            SoftDeleted { was_active: true }.apply(Transition::Purge).unwrap(),
            Purged
        );
        assert!(matches!(
            Active.apply(Transition::Purge),
            Err(CoreError::InvalidTransition { from: Active, transition: Transition::Purge })
        ));
    }

    #[test]
    fn deleted_and_purged_states_reject_other_moves() {
        let deleted = SoftDeleted { was_active: true };
        assert!(deleted.apply(Transition::Activate).is_err());
        assert!(deleted.apply(Transition::Deactivate).is_err());
        assert_eq!(deleted.apply(Transition::SoftDelete).unwrap(), deleted);
        assert!(Active.apply(Transition::Restore).is_err());
        for t in [Transition::Activate, Transition::Restore, Transition::Purge] {
            assert!(Purged.apply(t).is_err());
        }
    }
}
