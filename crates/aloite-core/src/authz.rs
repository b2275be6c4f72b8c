//! Authorization engine.
//!
//! [`authorize`] is a pure decision over an actor, an action and what the
//! action targets. Rules are checked in a fixed order and the first one that
//! fires decides:
//!
//! 1. anonymous actor attempting a mutating action: `NotAuthenticated`
//! 2. initiative target, actor neither its creator nor an admin: `NotOwner`
//!    (read-only actions on live initiatives and engagement actions are exempt)
//! 3. engagement action on an inactive initiative: `InitiativeInactive`
//! 4. admin-only action without the admin role: `NotAdmin`
//! 5. admin acting on their own account or role: `SelfProtect`

use uuid::Uuid;

use aloite_types::models::EngagementLabel;

use crate::actor::ActorContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    List,
    Search,
    ViewEngagements,
    Create,
    Edit,
    SetActive,
    SoftDelete,
    Sign,
    Unsign,
    Vote,
    Unvote,
    Restore,
    Purge,
    AdminList,
    GrantAdmin,
    RevokeAdmin,
    DeleteUser,
}

impl Action {
    /// The "add engagement" action under the deployment's label.
    pub fn engage(label: EngagementLabel) -> Self {
        match label {
            EngagementLabel::Signature => Action::Sign,
            EngagementLabel::Vote => Action::Vote,
        }
    }

    pub fn disengage(label: EngagementLabel) -> Self {
        match label {
            EngagementLabel::Signature => Action::Unsign,
            EngagementLabel::Vote => Action::Unvote,
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Action::View | Action::List | Action::Search)
    }

    pub fn is_mutating(self) -> bool {
        !matches!(
            self,
            Action::View | Action::List | Action::Search | Action::ViewEngagements | Action::AdminList
        )
    }

    pub fn is_engagement(self) -> bool {
        matches!(self, Action::Sign | Action::Unsign | Action::Vote | Action::Unvote)
    }

    pub fn is_admin_only(self) -> bool {
        matches!(
            self,
            Action::Purge
                | Action::GrantAdmin
                | Action::RevokeAdmin
                | Action::DeleteUser
                | Action::Restore
                | Action::AdminList
        )
    }

    fn is_self_protected(self) -> bool {
        matches!(self, Action::GrantAdmin | Action::RevokeAdmin | Action::DeleteUser)
    }
}

/// The parts of an initiative that authorization looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiativeFacts {
    pub creator_id: Uuid,
    pub active: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    None,
    Initiative(InitiativeFacts),
    User(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAuthenticated,
    NotOwner,
    InitiativeInactive,
    NotAdmin,
    SelfProtect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

/// Rule 1 on its own. Callers apply it before looking the target up so an
/// anonymous caller learns nothing about which ids exist.
pub fn check_authenticated(actor: &ActorContext, action: Action) -> Result<(), Denial> {
    if action.is_mutating() && !actor.is_authenticated() {
        return Err(Denial::NotAuthenticated);
    }
    Ok(())
}

pub fn authorize(actor: &ActorContext, action: Action, target: &Target) -> Decision {
    if let Err(denial) = check_authenticated(actor, action) {
        return Decision::Deny(denial);
    }

    if let Target::Initiative(facts) = target {
        let privileged = actor.is_admin() || actor.is(facts.creator_id);
        let exempt = (action.is_read_only() && !facts.deleted) || action.is_engagement();
        if !privileged && !exempt {
            return Decision::Deny(Denial::NotOwner);
        }

        if action.is_engagement() && !facts.active {
            return Decision::Deny(Denial::InitiativeInactive);
        }
    }

    if action.is_admin_only() && !actor.is_admin() {
        return Decision::Deny(Denial::NotAdmin);
    }

    if let Target::User(user_id) = target {
        if action.is_self_protected() && actor.is(*user_id) {
            return Decision::Deny(Denial::SelfProtect);
        }
    }

    Decision::Allow
}
