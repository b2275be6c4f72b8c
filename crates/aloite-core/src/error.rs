use thiserror::Error;

use crate::authz::Denial;
use crate::lifecycle::{LifecycleState, Transition};

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("you need to sign in first")]
    NotAuthenticated,

    #[error("only the initiative's creator or an administrator can do that")]
    NotOwner,

    #[error("administrator role required")]
    NotAdmin,

    #[error("administrators cannot delete their own account or change their own role")]
    SelfProtect,

    #[error("this initiative is not active")]
    InitiativeInactive,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("username {0:?} is already taken")]
    DuplicateUsername(String),

    #[error("image is {size} bytes, the limit is {limit}")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("cannot {transition} an initiative that is {from}")]
    InvalidTransition {
        from: LifecycleState,
        transition: Transition,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::NotAuthenticated => "not_authenticated",
            CoreError::NotOwner => "not_owner",
            CoreError::NotAdmin => "not_admin",
            CoreError::SelfProtect => "self_protect",
            CoreError::InitiativeInactive => "initiative_inactive",
            CoreError::NotFound(_) => "not_found",
            CoreError::Validation(_) => "validation",
            CoreError::DuplicateUsername(_) => "duplicate_username",
            CoreError::ImageTooLarge { .. } => "image_too_large",
            CoreError::InvalidCredentials => "invalid_credentials",
            CoreError::InvalidTransition { .. } => "invalid_transition",
            CoreError::Storage(_) => "storage",
        }
    }
}

impl From<Denial> for CoreError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::NotAuthenticated => CoreError::NotAuthenticated,
            Denial::NotOwner => CoreError::NotOwner,
            Denial::InitiativeInactive => CoreError::InitiativeInactive,
            Denial::NotAdmin => CoreError::NotAdmin,
            Denial::SelfProtect => CoreError::SelfProtect,
        }
    }
}
