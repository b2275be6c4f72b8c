//! Initiative lifecycle and authorization core.
//!
//! Every operation takes an explicit [`ActorContext`] and returns either a
//! value or a typed [`CoreError`]. Nothing here knows about HTTP; the request
//! layer resolves the actor, calls into [`Platform`] and maps the result.

pub mod actor;
pub mod authz;
pub mod config;
mod convert;
pub mod error;
pub mod identity;
pub mod image;
pub mod initiatives;
pub mod lifecycle;

use anyhow::{Context, Result};
use tracing::info;

use aloite_db::Database;

pub use actor::ActorContext;
pub use aloite_db::models::PurgeCounts;
pub use authz::{Action, Decision, Denial, InitiativeFacts, Target, authorize};
pub use config::{ActivationPolicy, CoreConfig};
pub use error::{CoreError, CoreResult};
pub use identity::Registration;
pub use initiatives::{InitiativeDraft, InitiativeEdit};
pub use lifecycle::{EngagementOutcome, LifecycleState, Transition};

pub struct Platform {
    db: Database,
    config: CoreConfig,
    placeholder: Vec<u8>,
}

impl Platform {
    pub fn new(db: Database, config: CoreConfig) -> Result<Self> {
        let placeholder = match &config.placeholder_image {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("reading placeholder image {}", path.display()))?,
            None => image::builtin_placeholder()?,
        };

        info!(
            "Core ready: activation policy {:?}, engagements labelled {:?}",
            config.activation, config.engagement_label
        );

        Ok(Self {
            db,
            config,
            placeholder,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Raw store access for health checks and maintenance. Bypasses
    /// authorization.
    pub fn database(&self) -> &Database {
        &self.db
    }
}
