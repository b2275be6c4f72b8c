use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use aloite_types::models::EngagementLabel;

/// 100 KiB upload limit for initiative images
pub const MAX_IMAGE_BYTES: usize = 100 * 1024;

/// How a new initiative's `active` flag is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// Every new initiative starts active; the creator's choice is ignored.
    Always,
    /// The creator decides; omitted means active.
    CreatorChoice,
}

impl ActivationPolicy {
    pub fn initial_active(self, requested: Option<bool>) -> bool {
        match self {
            ActivationPolicy::Always => true,
            ActivationPolicy::CreatorChoice => requested.unwrap_or(true),
        }
    }
}

impl std::str::FromStr for ActivationPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ActivationPolicy::Always),
            "creator" => Ok(ActivationPolicy::CreatorChoice),
            other => bail!("unknown activation policy {other:?} (expected \"always\" or \"creator\")"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub activation: ActivationPolicy,
    pub engagement_label: EngagementLabel,
    pub max_image_bytes: usize,
    pub min_password_len: usize,
    /// Served for initiatives without an uploaded image; built-in PNG if unset.
    pub placeholder_image: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            activation: ActivationPolicy::CreatorChoice,
            engagement_label: EngagementLabel::Signature,
            max_image_bytes: MAX_IMAGE_BYTES,
            min_password_len: 3,
            placeholder_image: None,
        }
    }
}

impl CoreConfig {
    /// Read `ALOITE_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let activation = match std::env::var("ALOITE_ACTIVATION_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => defaults.activation,
        };
        let engagement_label = match std::env::var("ALOITE_ENGAGEMENT_LABEL") {
            Ok(v) => v.parse().map_err(anyhow::Error::msg)?,
            Err(_) => defaults.engagement_label,
        };
        let min_password_len = match std::env::var("ALOITE_MIN_PASSWORD_LEN") {
            Ok(v) => v
                .parse()
                .with_context(|| format!("ALOITE_MIN_PASSWORD_LEN={v:?} is not a number"))?,
            Err(_) => defaults.min_password_len,
        };
        let placeholder_image = std::env::var("ALOITE_PLACEHOLDER_IMAGE").ok().map(PathBuf::from);

        Ok(Self {
            activation,
            engagement_label,
            min_password_len,
            placeholder_image,
            ..defaults
        })
    }
}
