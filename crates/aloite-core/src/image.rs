use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::error::{CoreError, CoreResult};

/// 1x1 transparent PNG.
const PLACEHOLDER_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub fn builtin_placeholder() -> Result<Vec<u8>> {
    Ok(BASE64.decode(PLACEHOLDER_PNG)?)
}

/// Reject empty and oversized uploads.
pub fn check_upload(bytes: &[u8], limit: usize) -> CoreResult<()> {
    if bytes.is_empty() {
        return Err(CoreError::validation("image is empty"));
    }
    if bytes.len() > limit {
        return Err(CoreError::ImageTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}
