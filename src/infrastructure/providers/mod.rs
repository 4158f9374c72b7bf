pub mod gemini;
#[cfg(test)]
pub mod stub;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::ProviderName;
use crate::domain::models::ProviderRef;

pub struct ProviderManager {}

impl ProviderManager {
    pub fn get(name: ProviderName) -> Result<ProviderRef> {
        if name == ProviderName::Gemini {
            return Ok(Arc::new(gemini::Gemini::default()));
        }

        bail!(format!("No provider implemented for {name}"))
    }
}
