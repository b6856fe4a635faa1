//! Account credentials loaded from the environment.

use crate::error::CapsuleError;

pub const ACCOUNT_VAR: &str = "CAPSULE_ACCOUNT";
pub const API_KEY_VAR: &str = "CAPSULE_API_KEY";
pub const BASE_URL_VAR: &str = "CAPSULE_BASE_URL";

/// Which account to talk to and how to authenticate.
#[derive(Clone)]
pub struct CapsuleConfig {
    /// Account subdomain, e.g. `acme` for `acme.capsulecrm.com`.
    pub account: String,
    pub api_key: String,
    /// Overrides `https://{account}.capsulecrm.com/api`.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for CapsuleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapsuleConfig")
            .field("account", &self.account)
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CapsuleConfig {
    /// Reads `CAPSULE_ACCOUNT`, `CAPSULE_API_KEY` and optional `CAPSULE_BASE_URL`.
    pub fn from_env() -> Result<Self, CapsuleError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`CapsuleConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CapsuleError> {
        let required = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CapsuleError::Config(format!("{} is not set", name)))
        };
        Ok(Self {
            account: required(ACCOUNT_VAR)?,
            api_key: required(API_KEY_VAR)?,
            base_url: lookup(BASE_URL_VAR)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }
}
