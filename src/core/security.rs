use std::env;
use std::fmt;

use thiserror::Error;

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

#[derive(Debug, Error)]
#[error("GOOGLE_API_KEY is not set; add it to the environment or to .env")]
pub struct MissingCredentials;

/// API key for the hosted embedding/completion provider.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Result<Self, MissingCredentials> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(MissingCredentials);
        }
        Ok(Self { api_key })
    }

    pub fn from_env() -> Result<Self, MissingCredentials> {
        let value = env::var(API_KEY_ENV).map_err(|_| MissingCredentials)?;
        Self::new(value)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn redacted(&self) -> String {
        let prefix: String = self.api_key.chars().take(6).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.redacted())
            .finish()
    }
}
