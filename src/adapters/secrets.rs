//! Credential snapshot taken once at startup.
//!
//! Every API key the service needs is read from the process environment
//! (after an optional `.env` file has been loaded) when the service boots.
//! Providers and tool adapters receive their key from here and never touch
//! the environment again.

use std::collections::BTreeMap;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// A required credential was not present at startup
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Secret {0} is not set")]
pub struct MissingSecret(pub String);

/// Immutable set of named credentials
#[derive(Default)]
pub struct Secrets {
    values: BTreeMap<String, SecretString>,
}

impl Secrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the named environment variables once; unset or empty ones are skipped
    pub fn from_env<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut secrets = Self::new();
        for name in names {
            let name = name.as_ref();
            match std::env::var(name) {
                Ok(value) if !value.trim().is_empty() => secrets.insert(name, value),
                _ => tracing::debug!(secret = name, "credential not set"),
            }
        }
        secrets
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), SecretString::from(value.into()));
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.values.get(key)
    }

    /// Owned copy of a credential for a long-lived client
    pub fn require(&self, key: &str) -> Result<SecretString, MissingSecret> {
        self.get(key)
            .map(|secret| SecretString::from(secret.expose_secret().to_owned()))
            .ok_or_else(|| MissingSecret(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Names of the loaded credentials (never the values)
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets").field("keys", &self.keys()).finish()
    }
}

/// Thread-safe shared secrets
pub type SharedSecrets = Arc<Secrets>;
