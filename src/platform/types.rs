//! Records decoded from the CLI's JSON output

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::common::config::CredentialsConfig;
use crate::common::{Error, Result};

/// An app as listed by `apps`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct App {
    pub name: String,
    #[serde(default)]
    pub replicas: u32,
}

/// Replica counts reported by `status`
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct AppStatus {
    pub replicas_desired: u32,
    pub replicas_running: u32,
}

/// Config entries reported by `configs`
pub type Configs = BTreeMap<String, String>;

/// Database identifier, normalized to a string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseId(pub String);

impl DatabaseId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatabaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for DatabaseId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => DatabaseId(s),
            Raw::Number(n) => DatabaseId(n.to_string()),
        })
    }
}

/// Lifecycle state of a database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseState {
    Available,
    Deleted,
    /// Any transitional state (provisioning, scaling, deleting...)
    Other(String),
}

impl From<String> for DatabaseState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "AVAILABLE" => DatabaseState::Available,
            "DELETED" => DatabaseState::Deleted,
            _ => DatabaseState::Other(s),
        }
    }
}

impl<'de> Deserialize<'de> for DatabaseState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(DatabaseState::from)
    }
}

impl fmt::Display for DatabaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseState::Available => f.write_str("AVAILABLE"),
            DatabaseState::Deleted => f.write_str("DELETED"),
            DatabaseState::Other(s) => f.write_str(s),
        }
    }
}

/// A database as listed by `databases`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Database {
    pub id: DatabaseId,
    pub state: DatabaseState,
    #[serde(default)]
    pub size: Option<f64>,
}

/// First database in `AVAILABLE` state
pub fn find_available(databases: &[Database]) -> Option<&Database> {
    databases
        .iter()
        .find(|db| db.state == DatabaseState::Available)
}

pub fn find_by_id<'a>(databases: &'a [Database], id: &DatabaseId) -> Option<&'a Database> {
    databases.iter().find(|db| &db.id == id)
}

/// Answer to an interactive confirmation prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Yes,
    No,
}

impl Confirmation {
    /// Text fed to the prompt on stdin
    pub fn as_input(self) -> &'static str {
        match self {
            Confirmation::Yes => "y\n",
            Confirmation::No => "n\n",
        }
    }
}

/// Account credentials
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the configured environment variables
    pub fn from_env(config: &CredentialsConfig) -> Result<Self> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(config: &CredentialsConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = lookup(&config.email_var)
            .ok_or_else(|| Error::MissingCredential(config.email_var.clone()))?;
        let password = lookup(&config.password_var)
            .ok_or_else(|| Error::MissingCredential(config.password_var.clone()))?;
        Ok(Self { email, password })
    }
}
