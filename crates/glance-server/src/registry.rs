//! The operator's JSON config file as a key registry source.
//!
//! One file serves both sides of a single-machine deployment: the agent
//! reads its own identity (`ClientID`, `PrivateKey`) and the collector
//! reads the trusted client list (`Clients`) and the static token
//! (`Token`). Field names follow the file's established on-disk casing.
//!
//! ```json
//! {
//!   "Token": "0123456789abcdef0123456789abcdef",
//!   "BaseUrl": "http://localhost:9975",
//!   "Clients": [
//!     { "id": "C1", "name": "Workstation", "public_key": "base64…" }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use glance_auth::{AuthError, KeyRecord, RegistrySource};
use serde::{Deserialize, Serialize};

/// One trusted client in the `Clients` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEntry {
    pub id: String,
    pub name: String,
    /// Base64 Ed25519 public key.
    pub public_key: String,
}

/// The whole config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(rename = "Token", default)]
    pub token: String,
    #[serde(rename = "BaseUrl", default)]
    pub base_url: String,
    #[serde(rename = "ClientID", default, skip_serializing_if = "String::is_empty")]
    pub client_id: String,
    #[serde(rename = "PrivateKey", default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(rename = "Clients", default, skip_serializing_if = "Vec::is_empty")]
    pub clients: Vec<ClientEntry>,
}

impl ConfigFile {
    /// The static token, or `None` when the file leaves it empty.
    pub fn legacy_token(&self) -> Option<String> {
        (!self.token.is_empty()).then(|| self.token.clone())
    }

    /// The trusted clients as registry records. Entries without an id are
    /// skipped.
    pub fn records(&self) -> Vec<KeyRecord> {
        self.clients
            .iter()
            .filter(|entry| !entry.id.is_empty())
            .map(|entry| {
                KeyRecord::new(
                    entry.id.as_str(),
                    entry.name.as_str(),
                    entry.public_key.as_str(),
                )
            })
            .collect()
    }
}

/// Reads the registry from a JSON config file every time it is loaded, so
/// edits on disk are picked up by the next registry reload.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the file.
    ///
    /// A missing file reads as an empty config: no trusted clients and no
    /// static token. Creating the file is left to the operator's tooling.
    ///
    /// # Errors
    /// [`AuthError::Registry`] if the file exists but can't be read or
    /// isn't valid JSON.
    pub async fn read(&self) -> Result<ConfigFile, AuthError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "config file not found, using empty registry");
                return Ok(ConfigFile::default());
            }
            Err(e) => {
                return Err(AuthError::Registry(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            AuthError::Registry(format!("{}: {e}", self.path.display()))
        })
    }
}

impl RegistrySource for JsonFileSource {
    async fn load(&self) -> Result<Vec<KeyRecord>, AuthError> {
        Ok(self.read().await?.records())
    }
}
