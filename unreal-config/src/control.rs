//! Control channel parameters: listener, static assets and optional TLS.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Paths served by the control channel itself; assets cannot shadow them.
pub const RESERVED_ROUTES: [&str; 2] = ["/state", "/metrics"];

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct ControlConfig {
    /// Start the HTTP control channel at all.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Title of the HTML page returned for unknown paths.
    #[serde(default = "default_title")]
    #[validate(length(min = 1, max = 256))]
    pub title: String,

    #[serde(default)]
    #[validate(custom(function = validation::validate_assets))]
    pub assets: Vec<AssetRoute>,

    /// How long `stop` waits for in-flight connections.
    #[serde(default = "default_grace")]
    #[validate(range(max = 60_000))]
    pub shutdown_grace_ms: u64,

    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1, max = 65_536))]
    pub queue_capacity: usize,

    #[serde(default)]
    #[validate(nested)]
    pub tls: Option<TlsConfig>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_title() -> String {
    "HTTPServer".into()
}

fn default_grace() -> u64 {
    500
}

fn default_queue_capacity() -> usize {
    256
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: default_bind(),
            title: default_title(),
            assets: Vec::new(),
            shutdown_grace_ms: default_grace(),
            queue_capacity: default_queue_capacity(),
            tls: None,
        }
    }
}

/// A static file served under a fixed URL path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AssetRoute {
    /// URL path without the leading `/`; `None` serves the file under its own name.
    #[serde(default)]
    pub path: Option<String>,
    pub file: PathBuf,
}

impl AssetRoute {
    /// The absolute URL path this asset answers on.
    pub fn route_path(&self) -> String {
        let raw = match &self.path {
            Some(path) => path.clone(),
            None => self.file.to_string_lossy().into_owned(),
        };
        if raw.starts_with('/') {
            raw
        } else {
            format!("/{raw}")
        }
    }
}

impl FromStr for AssetRoute {
    type Err = String;

    /// Parses `[path=]file`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, file) = match s.split_once('=') {
            Some((path, file)) => (Some(path.to_string()), file),
            None => (None, s),
        };
        if file.is_empty() {
            return Err(format!("asset '{s}' names no file"));
        }
        Ok(Self {
            path,
            file: PathBuf::from(file),
        })
    }
}

impl fmt::Display for AssetRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.route_path(), self.file.display())
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
#[validate(schema(function = validation::validate_tls))]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert: PathBuf,
    /// PEM private key.
    pub key: PathBuf,
    /// PEM bundle of CAs; when set, clients must present a certificate signed by one of them.
    #[serde(default)]
    pub client_ca: Option<PathBuf>,
    /// Decrypts an encrypted PKCS#8 `key`; ignored for plain keys.
    #[serde(default)]
    pub key_passphrase: Option<String>,
}
