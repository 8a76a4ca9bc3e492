//! Client options.
//!
//! Options can be built in code or read from a TOML file using the same keys
//! as the option map accepted by [`ClientOptions`]:
//!
//! ```toml
//! server = "http://localhost:4560/RPC2"
//! host = "example.com"
//! username = "admin"
//! password = "secret"
//! timeout = 10
//! userAgent = "GameNet"
//! debug = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options for [`crate::RpcClient::new`].
///
/// Everything is optional here; validation happens when the client is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// XML-RPC endpoint URL.
    pub server: Option<String>,

    /// Virtual host (realm) the commands operate on.
    pub host: Option<String>,

    /// Administrator account.
    pub username: Option<String>,

    /// Administrator password.
    pub password: Option<String>,

    /// Log every command, its parameters and the raw reply.
    pub debug: Option<bool>,

    /// Request timeout in seconds. Zero disables the timeout.
    pub timeout: Option<i64>,

    /// Value of the User-Agent header.
    pub user_agent: Option<String>,
}

impl ClientOptions {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

    /// Default User-Agent.
    pub const DEFAULT_USER_AGENT: &'static str = "GameNet";

    /// Creates options for the given endpoint and host.
    pub fn new(server: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            server: Some(server.into()),
            host: Some(host.into()),
            ..Default::default()
        }
    }

    /// Builder: set administrator credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Builder: set timeout in seconds.
    pub fn with_timeout(mut self, seconds: i64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Builder: set the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builder: toggle debug output.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Parses options from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads options from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Treats empty strings the same as missing values.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Validates a timeout given in signed seconds.
pub(crate) fn check_timeout(seconds: i64) -> Result<u64, ConfigError> {
    u64::try_from(seconds).map_err(|_| ConfigError::NegativeTimeout(seconds))
}
