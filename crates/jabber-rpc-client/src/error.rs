//! Client error types.
//!
//! [`ConfigError`] is raised while building or reconfiguring a client.
//! Every failure of an actual call is an [`RpcError`], whose [`RpcFailure`]
//! cause says which stage went wrong.

use std::fmt;
use std::time::Duration;

use jabber_rpc_protocol::{DecodeError, EncodeError, Fault, Value};
use thiserror::Error;

/// Result type for calls against the server.
pub type RpcResult<T> = Result<T, RpcError>;

/// Invalid or inconsistent client options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was not given.
    #[error("parameter '{0}' is not specified")]
    MissingField(&'static str),

    /// Username given without a password.
    #[error("password cannot be empty if username was defined")]
    MissingPassword,

    /// Password given without a username.
    #[error("username cannot be empty if password was defined")]
    MissingUsername,

    /// Timeouts are whole seconds, zero or more.
    #[error("timeout must be a non-negative number of seconds, got {0}")]
    NegativeTimeout(i64),

    /// The `server` option is not a URL.
    #[error("invalid server URL: {0}")]
    InvalidServer(#[from] url::ParseError),

    /// Options file could not be read.
    #[error("failed to read options from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Options file is not valid TOML for [`crate::ClientOptions`].
    #[error("failed to parse options: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failure of the HTTP exchange itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The whole exchange took longer than the configured timeout.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The server answered with a non-success status.
    #[error("server returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Connection, DNS, TLS or redirect failure.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The HTTP client could not be set up.
    #[error("failed to create HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Why a call failed.
#[derive(Debug, Error)]
pub enum RpcFailure {
    /// No command name was given.
    #[error("command name is empty")]
    EmptyCommand,

    /// The request could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The HTTP exchange failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The reply could not be decoded.
    #[error("invalid response: {0}")]
    Decode(#[from] DecodeError),

    /// The reply decoded to nothing usable.
    #[error("empty result")]
    EmptyResult,

    /// The server reported a fault.
    #[error("server {0}")]
    Fault(Fault),

    /// The reply decoded, but not to the shape the command expects.
    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// A failed call, with the command and parameters that caused it.
#[derive(Debug)]
pub struct RpcError {
    command: String,
    params: Vec<Value>,
    cause: RpcFailure,
}

impl RpcError {
    pub fn new(
        command: impl Into<String>,
        params: Vec<Value>,
        cause: impl Into<RpcFailure>,
    ) -> Self {
        Self {
            command: command.into(),
            params,
            cause: cause.into(),
        }
    }

    /// Returns the command name.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns the parameters as given by the caller, without the auth block.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Returns the failure cause.
    pub fn cause(&self) -> &RpcFailure {
        &self.cause
    }

    /// Returns the server fault, if that is what failed.
    pub fn fault(&self) -> Option<&Fault> {
        match &self.cause {
            RpcFailure::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns true if the server was never reached or did not answer.
    pub fn is_transport(&self) -> bool {
        matches!(self.cause, RpcFailure::Transport(_))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = Value::Array(self.params.clone()).redacted();
        write!(
            f,
            "command '{}' with parameters {} failed: {}",
            self.command, params, self.cause
        )
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_messages() {
        assert_eq!(
            ConfigError::MissingField("server").to_string(),
            "parameter 'server' is not specified"
        );
        assert!(ConfigError::NegativeTimeout(-1).to_string().contains("-1"));
    }

    #[test]
    fn rpc_error_display_redacts_passwords() {
        let err = RpcError::new(
            "change_password",
            vec![Value::structure([("user", "alice"), ("newpass", "hunter2")])],
            RpcFailure::EmptyResult,
        );

        let shown = err.to_string();
        assert!(shown.contains("'change_password'"));
        assert!(shown.contains("alice"));
        assert!(!shown.contains("hunter2"));
        assert!(shown.ends_with("empty result"));
    }

    #[test]
    fn rpc_error_exposes_cause() {
        let err = RpcError::new(
            "getUser",
            vec![],
            RpcFailure::Fault(Fault::new(-118, "no such user")),
        );

        assert_eq!(err.fault().map(|f| f.code), Some(-118));
        assert!(!err.is_transport());
        let source = err.source().unwrap();
        assert!(source.to_string().contains("no such user"));
    }

    #[test]
    fn transport_error_is_transport() {
        let err = RpcError::new(
            "getUser",
            vec![],
            TransportError::HttpStatus { status: 502 },
        );
        assert!(err.is_transport());
        assert!(err.to_string().contains("HTTP 502"));
    }
}
