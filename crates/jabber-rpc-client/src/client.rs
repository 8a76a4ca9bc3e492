//! The client facade.

use std::collections::BTreeMap;
use std::time::Instant;

use bytes::Bytes;
use jabber_rpc_protocol::{
    AuthBlock, Value, decode_response, encode_call_params, wrap_args, wrap_params,
};
use tracing::{Span, debug};

use crate::classify::classify;
use crate::config::{ClientOptions, check_timeout, non_empty};
use crate::error::{ConfigError, RpcError, RpcFailure, RpcResult};
use crate::transport::Transport;

/// Client for the server's XML-RPC administration endpoint.
///
/// Command modules such as [`crate::commands::Users`] borrow a client and go
/// through [`RpcClient::send_struct`].
#[derive(Debug, Clone)]
pub struct RpcClient {
    server: String,
    host: String,
    credentials: Option<AuthBlock>,
    debug: bool,
    timeout: u64,
    user_agent: String,
}

impl RpcClient {
    /// Builds a client from options.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `server` or `host` is missing, if `server`
    /// is not a URL, if only one of `username` / `password` is set, or if the
    /// timeout is negative.
    pub fn new(options: ClientOptions) -> Result<Self, ConfigError> {
        let server = non_empty(options.server).ok_or(ConfigError::MissingField("server"))?;
        let host = non_empty(options.host).ok_or(ConfigError::MissingField("host"))?;
        url::Url::parse(&server)?;

        let credentials = match (non_empty(options.username), non_empty(options.password)) {
            (Some(user), Some(password)) => Some(AuthBlock::new(user, host.clone(), password)),
            (Some(_), None) => return Err(ConfigError::MissingPassword),
            (None, Some(_)) => return Err(ConfigError::MissingUsername),
            (None, None) => None,
        };

        let timeout = match options.timeout {
            Some(seconds) => check_timeout(seconds)?,
            None => ClientOptions::DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            server,
            host,
            credentials,
            debug: options.debug.unwrap_or(false),
            timeout,
            user_agent: options
                .user_agent
                .unwrap_or_else(|| ClientOptions::DEFAULT_USER_AGENT.to_string()),
        })
    }

    /// Sets the request timeout in seconds. Zero disables it.
    pub fn set_timeout(&mut self, seconds: i64) -> Result<&mut Self, ConfigError> {
        self.timeout = check_timeout(seconds)?;
        Ok(self)
    }

    /// Returns the request timeout in seconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Sets the User-Agent sent with every request.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) -> &mut Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the endpoint URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the virtual host commands operate on.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Returns true if calls carry an authentication block.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Runs `command` on the server and returns its result.
    ///
    /// With credentials configured the parameters are sent wrapped behind the
    /// authentication block. Any failure, from encoding to a server fault, is
    /// returned as an [`RpcError`] carrying `command` and `params`.
    pub async fn send_request(&self, command: &str, params: Vec<Value>) -> RpcResult<Value> {
        let wire = wrap_params(params.clone(), self.credentials.as_ref());
        self.call(command, params, wire).await
    }

    /// Runs `command` with keyed arguments.
    ///
    /// The arguments travel as a single struct, right after the authentication
    /// block when credentials are configured. This is the form the server's
    /// administration commands take.
    pub async fn send_struct(
        &self,
        command: &str,
        args: BTreeMap<String, Value>,
    ) -> RpcResult<Value> {
        let args = Value::Struct(args);
        let wire = wrap_args(args.clone(), self.credentials.as_ref());
        self.call(command, vec![args], wire).await
    }

    /// `params` are the caller's view of the call, `wire` what is encoded.
    #[tracing::instrument(skip(self, params, wire), fields(duration_ms))]
    async fn call(
        &self,
        command: &str,
        params: Vec<Value>,
        wire: Vec<Value>,
    ) -> RpcResult<Value> {
        let start = Instant::now();

        let result = match self.exchange(command, &params, &wire).await {
            Ok(raw) => classify(decode_response(&raw), command, &params),
            Err(cause) => Err(RpcError::new(command, params, cause)),
        };

        let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        Span::current().record("duration_ms", elapsed);
        result
    }

    /// Encodes and posts the call, returning the raw reply body.
    async fn exchange(
        &self,
        command: &str,
        params: &[Value],
        wire: &[Value],
    ) -> Result<Bytes, RpcFailure> {
        if command.is_empty() {
            return Err(RpcFailure::EmptyCommand);
        }

        if self.debug {
            debug!(
                command,
                params = %jabber_rpc_protocol::Value::Array(params.to_vec()).redacted(),
                "Sending command"
            );
        }

        let payload = encode_call_params(command, wire)?;
        let transport = Transport::new(self.timeout, &self.user_agent)?;
        let raw = transport.send(&self.server, payload).await?;

        if self.debug {
            debug!(
                command,
                len = raw.len(),
                response = %String::from_utf8_lossy(&raw),
                "Received response"
            );
        }

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ClientOptions {
        ClientOptions::new("http://localhost:4560/RPC2", "example.com")
    }

    #[test]
    fn defaults() {
        let client = RpcClient::new(options()).unwrap();
        assert_eq!(client.timeout(), 5);
        assert_eq!(client.user_agent(), "GameNet");
        assert!(!client.is_debug());
        assert!(!client.has_credentials());
        assert_eq!(client.host(), "example.com");
        assert_eq!(client.server(), "http://localhost:4560/RPC2");
    }

    #[test]
    fn missing_server_or_host() {
        let mut no_server = options();
        no_server.server = None;
        assert!(matches!(
            RpcClient::new(no_server),
            Err(ConfigError::MissingField("server"))
        ));

        let mut no_host = options();
        no_host.host = Some(String::new());
        assert!(matches!(
            RpcClient::new(no_host),
            Err(ConfigError::MissingField("host"))
        ));
    }

    #[test]
    fn invalid_server_url() {
        let result = RpcClient::new(ClientOptions::new("not a url", "example.com"));
        assert!(matches!(result, Err(ConfigError::InvalidServer(_))));
    }

    #[test]
    fn credentials_must_come_in_pairs() {
        for (user, pass) in [("admin", ""), ("", "secret")] {
            let result = RpcClient::new(options().with_credentials(user, pass));
            assert!(
                matches!(
                    result,
                    Err(ConfigError::MissingPassword | ConfigError::MissingUsername)
                ),
                "user={:?} pass={:?}",
                user,
                pass
            );
        }

        let mut only_user = options();
        only_user.username = Some("admin".into());
        assert!(matches!(
            RpcClient::new(only_user),
            Err(ConfigError::MissingPassword)
        ));

        let mut only_pass = options();
        only_pass.password = Some("secret".into());
        assert!(matches!(
            RpcClient::new(only_pass),
            Err(ConfigError::MissingUsername)
        ));
    }

    #[test]
    fn empty_credentials_mean_none() {
        let client = RpcClient::new(options().with_credentials("", "")).unwrap();
        assert!(!client.has_credentials());
    }

    #[test]
    fn credentials_are_bound_to_host() {
        let client = RpcClient::new(options().with_credentials("admin", "secret")).unwrap();
        let auth = client.credentials.as_ref().unwrap();
        assert_eq!(auth.server, "example.com");
        assert_eq!(auth.user, "admin");
    }

    #[test]
    fn negative_timeout_option() {
        assert!(matches!(
            RpcClient::new(options().with_timeout(-3)),
            Err(ConfigError::NegativeTimeout(-3))
        ));
    }

    #[test]
    fn timeout_accessors() {
        let mut client = RpcClient::new(options()).unwrap();

        assert!(matches!(
            client.set_timeout(-1),
            Err(ConfigError::NegativeTimeout(-1))
        ));
        assert_eq!(client.timeout(), 5);

        client.set_timeout(0).unwrap();
        assert_eq!(client.timeout(), 0);

        client.set_timeout(30).unwrap().set_user_agent("admin-tool");
        assert_eq!(client.timeout(), 30);
        assert_eq!(client.user_agent(), "admin-tool");
    }

    #[test]
    fn debug_option() {
        let client = RpcClient::new(options().with_debug(true)).unwrap();
        assert!(client.is_debug());
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let client = RpcClient::new(options()).unwrap();
        let err = client.send_request("", vec![]).await.unwrap_err();
        assert!(matches!(err.cause(), RpcFailure::EmptyCommand));
    }
}
