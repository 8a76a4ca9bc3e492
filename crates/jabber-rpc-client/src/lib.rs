//! Client for the Jabber server's XML-RPC administration API.
//!
//! [`RpcClient`] sends one command per HTTP POST and returns the command's
//! result as a [`Value`]. With administrator credentials configured, every
//! call is authenticated against the client's virtual host.
//!
//! ```ignore
//! use jabber_rpc_client::{ClientOptions, RpcClient, Value};
//!
//! let client = RpcClient::new(
//!     ClientOptions::new("http://localhost:4560/RPC2", "example.com")
//!         .with_credentials("admin", "secret"),
//! )?;
//! let user = client.send_request("getUser", vec![Value::from("alice")]).await?;
//! ```
//!
//! Typed wrappers for common administration commands live in [`commands`].

mod classify;
mod client;
mod config;
mod error;
mod transport;
mod vcard;

pub mod commands;
pub mod reply;
pub mod tracing;

pub use classify::classify;
pub use client::RpcClient;
pub use config::ClientOptions;
pub use error::{ConfigError, RpcError, RpcFailure, RpcResult, TransportError};
pub use transport::{MAX_REDIRECTS, Transport};
pub use vcard::VCardField;

pub use jabber_rpc_protocol::{AuthBlock, DecodeError, EncodeError, Fault, MethodResponse, Value};
