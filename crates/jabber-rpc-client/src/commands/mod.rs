//! Administration commands.
//!
//! Each group of commands is a small struct borrowing an [`RpcClient`]; all
//! of them go through [`RpcClient::send_struct`] with keyed arguments and
//! read the reply with the helpers in [`crate::reply`].
//!
//! ```ignore
//! use jabber_rpc_client::commands::Users;
//!
//! let users = Users::new(&client);
//! users.register("alice", "s3cret").await?;
//! assert!(users.check_account("alice").await?);
//! ```

use std::collections::BTreeMap;

use jabber_rpc_protocol::Value;

use crate::client::RpcClient;
use crate::error::{RpcError, RpcFailure, RpcResult};

mod group;
mod roster;
mod room;
mod user;

pub use group::Groups;
pub use roster::{RosterItem, Rosters, Subscription};
pub use room::{Affiliation, Rooms};
pub use user::Users;

/// Keyed arguments of an administration command.
type Args = BTreeMap<String, Value>;

fn named_args<'a, V: Into<Value>>(members: impl IntoIterator<Item = (&'a str, V)>) -> Args {
    members
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.into()))
        .collect()
}

/// Sends `command` with keyed arguments and interprets the reply.
async fn run<T>(
    client: &RpcClient,
    command: &str,
    args: Args,
    interpret: impl FnOnce(&Value) -> Result<T, RpcFailure>,
) -> RpcResult<T> {
    let value = client.send_struct(command, args.clone()).await?;
    interpret(&value).map_err(|cause| RpcError::new(command, vec![Value::Struct(args)], cause))
}

/// Splits `user@server`, defaulting the server to `host`.
fn split_jid<'a>(jid: &'a str, host: &'a str) -> (&'a str, &'a str) {
    jid.split_once('@').unwrap_or((jid, host))
}
