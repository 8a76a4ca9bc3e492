//! Roster commands.

use std::fmt;
use std::str::FromStr;

use jabber_rpc_protocol::Value;

use super::{named_args, run, split_jid};
use crate::client::RpcClient;
use crate::error::{RpcFailure, RpcResult};
use crate::reply;

/// Presence subscription state of a roster item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Both,
    To,
    From,
    None,
}

impl Subscription {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::To => "to",
            Self::From => "from",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subscription {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(Self::Both),
            "to" => Ok(Self::To),
            "from" => Ok(Self::From),
            "none" => Ok(Self::None),
            other => Err(format!("unknown subscription: {}", other)),
        }
    }
}

/// One contact in a user's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterItem {
    pub jid: String,
    pub nick: String,
    pub subscription: Subscription,
    /// Pending subscription request, if any.
    pub ask: Option<String>,
    pub group: String,
}

impl RosterItem {
    fn from_value(value: &Value) -> Result<Self, RpcFailure> {
        let record = Value::Struct(reply::record(value)?);
        let text = |key: &str| reply::string_member(&record, key);
        let optional = |key: &str| match record.get(key) {
            Some(Value::String(s)) if !s.is_empty() && s != "none" => Some(s.clone()),
            _ => None,
        };

        Ok(Self {
            jid: text("jid")?,
            nick: optional("nick").unwrap_or_default(),
            subscription: text("subscription")?
                .parse()
                .map_err(RpcFailure::UnexpectedReply)?,
            ask: optional("ask"),
            group: optional("group").unwrap_or_default(),
        })
    }
}

/// Rosters of users on the client's host.
pub struct Rosters<'a> {
    client: &'a RpcClient,
}

impl<'a> Rosters<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }

    /// Adds `jid` to the roster of local user `owner`.
    pub async fn add_item(
        &self,
        owner: &str,
        jid: &str,
        nick: &str,
        group: &str,
        subscription: Subscription,
    ) -> RpcResult<()> {
        let host = self.client.host();
        let (user, server) = split_jid(jid, host);
        let args = named_args([
            ("localuser", owner),
            ("localserver", host),
            ("user", user),
            ("server", server),
            ("nick", nick),
            ("group", group),
            ("subs", subscription.as_str()),
        ]);
        run(self.client, "add_rosteritem", args, reply::expect_ok).await
    }

    pub async fn delete_item(&self, owner: &str, jid: &str) -> RpcResult<()> {
        let host = self.client.host();
        let (user, server) = split_jid(jid, host);
        let args = named_args([
            ("localuser", owner),
            ("localserver", host),
            ("user", user),
            ("server", server),
        ]);
        run(self.client, "delete_rosteritem", args, reply::expect_ok).await
    }

    /// Returns the roster of local user `owner`.
    pub async fn items(&self, owner: &str) -> RpcResult<Vec<RosterItem>> {
        let args = named_args([("user", owner), ("host", self.client.host())]);
        run(self.client, "get_roster", args, |value| {
            reply::list(value, "contacts", "contact")?
                .into_iter()
                .map(RosterItem::from_value)
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_item_from_struct() {
        let value = Value::structure([
            ("jid", "bob@example.com"),
            ("nick", "Bob"),
            ("subscription", "both"),
            ("ask", "none"),
            ("group", "Friends"),
        ]);
        let item = RosterItem::from_value(&value).unwrap();
        assert_eq!(
            item,
            RosterItem {
                jid: "bob@example.com".into(),
                nick: "Bob".into(),
                subscription: Subscription::Both,
                ask: None,
                group: "Friends".into(),
            }
        );
    }

    #[test]
    fn roster_item_from_parts() {
        let value = Value::Array(vec![
            Value::structure([("jid", "carol@example.com")]),
            Value::structure([("subscription", "to")]),
            Value::structure([("ask", "subscribe")]),
        ]);
        let item = RosterItem::from_value(&value).unwrap();
        assert_eq!(item.subscription, Subscription::To);
        assert_eq!(item.ask.as_deref(), Some("subscribe"));
        assert!(item.nick.is_empty());
    }

    #[test]
    fn unknown_subscription_is_unexpected() {
        let value = Value::structure([("jid", "x@example.com"), ("subscription", "maybe")]);
        assert!(matches!(
            RosterItem::from_value(&value),
            Err(RpcFailure::UnexpectedReply(_))
        ));
    }
}
