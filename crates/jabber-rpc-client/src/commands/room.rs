//! Multi-user chat room commands.

use std::fmt;

use super::{named_args, run};
use crate::client::RpcClient;
use crate::error::RpcResult;
use crate::reply;

/// A user's standing in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affiliation {
    Owner,
    Admin,
    Member,
    Outcast,
    None,
}

impl Affiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Outcast => "outcast",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Affiliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rooms of one MUC service.
pub struct Rooms<'a> {
    client: &'a RpcClient,
    service: String,
}

impl<'a> Rooms<'a> {
    /// Uses the `conference.<host>` service.
    pub fn new(client: &'a RpcClient) -> Self {
        let service = format!("conference.{}", client.host());
        Self::with_service(client, service)
    }

    pub fn with_service(client: &'a RpcClient, service: impl Into<String>) -> Self {
        Self {
            client,
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub async fn create(&self, name: &str) -> RpcResult<()> {
        let args = named_args([
            ("name", name),
            ("service", self.service.as_str()),
            ("host", self.client.host()),
        ]);
        run(self.client, "create_room", args, reply::expect_ok).await
    }

    pub async fn destroy(&self, name: &str) -> RpcResult<()> {
        let args = named_args([("name", name), ("service", self.service.as_str())]);
        run(self.client, "destroy_room", args, reply::expect_ok).await
    }

    /// Returns the JIDs of rooms currently open on the service.
    pub async fn online(&self) -> RpcResult<Vec<String>> {
        let args = named_args([("service", self.service.as_str())]);
        run(self.client, "muc_online_rooms", args, |value| {
            reply::string_list(value, "rooms", "room")
        })
        .await
    }

    pub async fn set_affiliation(
        &self,
        name: &str,
        jid: &str,
        affiliation: Affiliation,
    ) -> RpcResult<()> {
        let args = named_args([
            ("name", name),
            ("service", self.service.as_str()),
            ("jid", jid),
            ("affiliation", affiliation.as_str()),
        ]);
        run(self.client, "set_room_affiliation", args, reply::expect_ok).await
    }
}
