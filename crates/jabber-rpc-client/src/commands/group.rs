//! Shared roster group commands.

use super::{Args, named_args, run};
use crate::client::RpcClient;
use crate::error::RpcResult;
use crate::reply;

/// Shared roster groups on the client's host.
pub struct Groups<'a> {
    client: &'a RpcClient,
}

impl<'a> Groups<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }

    /// Creates a group. `display` lists the groups whose members see this one.
    pub async fn create(
        &self,
        group: &str,
        name: &str,
        description: &str,
        display: &[&str],
    ) -> RpcResult<()> {
        // The server splits the display list on a literal backslash-n.
        let display = display.join("\\n");
        let args = named_args([
            ("group", group),
            ("host", self.client.host()),
            ("name", name),
            ("description", description),
            ("display", display.as_str()),
        ]);
        run(self.client, "srg_create", args, reply::expect_ok).await
    }

    pub async fn delete(&self, group: &str) -> RpcResult<()> {
        let args = named_args([("group", group), ("host", self.client.host())]);
        run(self.client, "srg_delete", args, reply::expect_ok).await
    }

    /// Adds a local user to a group.
    pub async fn add_member(&self, user: &str, group: &str) -> RpcResult<()> {
        let args = self.member_args(user, group);
        run(self.client, "srg_user_add", args, reply::expect_ok).await
    }

    pub async fn remove_member(&self, user: &str, group: &str) -> RpcResult<()> {
        let args = self.member_args(user, group);
        run(self.client, "srg_user_del", args, reply::expect_ok).await
    }

    /// Returns member JIDs of a group.
    pub async fn members(&self, group: &str) -> RpcResult<Vec<String>> {
        let args = named_args([("group", group), ("host", self.client.host())]);
        run(self.client, "srg_get_members", args, |value| {
            reply::string_list(value, "members", "member")
        })
        .await
    }

    /// Returns the ids of all groups on the host.
    pub async fn list(&self) -> RpcResult<Vec<String>> {
        let args = named_args([("host", self.client.host())]);
        run(self.client, "srg_list", args, |value| {
            reply::string_list(value, "groups", "id")
        })
        .await
    }

    fn member_args(&self, user: &str, group: &str) -> Args {
        let host = self.client.host();
        named_args([
            ("user", user),
            ("host", host),
            ("group", group),
            ("grouphost", host),
        ])
    }
}
