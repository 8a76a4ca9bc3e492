//! Account and profile commands.

use super::{Args, named_args, run};
use crate::client::RpcClient;
use crate::error::RpcResult;
use crate::reply;
use crate::vcard::VCardField;

/// Account management on the client's host.
pub struct Users<'a> {
    client: &'a RpcClient,
}

impl<'a> Users<'a> {
    pub fn new(client: &'a RpcClient) -> Self {
        Self { client }
    }

    fn host(&self) -> &str {
        self.client.host()
    }

    /// Creates an account.
    pub async fn register(&self, user: &str, password: &str) -> RpcResult<()> {
        let args = named_args([
            ("user", user),
            ("host", self.host()),
            ("password", password),
        ]);
        run(self.client, "register", args, reply::expect_ok).await
    }

    /// Deletes an account.
    pub async fn unregister(&self, user: &str) -> RpcResult<()> {
        let args = named_args([("user", user), ("host", self.host())]);
        run(self.client, "unregister", args, reply::expect_ok).await
    }

    /// Returns true if the account exists.
    pub async fn check_account(&self, user: &str) -> RpcResult<bool> {
        let args = named_args([("user", user), ("host", self.host())]);
        run(self.client, "check_account", args, |value| {
            reply::res_code(value).map(|code| code == 0)
        })
        .await
    }

    pub async fn change_password(&self, user: &str, new_password: &str) -> RpcResult<()> {
        let args = named_args([
            ("user", user),
            ("host", self.host()),
            ("newpass", new_password),
        ]);
        run(self.client, "change_password", args, reply::expect_ok).await
    }

    pub async fn set_nickname(&self, user: &str, nickname: &str) -> RpcResult<()> {
        let args = named_args([
            ("user", user),
            ("host", self.host()),
            ("nickname", nickname),
        ]);
        run(self.client, "set_nickname", args, reply::expect_ok).await
    }

    /// Stores one vCard field.
    pub async fn set_vcard(&self, user: &str, field: VCardField, content: &str) -> RpcResult<()> {
        let (command, args) = self.vcard_args("set_vcard", user, field, Some(content));
        run(self.client, command, args, reply::expect_ok).await
    }

    /// Reads one vCard field.
    pub async fn get_vcard(&self, user: &str, field: VCardField) -> RpcResult<String> {
        let (command, args) = self.vcard_args("get_vcard", user, field, None);
        run(self.client, command, args, |value| {
            reply::string_member(value, "content")
        })
        .await
    }

    /// Picks the one- or two-part variant of a vCard command.
    fn vcard_args(
        &self,
        base: &'static str,
        user: &str,
        field: VCardField,
        content: Option<&str>,
    ) -> (&'static str, Args) {
        let (name, subname) = field.parts();
        let mut members = vec![("user", user), ("host", self.host()), ("name", name)];
        if let Some(subname) = subname {
            members.push(("subname", subname));
        }
        if let Some(content) = content {
            members.push(("content", content));
        }

        let command = match (base, subname.is_some()) {
            ("set_vcard", true) => "set_vcard2",
            ("get_vcard", true) => "get_vcard2",
            _ => base,
        };
        (command, named_args(members))
    }
}
