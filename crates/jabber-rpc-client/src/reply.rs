//! Helpers for reading the reply shapes the server's commands return.
//!
//! Results arrive as structs such as `{res: 0}` or
//! `{members: [{member: "a@host"}, ...]}`. Some older servers send records as
//! arrays of one-member structs instead of a single struct; [`record`] accepts
//! both.

use std::collections::BTreeMap;

use jabber_rpc_protocol::Value;

use crate::error::RpcFailure;

fn unexpected(message: impl Into<String>) -> RpcFailure {
    RpcFailure::UnexpectedReply(message.into())
}

/// Returns member `key` of a struct reply.
pub fn member<'a>(value: &'a Value, key: &str) -> Result<&'a Value, RpcFailure> {
    value
        .get(key)
        .ok_or_else(|| unexpected(format!("missing '{}' in {}", key, value)))
}

/// Returns member `key` as a string.
pub fn string_member(value: &Value, key: &str) -> Result<String, RpcFailure> {
    match member(value, key)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(unexpected(format!(
            "'{}' should be a string, got {}",
            key,
            other.type_name()
        ))),
    }
}

/// Returns the integer result code of a `{res: code}` reply.
pub fn res_code(value: &Value) -> Result<i64, RpcFailure> {
    match member(value, "res")? {
        Value::Int(code) => Ok(*code),
        other => Err(unexpected(format!(
            "'res' should be an int, got {}",
            other.type_name()
        ))),
    }
}

/// Accepts `{res: 0}` and `{res: "message"}` as success.
pub fn expect_ok(value: &Value) -> Result<(), RpcFailure> {
    match member(value, "res")? {
        Value::Int(0) | Value::String(_) => Ok(()),
        Value::Int(code) => Err(unexpected(format!("command returned code {}", code))),
        other => Err(unexpected(format!(
            "'res' should be an int or string, got {}",
            other.type_name()
        ))),
    }
}

/// Merges a record into one map.
///
/// A struct is returned as is; an array of structs is folded member by member.
pub fn record(value: &Value) -> Result<BTreeMap<String, Value>, RpcFailure> {
    match value {
        Value::Struct(members) => Ok(members.clone()),
        Value::Array(items) => {
            let mut merged = BTreeMap::new();
            for item in items {
                let Value::Struct(members) = item else {
                    return Err(unexpected(format!(
                        "record parts should be structs, got {}",
                        item.type_name()
                    )));
                };
                merged.extend(members.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(merged)
        }
        other => Err(unexpected(format!(
            "record should be a struct, got {}",
            other.type_name()
        ))),
    }
}

/// Reads `{outer: [{inner: value}, ...]}` into a list of records.
pub fn list<'a>(value: &'a Value, outer: &str, inner: &str) -> Result<Vec<&'a Value>, RpcFailure> {
    let items = member(value, outer)?
        .as_array()
        .ok_or_else(|| unexpected(format!("'{}' should be an array", outer)))?;
    items.iter().map(|item| member(item, inner)).collect()
}

/// Reads `{outer: [{inner: "text"}, ...]}` into strings.
pub fn string_list(value: &Value, outer: &str, inner: &str) -> Result<Vec<String>, RpcFailure> {
    list(value, outer, inner)?
        .into_iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| unexpected(format!("'{}' should be a string", inner)))
        })
        .collect()
}
