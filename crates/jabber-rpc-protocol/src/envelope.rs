//! Request and response envelope encoding.
//!
//! Envelopes are written with `quick-xml`, so string content is escaped
//! exactly once on the way out:
//!
//! ```text
//! <?xml version="1.0" encoding="utf-8"?>
//! <methodCall>
//!   <methodName>command</methodName>
//!   <params><param><value>...</value></param>...</params>
//! </methodCall>
//! ```

use std::io::Cursor;

use base64::Engine;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::EncodeError;
use crate::fault::MethodResponse;
use crate::value::{DATETIME_FORMAT, Value};

/// Administrator credentials prepended to every authenticated call.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthBlock {
    pub user: String,
    /// Realm the credentials are checked against.
    pub server: String,
    pub password: String,
}

impl AuthBlock {
    pub fn new(
        user: impl Into<String>,
        server: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
            password: password.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        Value::structure([
            ("user", self.user.as_str()),
            ("server", self.server.as_str()),
            ("password", self.password.as_str()),
        ])
    }
}

impl std::fmt::Debug for AuthBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthBlock")
            .field("user", &self.user)
            .field("server", &self.server)
            .field("password", &"***")
            .finish()
    }
}

/// Applies the authentication wrapping to a parameter list.
///
/// With credentials the result is `[auth, [params...]]`; without, the params
/// are returned untouched.
pub fn wrap_params(params: Vec<Value>, credentials: Option<&AuthBlock>) -> Vec<Value> {
    match credentials {
        Some(auth) => vec![auth.to_value(), Value::Array(params)],
        None => params,
    }
}

/// Applies the authentication wrapping to keyed arguments.
///
/// Admin commands take their arguments as one struct, sent as `[auth, args]`
/// with credentials and `[args]` without.
pub fn wrap_args(args: Value, credentials: Option<&AuthBlock>) -> Vec<Value> {
    match credentials {
        Some(auth) => vec![auth.to_value(), args],
        None => vec![args],
    }
}

/// Encodes a `<methodCall>` for `command`, wrapping `params` with
/// [`wrap_params`].
pub fn encode_call(
    command: &str,
    params: Vec<Value>,
    credentials: Option<&AuthBlock>,
) -> Result<Vec<u8>, EncodeError> {
    encode_call_params(command, &wrap_params(params, credentials))
}

/// Encodes a `<methodCall>` whose params are already in wire order.
pub fn encode_call_params(command: &str, params: &[Value]) -> Result<Vec<u8>, EncodeError> {
    if command.is_empty() {
        return Err(EncodeError::EmptyMethodName);
    }

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_decl(&mut writer)?;
    start(&mut writer, "methodCall")?;
    start(&mut writer, "methodName")?;
    text(&mut writer, command)?;
    end(&mut writer, "methodName")?;
    write_params(&mut writer, params)?;
    end(&mut writer, "methodCall")?;

    Ok(writer.into_inner().into_inner())
}

/// Encodes a `<methodResponse>`.
pub fn encode_response(response: &MethodResponse) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_decl(&mut writer)?;
    start(&mut writer, "methodResponse")?;
    match response {
        MethodResponse::Params(params) => write_params(&mut writer, params)?,
        MethodResponse::Fault(fault) => {
            start(&mut writer, "fault")?;
            write_value(&mut writer, &fault.to_value())?;
            end(&mut writer, "fault")?;
        }
    }
    end(&mut writer, "methodResponse")?;

    Ok(writer.into_inner().into_inner())
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_params(writer: &mut XmlWriter, params: &[Value]) -> Result<(), EncodeError> {
    start(writer, "params")?;
    for param in params {
        start(writer, "param")?;
        write_value(writer, param)?;
        end(writer, "param")?;
    }
    end(writer, "params")
}

fn write_value(writer: &mut XmlWriter, value: &Value) -> Result<(), EncodeError> {
    start(writer, "value")?;
    match value {
        Value::Int(i) => {
            let tag = if i32::try_from(*i).is_ok() { "int" } else { "i8" };
            scalar(writer, tag, &i.to_string())?;
        }
        Value::Bool(b) => scalar(writer, "boolean", if *b { "1" } else { "0" })?,
        Value::String(s) => scalar(writer, "string", s)?,
        Value::Double(d) => {
            if !d.is_finite() {
                return Err(EncodeError::NonFiniteDouble(*d));
            }
            scalar(writer, "double", &d.to_string())?;
        }
        Value::DateTime(dt) => scalar(
            writer,
            "dateTime.iso8601",
            &dt.format(DATETIME_FORMAT).to_string(),
        )?,
        Value::Base64(bytes) => scalar(
            writer,
            "base64",
            &base64::engine::general_purpose::STANDARD.encode(bytes),
        )?,
        Value::Nil => emit(writer, Event::Empty(BytesStart::new("nil")))?,
        Value::Array(items) => {
            start(writer, "array")?;
            start(writer, "data")?;
            for item in items {
                write_value(writer, item)?;
            }
            end(writer, "data")?;
            end(writer, "array")?;
        }
        Value::Struct(members) => {
            start(writer, "struct")?;
            for (name, member) in members {
                start(writer, "member")?;
                start(writer, "name")?;
                text(writer, name)?;
                end(writer, "name")?;
                write_value(writer, member)?;
                end(writer, "member")?;
            }
            end(writer, "struct")?;
        }
    }
    end(writer, "value")
}

fn scalar(writer: &mut XmlWriter, tag: &str, content: &str) -> Result<(), EncodeError> {
    start(writer, tag)?;
    text(writer, content)?;
    end(writer, tag)
}

fn write_decl(writer: &mut XmlWriter) -> Result<(), EncodeError> {
    emit(
        writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )
}

fn start(writer: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
    emit(writer, Event::Start(BytesStart::new(tag)))
}

fn end(writer: &mut XmlWriter, tag: &str) -> Result<(), EncodeError> {
    emit(writer, Event::End(BytesEnd::new(tag)))
}

fn text(writer: &mut XmlWriter, content: &str) -> Result<(), EncodeError> {
    if content.is_empty() {
        return Ok(());
    }
    emit(writer, Event::Text(BytesText::new(content)))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<(), EncodeError> {
    writer
        .write_event(event)
        .map_err(|e| EncodeError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Fault;

    fn body(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn authenticated_call_snapshot() {
        let auth = AuthBlock::new("admin", "example.com", "secret");
        let xml = body(encode_call("getUser", vec!["alice".into()], Some(&auth)).unwrap());

        insta::assert_snapshot!(xml, @r#"<?xml version="1.0" encoding="utf-8"?><methodCall><methodName>getUser</methodName><params><param><value><struct><member><name>password</name><value><string>secret</string></value></member><member><name>server</name><value><string>example.com</string></value></member><member><name>user</name><value><string>admin</string></value></member></struct></value></param><param><value><array><data><value><string>alice</string></value></data></array></value></param></params></methodCall>"#);
    }

    #[test]
    fn wrap_without_credentials_is_identity() {
        let params = vec![Value::from("alice"), Value::Int(3)];
        assert_eq!(wrap_params(params.clone(), None), params);
    }

    #[test]
    fn wrap_with_credentials_nests_params() {
        let auth = AuthBlock::new("admin", "example.com", "secret");
        let wrapped = wrap_params(vec!["alice".into()], Some(&auth));

        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0], auth.to_value());
        assert_eq!(wrapped[1], Value::Array(vec!["alice".into()]));
    }

    #[test]
    fn keyed_args_sit_beside_the_auth_block() {
        let auth = AuthBlock::new("admin", "example.com", "secret");
        let args = Value::structure([("user", "alice"), ("host", "example.com")]);

        assert_eq!(
            wrap_args(args.clone(), Some(&auth)),
            vec![auth.to_value(), args.clone()]
        );
        assert_eq!(wrap_args(args.clone(), None), vec![args]);
    }

    #[test]
    fn strings_are_escaped_once() {
        let xml = body(encode_call("echo", vec![r#"<a href="x">&amp;</a>"#.into()], None).unwrap());

        assert!(xml.contains("&lt;a href=&quot;x&quot;&gt;&amp;amp;&lt;/a&gt;"));
        assert!(!xml.contains("&amp;lt;"));
    }

    #[test]
    fn empty_method_name_is_rejected() {
        assert!(matches!(
            encode_call("", vec![], None),
            Err(EncodeError::EmptyMethodName)
        ));
    }

    #[test]
    fn non_finite_double_is_rejected() {
        assert!(matches!(
            encode_call("x", vec![Value::Double(f64::NAN)], None),
            Err(EncodeError::NonFiniteDouble(_))
        ));
    }

    #[test]
    fn wide_integers_use_i8() {
        let xml = body(encode_call("x", vec![Value::Int(1 << 40), Value::Int(7)], None).unwrap());
        assert!(xml.contains("<i8>1099511627776</i8>"));
        assert!(xml.contains("<int>7</int>"));
    }

    #[test]
    fn fault_response_encoding() {
        let xml = body(encode_response(&MethodResponse::Fault(Fault::new(4, "Too many"))).unwrap());
        assert!(xml.contains("<fault><value><struct>"));
        assert!(xml.contains("<name>faultCode</name><value><int>4</int></value>"));
    }

    #[test]
    fn auth_debug_hides_password() {
        let auth = AuthBlock::new("admin", "example.com", "secret");
        assert!(!format!("{:?}", auth).contains("secret"));
    }
}
