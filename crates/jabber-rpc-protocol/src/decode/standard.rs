//! In-memory decoder.
//!
//! The body must be valid UTF-8. It is first parsed into a small element tree,
//! which is then interpreted strictly: unknown elements and stray text are
//! errors.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use super::{MAX_DEPTH, ScalarKind, local_name, parse_scalar};
use crate::error::{DecodeError, DecodeResult};
use crate::fault::{Fault, MethodCall, MethodResponse};
use crate::value::Value;

#[derive(Debug)]
struct Element {
    name: String,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    /// Concatenated text content. Fails if the element has child elements.
    fn into_text(self) -> DecodeResult<String> {
        let mut text = String::new();
        for child in self.children {
            match child {
                Node::Text(t) => text.push_str(&t),
                Node::Element(e) => {
                    return Err(DecodeError::malformed(format!(
                        "unexpected <{}> inside <{}>",
                        e.name, self.name
                    )));
                }
            }
        }
        Ok(text)
    }

    /// Child elements. Fails on non-whitespace text between them.
    fn into_elements(self) -> DecodeResult<Vec<Element>> {
        let mut elements = Vec::with_capacity(self.children.len());
        for child in self.children {
            match child {
                Node::Element(e) => elements.push(e),
                Node::Text(t) if t.trim().is_empty() => {}
                Node::Text(t) => {
                    return Err(DecodeError::malformed(format!(
                        "unexpected text {:?} inside <{}>",
                        t.trim(),
                        self.name
                    )));
                }
            }
        }
        Ok(elements)
    }

    fn has_elements(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Element(_)))
    }

    fn named(self, name: &str) -> DecodeResult<Self> {
        if self.name == name {
            Ok(self)
        } else {
            Err(DecodeError::malformed(format!(
                "expected <{}>, found <{}>",
                name, self.name
            )))
        }
    }

    fn into_only_child_any(self) -> DecodeResult<Self> {
        let parent = self.name.clone();
        let mut elements = self.into_elements()?;
        match elements.len() {
            1 => Ok(elements.remove(0)),
            0 => Err(DecodeError::malformed(format!("<{}> is empty", parent))),
            n => Err(DecodeError::malformed(format!(
                "<{}> has {} children, expected one",
                parent, n
            ))),
        }
    }

    /// The single child element, which must be named `name`.
    fn into_only_child(self, name: &str) -> DecodeResult<Self> {
        let parent = self.name.clone();
        let mut elements = self.into_elements()?;
        if elements.len() != 1 {
            return Err(DecodeError::malformed(format!(
                "<{}> must contain exactly one <{}>",
                parent, name
            )));
        }
        elements.remove(0).named(name)
    }
}

/// Decodes a `<methodResponse>`.
pub fn decode_response(raw: &[u8]) -> DecodeResult<MethodResponse> {
    let root = parse_tree(raw)?.named("methodResponse")?;
    let body = root.into_only_child_any()?;

    match body.name.as_str() {
        "params" => params_from(body).map(MethodResponse::Params),
        "fault" => {
            let value = value_from(body.into_only_child("value")?)?;
            Fault::from_value(value).map(MethodResponse::Fault)
        }
        other => Err(DecodeError::malformed(format!(
            "unexpected <{}> in methodResponse",
            other
        ))),
    }
}

/// Decodes a `<methodCall>`.
pub fn decode_call(raw: &[u8]) -> DecodeResult<MethodCall> {
    let root = parse_tree(raw)?.named("methodCall")?;

    let mut method_name = None;
    let mut params = Vec::new();
    for child in root.into_elements()? {
        match child.name.as_str() {
            "methodName" => method_name = Some(child.into_text()?.trim().to_string()),
            "params" => params = params_from(child)?,
            other => {
                return Err(DecodeError::malformed(format!(
                    "unexpected <{}> in methodCall",
                    other
                )));
            }
        }
    }

    match method_name {
        Some(method_name) if !method_name.is_empty() => Ok(MethodCall {
            method_name,
            params,
        }),
        _ => Err(DecodeError::malformed("methodCall without methodName")),
    }
}

fn params_from(params: Element) -> DecodeResult<Vec<Value>> {
    params
        .into_elements()?
        .into_iter()
        .map(|param| value_from(param.named("param")?.into_only_child("value")?))
        .collect()
}

fn value_from(value: Element) -> DecodeResult<Value> {
    if !value.has_elements() {
        // Untyped values are strings, whitespace included.
        return value.into_text().map(Value::String);
    }

    let typed = value.into_only_child_any()?;
    match typed.name.as_str() {
        "array" => array_from(typed),
        "struct" => struct_from(typed),
        tag => match ScalarKind::from_tag(tag) {
            Some(kind) => parse_scalar(kind, typed.into_text()?),
            None => Err(DecodeError::malformed(format!("unknown value type <{}>", tag))),
        },
    }
}

fn array_from(array: Element) -> DecodeResult<Value> {
    array
        .into_only_child("data")?
        .into_elements()?
        .into_iter()
        .map(|item| value_from(item.named("value")?))
        .collect::<DecodeResult<Vec<_>>>()
        .map(Value::Array)
}

fn struct_from(structure: Element) -> DecodeResult<Value> {
    let mut members = BTreeMap::new();
    for member in structure.into_elements()? {
        let mut name = None;
        let mut value = None;
        for part in member.named("member")?.into_elements()? {
            match part.name.as_str() {
                "name" => name = Some(part.into_text()?),
                "value" => value = Some(value_from(part)?),
                other => {
                    return Err(DecodeError::malformed(format!(
                        "unexpected <{}> in struct member",
                        other
                    )));
                }
            }
        }
        match (name, value) {
            (Some(name), Some(value)) => {
                members.insert(name, value);
            }
            _ => return Err(DecodeError::malformed("struct member needs a name and a value")),
        }
    }
    Ok(Value::Struct(members))
}

fn parse_tree(raw: &[u8]) -> DecodeResult<Element> {
    let xml = std::str::from_utf8(raw)?;
    if xml.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::xml(reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(DecodeError::malformed("content after the root element"));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(DecodeError::TooDeep { limit: MAX_DEPTH });
                }
                stack.push(Element {
                    name: local_name(e.name().as_ref()).into_owned(),
                    children: Vec::new(),
                });
            }
            Event::End(_) => {
                let done = stack
                    .pop()
                    .ok_or_else(|| DecodeError::malformed("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(done)),
                    None => root = Some(done),
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| DecodeError::xml(reader.buffer_position(), err))?;
                push_text(&mut stack, text.into_owned())?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::Truncated {
            open: open.name.clone(),
        });
    }
    root.ok_or_else(|| DecodeError::malformed("document has no root element"))
}

fn push_text(stack: &mut [Element], text: String) -> DecodeResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Text(text));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(DecodeError::malformed("text outside the root element")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_REPLY: &str = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <struct>
          <member><name>username</name><value><string>alice</string></value></member>
          <member><name>online</name><value><boolean>1</boolean></value></member>
          <member><name>resources</name><value><array><data>
            <value>web</value>
            <value><i4>3</i4></value>
          </data></array></value></member>
          <member><name>status</name><value/></member>
        </struct>
      </value>
    </param>
  </params>
</methodResponse>"#;

    #[test]
    fn decodes_nested_struct() {
        let MethodResponse::Params(params) = decode_response(USER_REPLY.as_bytes()).unwrap() else {
            panic!("expected params");
        };
        let user = &params[0];
        assert_eq!(user.get("username"), Some(&Value::from("alice")));
        assert_eq!(user.get("online"), Some(&Value::Bool(true)));
        assert_eq!(
            user.get("resources"),
            Some(&Value::Array(vec![Value::from("web"), Value::Int(3)]))
        );
        assert_eq!(user.get("status"), Some(&Value::from("")));
    }

    #[test]
    fn decodes_fault() {
        let xml = r#"<methodResponse><fault><value><struct>
            <member><name>faultCode</name><value><int>-118</int></value></member>
            <member><name>faultString</name><value><string>A problem</string></value></member>
        </struct></value></fault></methodResponse>"#;
        assert_eq!(
            decode_response(xml.as_bytes()).unwrap(),
            MethodResponse::Fault(Fault::new(-118, "A problem"))
        );
    }

    #[test]
    fn unescapes_entities_once() {
        let xml = "<methodResponse><params><param><value><string>&lt;b&gt; &amp;amp; &quot;q&quot;</string></value></param></params></methodResponse>";
        let MethodResponse::Params(params) = decode_response(xml.as_bytes()).unwrap() else {
            panic!("expected params");
        };
        assert_eq!(params[0], Value::from("<b> &amp; \"q\""));
    }

    #[test]
    fn empty_body() {
        assert!(matches!(decode_response(b""), Err(DecodeError::Empty)));
        assert!(matches!(decode_response(b"  \n"), Err(DecodeError::Empty)));
    }

    #[test]
    fn truncated_body() {
        let cut = &USER_REPLY.as_bytes()[..USER_REPLY.len() / 2];
        assert!(decode_response(cut).is_err());
    }

    #[test]
    fn unknown_type_is_malformed() {
        let xml = "<methodResponse><params><param><value><blob>x</blob></value></param></params></methodResponse>";
        assert!(matches!(
            decode_response(xml.as_bytes()),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn wrong_root_is_malformed() {
        assert!(matches!(
            decode_response(b"<html><body>502</body></html>"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut raw = b"<methodResponse><params><param><value>".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(b"</value></param></params></methodResponse>");
        assert!(matches!(
            decode_response(&raw),
            Err(DecodeError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn decodes_call() {
        let xml = "<methodCall><methodName>getUser</methodName><params><param><value><string>alice</string></value></param></params></methodCall>";
        let call = decode_call(xml.as_bytes()).unwrap();
        assert_eq!(call.method_name, "getUser");
        assert_eq!(call.params, vec![Value::from("alice")]);
    }

    #[test]
    fn call_without_name_is_malformed() {
        assert!(decode_call(b"<methodCall><params/></methodCall>").is_err());
    }
}
