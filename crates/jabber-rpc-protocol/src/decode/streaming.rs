//! Streaming, tolerant decoder for oversized replies.
//!
//! Events are read straight from the byte slice into one reused buffer and
//! folded into values on a stack, so no intermediate tree is built. Unknown
//! elements are skipped with their whole subtree, invalid UTF-8 is replaced
//! rather than rejected, and anything after the closing root tag is ignored.
//! Truncation and broken nesting are still errors.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::trace;

use super::{MAX_DEPTH, ScalarKind, local_name, parse_scalar};
use crate::error::{DecodeError, DecodeResult};
use crate::fault::{Fault, MethodResponse};
use crate::value::Value;

enum Frame {
    Root,
    Params(Vec<Value>),
    Param(Option<Value>),
    Fault(Option<Value>),
    Value { text: String, typed: Option<Value> },
    Scalar { kind: ScalarKind, text: String },
    Array(Vec<Value>),
    Data(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Member { name: Option<String>, value: Option<Value> },
    Name(String),
    Skip,
}

struct Open {
    tag: String,
    frame: Frame,
}

/// Decodes a `<methodResponse>`.
pub fn decode_response(raw: &[u8]) -> DecodeResult<MethodResponse> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let mut reader = Reader::from_reader(raw);
    reader.config_mut().expand_empty_elements = true;

    let mut stack: Vec<Open> = Vec::new();
    let mut response: Option<MethodResponse> = None;
    let mut closed = false;
    let mut skipped = 0usize;
    let mut buf = Vec::new();

    while !closed {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| DecodeError::xml(reader.buffer_position(), e))?;

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(DecodeError::TooDeep { limit: MAX_DEPTH });
                }
                let tag = local_name(e.name().as_ref()).into_owned();
                let frame = open_frame(stack.last().map(|o| &o.frame), &tag)?;
                if matches!(frame, Frame::Skip) {
                    skipped += 1;
                }
                stack.push(Open { tag, frame });
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| DecodeError::malformed("unbalanced closing tag"))?;
                closed = close_frame(&mut stack, open.frame, &mut response)?;
            }
            Event::Text(e) => {
                let lossy = String::from_utf8_lossy(&e);
                let text = quick_xml::escape::unescape(&lossy)
                    .map_err(|err| DecodeError::malformed(format!("bad entity: {}", err)))?;
                push_text(&mut stack, &text);
            }
            Event::CData(e) => push_text(&mut stack, &String::from_utf8_lossy(&e)),
            Event::Eof => {
                return Err(match stack.last() {
                    Some(open) => DecodeError::Truncated {
                        open: open.tag.clone(),
                    },
                    None => DecodeError::malformed("document has no root element"),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    if skipped > 0 {
        trace!(skipped, "Skipped unknown elements in response");
    }
    response
        .ok_or_else(|| DecodeError::malformed("methodResponse carries neither params nor fault"))
}

/// Picks the frame for a start tag given the enclosing frame.
fn open_frame(parent: Option<&Frame>, tag: &str) -> DecodeResult<Frame> {
    let frame = match (parent, tag) {
        (None, "methodResponse") => Frame::Root,
        (None, other) => {
            return Err(DecodeError::malformed(format!(
                "expected <methodResponse>, found <{}>",
                other
            )));
        }
        (Some(Frame::Root), "params") => Frame::Params(Vec::new()),
        (Some(Frame::Root), "fault") => Frame::Fault(None),
        (Some(Frame::Params(_)), "param") => Frame::Param(None),
        (
            Some(Frame::Param(_) | Frame::Fault(_) | Frame::Data(_) | Frame::Member { .. }),
            "value",
        ) => Frame::Value {
            text: String::new(),
            typed: None,
        },
        (Some(Frame::Value { .. }), "array") => Frame::Array(Vec::new()),
        (Some(Frame::Value { .. }), "struct") => Frame::Struct(BTreeMap::new()),
        (Some(Frame::Value { .. }), scalar) => match ScalarKind::from_tag(scalar) {
            Some(kind) => Frame::Scalar {
                kind,
                text: String::new(),
            },
            None => Frame::Skip,
        },
        (Some(Frame::Array(_)), "data") => Frame::Data(Vec::new()),
        (Some(Frame::Struct(_)), "member") => Frame::Member {
            name: None,
            value: None,
        },
        (Some(Frame::Member { .. }), "name") => Frame::Name(String::new()),
        _ => Frame::Skip,
    };
    Ok(frame)
}

/// Folds a finished frame into its parent. Returns true once the root closes.
fn close_frame(
    stack: &mut [Open],
    frame: Frame,
    response: &mut Option<MethodResponse>,
) -> DecodeResult<bool> {
    match frame {
        Frame::Root => return Ok(true),
        Frame::Params(params) => *response = Some(MethodResponse::Params(params)),
        Frame::Fault(value) => {
            let value = value.ok_or_else(|| DecodeError::malformed("fault without value"))?;
            *response = Some(MethodResponse::Fault(Fault::from_value(value)?));
        }
        Frame::Param(value) => {
            let value = value.ok_or_else(|| DecodeError::malformed("param without value"))?;
            if let Some(Frame::Params(params)) = parent(stack) {
                params.push(value);
            }
        }
        Frame::Value { text, typed } => {
            let value = typed.unwrap_or(Value::String(text));
            match parent(stack) {
                Some(Frame::Param(slot) | Frame::Fault(slot)) => *slot = Some(value),
                Some(Frame::Data(items)) => items.push(value),
                Some(Frame::Member { value: slot, .. }) => *slot = Some(value),
                _ => {}
            }
        }
        Frame::Scalar { kind, text } => set_typed(stack, parse_scalar(kind, text)?),
        Frame::Array(items) => set_typed(stack, Value::Array(items)),
        Frame::Data(items) => {
            if let Some(Frame::Array(array)) = parent(stack) {
                array.extend(items);
            }
        }
        Frame::Struct(members) => set_typed(stack, Value::Struct(members)),
        Frame::Member { name, value } => match (name, value) {
            (Some(name), Some(value)) => {
                if let Some(Frame::Struct(members)) = parent(stack) {
                    members.insert(name, value);
                }
            }
            _ => return Err(DecodeError::malformed("struct member needs a name and a value")),
        },
        Frame::Name(name) => {
            if let Some(Frame::Member { name: slot, .. }) = parent(stack) {
                *slot = Some(name);
            }
        }
        Frame::Skip => {}
    }
    Ok(false)
}

fn parent(stack: &mut [Open]) -> Option<&mut Frame> {
    stack.last_mut().map(|open| &mut open.frame)
}

fn set_typed(stack: &mut [Open], value: Value) {
    if let Some(Frame::Value { typed, .. }) = parent(stack) {
        *typed = Some(value);
    }
}

fn push_text(stack: &mut [Open], text: &str) {
    match parent(stack) {
        Some(Frame::Value { text: buf, .. })
        | Some(Frame::Scalar { text: buf, .. })
        | Some(Frame::Name(buf)) => buf.push_str(text),
        _ => {}
    }
}
