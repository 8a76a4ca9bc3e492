//! Response decoding.
//!
//! Two decoders read the same format. [`standard`] parses the whole body into
//! an element tree before interpreting it; [`streaming`] walks the events once
//! and builds values on a stack, which keeps memory flat for very large
//! replies and skips elements it does not recognise. The choice is made on
//! body length alone.

use std::borrow::Cow;

use base64::Engine;
use chrono::NaiveDateTime;
use tracing::trace;

use crate::error::{DecodeError, DecodeResult};
use crate::fault::{MethodCall, MethodResponse};
use crate::value::{DATETIME_FORMAT, Value};

pub mod standard;
pub mod streaming;

/// Bodies of this many bytes or more go through the streaming decoder.
pub const RESPONSE_SIZE_THRESHOLD: usize = 10_000_000;

/// Deepest element nesting either decoder accepts.
///
/// Every `<value><array><data>` level costs three elements.
pub const MAX_DEPTH: usize = 512;

/// Which decoder handles a given body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    Standard,
    Streaming,
}

impl DecodeStrategy {
    pub fn for_len(len: usize) -> Self {
        if len < RESPONSE_SIZE_THRESHOLD {
            Self::Standard
        } else {
            Self::Streaming
        }
    }
}

/// Decodes a `<methodResponse>`, picking the decoder by body size.
pub fn decode_response(raw: &[u8]) -> DecodeResult<MethodResponse> {
    let strategy = DecodeStrategy::for_len(raw.len());
    trace!(len = raw.len(), ?strategy, "Decoding response");

    match strategy {
        DecodeStrategy::Standard => standard::decode_response(raw),
        DecodeStrategy::Streaming => streaming::decode_response(raw),
    }
}

/// Decodes a `<methodCall>`.
pub fn decode_call(raw: &[u8]) -> DecodeResult<MethodCall> {
    standard::decode_call(raw)
}

/// Scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Int,
    Boolean,
    String,
    Double,
    DateTime,
    Base64,
    Nil,
}

impl ScalarKind {
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" | "i4" | "i8" => Some(Self::Int),
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            "double" => Some(Self::Double),
            "dateTime.iso8601" => Some(Self::DateTime),
            "base64" => Some(Self::Base64),
            "nil" => Some(Self::Nil),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Double => "double",
            Self::DateTime => "dateTime.iso8601",
            Self::Base64 => "base64",
            Self::Nil => "nil",
        }
    }
}

/// Parses the text content of a scalar element.
pub(crate) fn parse_scalar(kind: ScalarKind, text: String) -> DecodeResult<Value> {
    let invalid = |text: &str| DecodeError::InvalidScalar {
        kind: kind.name(),
        text: text.to_string(),
    };

    match kind {
        ScalarKind::String => Ok(Value::String(text)),
        ScalarKind::Int => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(&text)),
        ScalarKind::Boolean => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(invalid(&text)),
        },
        ScalarKind::Double => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid(&text)),
        ScalarKind::DateTime => parse_datetime(text.trim())
            .map(Value::DateTime)
            .ok_or_else(|| invalid(&text)),
        ScalarKind::Base64 => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact.as_bytes())
                .map(Value::Base64)
                .map_err(|_| invalid(&text))
        }
        ScalarKind::Nil => {
            if text.trim().is_empty() {
                Ok(Value::Nil)
            } else {
                Err(invalid(&text))
            }
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y%m%dT%H%M%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Strips a namespace prefix, so `ex:nil` reads as `nil`.
pub(crate) fn local_name(name: &[u8]) -> Cow<'_, str> {
    let name = String::from_utf8_lossy(name);
    match name.rsplit_once(':') {
        Some((_, local)) => Cow::Owned(local.to_string()),
        None => name,
    }
}
