//! Method call and response envelopes, including the fault reply.

use std::fmt;

use crate::error::{DecodeError, DecodeResult};
use crate::value::Value;

/// A decoded `<methodCall>`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Value>,
}

/// A decoded `<methodResponse>`.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    /// `<params>`; servers send exactly one in practice.
    Params(Vec<Value>),
    /// `<fault>`.
    Fault(Fault),
}

impl MethodResponse {
    /// Builds a successful response carrying a single value.
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Params(vec![value.into()])
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// An in-band failure reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Reads the `faultCode` / `faultString` struct carried by a fault reply.
    pub fn from_value(value: Value) -> DecodeResult<Self> {
        let Value::Struct(mut members) = value else {
            return Err(DecodeError::malformed(format!(
                "fault must be a struct, got {}",
                value.type_name()
            )));
        };

        let code = match members.remove("faultCode") {
            Some(Value::Int(code)) => code,
            Some(other) => {
                return Err(DecodeError::malformed(format!(
                    "faultCode must be an int, got {}",
                    other.type_name()
                )));
            }
            None => return Err(DecodeError::malformed("fault without faultCode")),
        };

        let message = match members.remove("faultString") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        Ok(Self { code, message })
    }

    /// Converts back to the struct sent on the wire.
    pub fn to_value(&self) -> Value {
        Value::structure([
            ("faultCode", Value::Int(self.code)),
            ("faultString", Value::String(self.message.clone())),
        ])
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_from_struct() {
        let value = Value::structure([
            ("faultCode", Value::Int(-118)),
            ("faultString", Value::from("A problem")),
        ]);
        let fault = Fault::from_value(value).unwrap();
        assert_eq!(fault, Fault::new(-118, "A problem"));
        assert_eq!(fault.to_string(), "fault -118: A problem");
    }

    #[test]
    fn fault_without_code_is_malformed() {
        let value = Value::structure([("faultString", "oops")]);
        assert!(matches!(
            Fault::from_value(value),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn fault_must_be_struct() {
        assert!(Fault::from_value(Value::from("oops")).is_err());
    }

    #[test]
    fn fault_value_roundtrip() {
        let fault = Fault::new(3, "bad");
        assert_eq!(Fault::from_value(fault.to_value()).unwrap(), fault);
    }
}
