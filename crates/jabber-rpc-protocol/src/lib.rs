//! XML-RPC wire format for the Jabber administration API.
//!
//! This crate knows nothing about HTTP. It turns a command name and a list of
//! [`Value`]s into a request body, and a response body back into a
//! [`MethodResponse`].
//!
//! # Request
//!
//! With administrator credentials the parameter list is wrapped as
//! `[ {user, server, password}, [params...] ]`:
//!
//! ```rust
//! use jabber_rpc_protocol::{AuthBlock, Value, decode_call, encode_call};
//!
//! let auth = AuthBlock::new("admin", "example.com", "secret");
//! let body = encode_call("getUser", vec![Value::from("alice")], Some(&auth)).unwrap();
//!
//! let call = decode_call(&body).unwrap();
//! assert_eq!(call.params[0], auth.to_value());
//! assert_eq!(call.params[1], Value::Array(vec![Value::from("alice")]));
//! ```
//!
//! # Response
//!
//! Bodies shorter than [`RESPONSE_SIZE_THRESHOLD`] bytes are decoded in
//! memory; larger ones go through the streaming decoder. Both yield the same
//! [`MethodResponse`] for the same content.

mod envelope;
mod error;
mod fault;
mod value;

pub mod decode;

pub use decode::{
    DecodeStrategy, MAX_DEPTH, RESPONSE_SIZE_THRESHOLD, decode_call, decode_response,
};
pub use envelope::{
    AuthBlock, encode_call, encode_call_params, encode_response, wrap_args, wrap_params,
};
pub use error::{DecodeError, DecodeResult, EncodeError};
pub use fault::{Fault, MethodCall, MethodResponse};
pub use value::{DATETIME_FORMAT, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_characters_survive_an_echo() {
        let original = vec![
            Value::from("<tag>"),
            Value::from("fish & chips"),
            Value::from(r#"say "hi""#),
            Value::structure([("note", "a < b && c > d")]),
        ];

        let request = encode_call("echo", original.clone(), None).unwrap();
        let call = decode_call(&request).unwrap();
        let reply = encode_response(&MethodResponse::Params(call.params)).unwrap();

        assert_eq!(
            decode_response(&reply).unwrap(),
            MethodResponse::Params(original)
        );
    }
}
