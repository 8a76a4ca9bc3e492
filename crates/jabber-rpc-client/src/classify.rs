//! Fault classification.
//!
//! Parse failures, empty results and server faults all end up here and leave
//! as a single [`RpcError`]; only its cause tells them apart.

use jabber_rpc_protocol::{DecodeError, MethodResponse, Value};

use crate::error::{RpcError, RpcFailure};

/// Turns a decoded reply into the call's result.
///
/// `params` are the caller's parameters and are attached to the error.
pub fn classify(
    decoded: Result<MethodResponse, DecodeError>,
    command: &str,
    params: &[Value],
) -> Result<Value, RpcError> {
    let fail = |cause: RpcFailure| RpcError::new(command, params.to_vec(), cause);

    match decoded {
        Err(err) => Err(fail(RpcFailure::Decode(err))),
        Ok(MethodResponse::Fault(fault)) => Err(fail(RpcFailure::Fault(fault))),
        Ok(MethodResponse::Params(values)) => match values.into_iter().next() {
            Some(value) if !value.is_falsy() => Ok(value),
            _ => Err(fail(RpcFailure::EmptyResult)),
        },
    }
}
