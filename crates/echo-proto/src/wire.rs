//! MessagePack framing used when a function runs as its own process.

use std::io::Read;

use crate::{FunctionRequest, FunctionResponse, ProtoError};

pub fn encode_request(request: &FunctionRequest) -> Result<Vec<u8>, ProtoError> {
    Ok(rmp_serde::to_vec_named(request)?)
}

pub fn decode_request<R: Read>(reader: R) -> Result<FunctionRequest, ProtoError> {
    Ok(rmp_serde::from_read(reader)?)
}

pub fn encode_response(response: &FunctionResponse) -> Result<Vec<u8>, ProtoError> {
    Ok(rmp_serde::to_vec_named(response)?)
}

pub fn decode_response<R: Read>(reader: R) -> Result<FunctionResponse, ProtoError> {
    Ok(rmp_serde::from_read(reader)?)
}
