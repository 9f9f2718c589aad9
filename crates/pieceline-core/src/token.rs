//! # Token Decoder
//!
//! Each hop of the distribution chain is served as a compact
//! `header.payload.signature` token. Only the payload is consumed: it is
//! base64url JSON and is returned as an [`IndirectionDocument`].
//!
//! ## Security Note
//!
//! Nothing here checks the signature or expiry. A successful decode is not
//! proof of authenticity; it only means the payload was well-formed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// A decoded hop document: string keys to arbitrary JSON values.
pub type IndirectionDocument = Map<String, Value>;

/// Key under which JSON-enveloped responses carry their token.
pub const ENVELOPE_KEY: &str = "response";

/// Return the bare token from a response body.
///
/// Hops are served either as the raw token text or as a JSON envelope
/// such as `{"response": "<token>"}`. A body whose trimmed text starts with
/// `{` is treated as an envelope and the string under `key` is returned.
pub fn extract_token(body: &str, key: &str) -> Result<String, DecodeError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::Empty);
    }
    if !trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let envelope: Value = serde_json::from_str(trimmed).map_err(DecodeError::Envelope)?;
    envelope
        .get(key)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DecodeError::MissingEnvelopeKey(key.to_string()))
}

/// Decode the payload segment of a compact token.
///
/// Padding on the payload segment is tolerated but not required.
pub fn decode(token: &str) -> Result<IndirectionDocument, DecodeError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(DecodeError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() < 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    let payload = segments[1].trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(payload)?;
    match serde_json::from_slice::<Value>(&bytes).map_err(DecodeError::Json)? {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
