use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

/// Codec used to encode/decode payload bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    Json,
}

/// Opaque bytes with an associated codec, the boundary type every command
/// attribute and history event attribute carries instead of a typed value —
/// argument/result marshalling happens in the registered workflow/activity
/// closure via a [`Converter`], never inside the executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub codec: Codec,
}

impl Payload {
    pub fn new(bytes: Vec<u8>, codec: Codec) -> Self {
        Self { bytes, codec }
    }
}

/// Pluggable encode/decode at the workflow/activity boundary.
///
/// The default converter is reversible JSON of the argument tuple and
/// single-result value.
pub trait Converter {
    fn to_payload<T: Serialize>(&self, value: &T) -> Result<Payload, DomainError>;
    fn from_payload<T: DeserializeOwned>(&self, payload: &Payload) -> Result<T, DomainError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonConverter;

impl Converter for JsonConverter {
    fn to_payload<T: Serialize>(&self, value: &T) -> Result<Payload, DomainError> {
        let bytes = serde_json::to_vec(value).map_err(|e| DomainError::ConversionFailed(e.to_string()))?;
        Ok(Payload::new(bytes, Codec::Json))
    }

    fn from_payload<T: DeserializeOwned>(&self, payload: &Payload) -> Result<T, DomainError> {
        serde_json::from_slice(&payload.bytes).map_err(|e| DomainError::ConversionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_converter_round_trips() {
        let conv = JsonConverter;
        let payload = conv.to_payload(&(35i64, 12i64)).unwrap();
        let (a, b): (i64, i64) = conv.from_payload(&payload).unwrap();
        assert_eq!((a, b), (35, 12));
    }

    #[test]
    fn from_payload_reports_conversion_error_on_bad_bytes() {
        let conv = JsonConverter;
        let payload = Payload::new(b"not json".to_vec(), Codec::Json);
        let err = conv.from_payload::<i64>(&payload).unwrap_err();
        assert!(matches!(err, DomainError::ConversionFailed(_)));
    }
}
