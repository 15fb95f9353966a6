//! Text encoding of the persisted offer sequence.

use crate::{CodecError, OfferRecord};

/// Serialize the full ordered sequence as a JSON array.
pub fn encode_offers(records: &[OfferRecord]) -> Result<String, CodecError> {
    serde_json::to_string(records).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Parse a persisted sequence. Empty text is an empty store, not an error.
pub fn decode_offers(text: &str) -> Result<Vec<OfferRecord>, CodecError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text).map_err(|e| CodecError::MalformedStore(e.to_string()))
}
