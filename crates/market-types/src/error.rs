/// Errors raised while decoding marketplace data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Persisted offer text is not a valid offer sequence.
    MalformedStore(String),
    /// Offer sequence could not be serialized.
    Encode(String),
    /// Hex string could not be decoded.
    InvalidHex(String),
    /// Plutus data JSON does not follow the detailed schema.
    InvalidPlutusData(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedStore(msg) => write!(f, "malformed offer store: {msg}"),
            Self::Encode(msg) => write!(f, "cannot encode offers: {msg}"),
            Self::InvalidHex(msg) => write!(f, "invalid hex: {msg}"),
            Self::InvalidPlutusData(msg) => write!(f, "invalid plutus data: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}
