//! Plutus data in the detailed JSON schema, plus the marketplace contract's
//! datum and redeemer shapes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::{CodecError, bytes_to_hex, hex_to_bytes};

/// Structured value in the chain's datum model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    Constr { constructor: u64, fields: Vec<PlutusData> },
    Map(Vec<(PlutusData, PlutusData)>),
    List(Vec<PlutusData>),
    Int(i64),
    Bytes(Vec<u8>),
}

impl PlutusData {
    pub fn constr(constructor: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr {
            constructor,
            fields,
        }
    }

    /// Detailed-schema JSON (`{"constructor":0,"fields":[..]}`, `{"int":1}`, ...).
    pub fn to_json(&self) -> Value {
        match self {
            Self::Constr {
                constructor,
                fields,
            } => json!({
                "constructor": constructor,
                "fields": fields.iter().map(Self::to_json).collect::<Vec<_>>(),
            }),
            Self::Map(entries) => json!({
                "map": entries
                    .iter()
                    .map(|(k, v)| json!({ "k": k.to_json(), "v": v.to_json() }))
                    .collect::<Vec<_>>(),
            }),
            Self::List(items) => json!({ "list": items.iter().map(Self::to_json).collect::<Vec<_>>() }),
            Self::Int(n) => json!({ "int": n }),
            Self::Bytes(b) => json!({ "bytes": bytes_to_hex(b) }),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        let obj = value
            .as_object()
            .ok_or_else(|| invalid("expected an object"))?;

        if let Some(constructor) = obj.get("constructor") {
            let constructor = constructor
                .as_u64()
                .ok_or_else(|| invalid("constructor must be a non-negative integer"))?;
            let fields = array_field(obj, "fields")?
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::constr(constructor, fields));
        }
        if let Some(n) = obj.get("int") {
            return n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| invalid("int out of range"));
        }
        if let Some(b) = obj.get("bytes") {
            let text = b.as_str().ok_or_else(|| invalid("bytes must be a hex string"))?;
            return Ok(Self::Bytes(hex_to_bytes(text)?));
        }
        if obj.contains_key("list") {
            let items = array_field(obj, "list")?
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::List(items));
        }
        if obj.contains_key("map") {
            let entries = array_field(obj, "map")?
                .iter()
                .map(|entry| {
                    let k = entry.get("k").ok_or_else(|| invalid("map entry missing k"))?;
                    let v = entry.get("v").ok_or_else(|| invalid("map entry missing v"))?;
                    Ok((Self::from_json(k)?, Self::from_json(v)?))
                })
                .collect::<Result<Vec<_>, CodecError>>()?;
            return Ok(Self::Map(entries));
        }
        Err(invalid("unknown plutus data variant"))
    }
}

fn array_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Vec<Value>, CodecError> {
    obj.get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| invalid(&format!("`{key}` must be an array")))
}

fn invalid(msg: &str) -> CodecError {
    CodecError::InvalidPlutusData(msg.to_string())
}

impl Serialize for PlutusData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PlutusData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Inline datum locked with every listing: `Constr 0 [price, sellerKeyHash]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDatum {
    pub price: u64,
    /// Seller's payment key hash (hex).
    pub seller_key_hash: String,
}

impl ListingDatum {
    pub fn to_plutus(&self) -> Result<PlutusData, CodecError> {
        let price = i64::try_from(self.price)
            .map_err(|_| invalid("price does not fit the datum integer range"))?;
        Ok(PlutusData::constr(
            0,
            vec![
                PlutusData::Int(price),
                PlutusData::Bytes(hex_to_bytes(&self.seller_key_hash)?),
            ],
        ))
    }

    pub fn from_plutus(data: &PlutusData) -> Result<Self, CodecError> {
        match data {
            PlutusData::Constr {
                constructor: 0,
                fields,
            } => match fields.as_slice() {
                [PlutusData::Int(price), PlutusData::Bytes(pkh)] => Ok(Self {
                    price: u64::try_from(*price).map_err(|_| invalid("negative price"))?,
                    seller_key_hash: bytes_to_hex(pkh),
                }),
                _ => Err(invalid("listing datum expects [int, bytes]")),
            },
            _ => Err(invalid("listing datum must be constructor 0")),
        }
    }
}

/// Spending paths of the marketplace contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRedeemer {
    /// Buyer pays the seller the listed price.
    Paid,
    /// Seller withdraws the listing.
    Cancel,
}

impl MarketRedeemer {
    pub fn constructor(self) -> u64 {
        match self {
            Self::Paid => 0,
            Self::Cancel => 1,
        }
    }

    pub fn to_plutus(self) -> PlutusData {
        PlutusData::constr(self.constructor(), vec![])
    }
}
