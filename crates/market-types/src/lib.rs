//! Shared types and pure-logic utilities for the NFT marketplace client.
//! No wallet or network dependency; usable by any frontend of the store.

mod asset;
mod codec;
mod error;
mod metadata;
mod offer;
mod plutus;

pub use asset::{AssetAmount, AssetId, bytes_to_hex, hex_to_bytes};
pub use codec::{decode_offers, encode_offers};
pub use error::CodecError;
pub use metadata::{CIP25_LABEL, Cip25Metadata};
pub use offer::{LOVELACE_PER_ADA, OfferRecord, OutputRef, lovelace_to_ada};
pub use plutus::{ListingDatum, MarketRedeemer, PlutusData};
