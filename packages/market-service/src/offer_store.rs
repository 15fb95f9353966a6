//! Ordered offer collection persisted under a single key.
//!
//! Every mutation reads the full sequence, edits it in memory and writes the
//! whole sequence back. Mutations from this process are serialized; other
//! processes sharing the same backend are last-writer-wins.

use market_types::{decode_offers, encode_offers, lovelace_to_ada, OfferRecord, OutputRef};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::metrics::METRICS;
use crate::storage::KeyValueStore;

/// Well-known key of the persisted offer sequence.
pub const OFFERS_KEY: &str = "offers";

/// An offer paired with its current position in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedOffer {
    pub index: usize,
    #[serde(flatten)]
    pub offer: OfferRecord,
    /// `price` rendered in ADA for display.
    #[serde(rename = "priceAda")]
    pub price_ada: String,
}

impl IndexedOffer {
    pub fn new(index: usize, offer: OfferRecord) -> Self {
        Self {
            index,
            price_ada: lovelace_to_ada(offer.price),
            offer,
        }
    }
}

pub struct OfferStore {
    backend: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl OfferStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    /// Full sequence. Absent or malformed text loads as an empty store.
    pub fn load_all(&self) -> Result<Vec<OfferRecord>, crate::Error> {
        let Some(text) = self.backend.get(OFFERS_KEY)? else {
            return Ok(Vec::new());
        };
        match decode_offers(&text) {
            Ok(offers) => Ok(offers),
            Err(e) => {
                warn!(error = %e, "Offer store is malformed, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    pub fn len(&self) -> Result<usize, crate::Error> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, crate::Error> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, index: usize) -> Result<OfferRecord, crate::Error> {
        let offers = self.load_all()?;
        let len = offers.len();
        offers
            .into_iter()
            .nth(index)
            .ok_or(crate::Error::IndexOutOfRange { index, len })
    }

    /// Append and return the new record's position.
    pub fn append_one(&self, record: OfferRecord) -> Result<usize, crate::Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut offers = self.load_all()?;
        let output = record.output_ref();
        offers.push(record);
        self.write_all(&offers)?;
        let index = offers.len() - 1;
        info!(index, output = %output, "Offer appended");
        Ok(index)
    }

    /// Remove the record at `index`; out-of-range leaves the store unchanged.
    pub fn remove_at(&self, index: usize) -> Result<OfferRecord, crate::Error> {
        self.remove_checked(index, None)
    }

    /// Remove the record at `index` only if it still backs `expected`.
    pub fn remove_matching(
        &self,
        index: usize,
        expected: &OutputRef,
    ) -> Result<OfferRecord, crate::Error> {
        self.remove_checked(index, Some(expected))
    }

    fn remove_checked(
        &self,
        index: usize,
        expected: Option<&OutputRef>,
    ) -> Result<OfferRecord, crate::Error> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut offers = self.load_all()?;
        let len = offers.len();
        let Some(current) = offers.get(index) else {
            warn!(index, len, "Offer removal out of range");
            return Err(crate::Error::IndexOutOfRange { index, len });
        };
        if let Some(expected) = expected {
            if current.output_ref() != *expected {
                warn!(index, found = %current.output_ref(), expected = %expected, "Offer at index changed");
                return Err(crate::Error::StaleOffer {
                    index,
                    expected: expected.clone(),
                });
            }
        }
        let removed = offers.remove(index);
        self.write_all(&offers)?;
        info!(index, output = %removed.output_ref(), "Offer removed");
        Ok(removed)
    }

    /// Every offer with its position.
    pub fn indexed(&self) -> Result<Vec<IndexedOffer>, crate::Error> {
        Ok(self
            .load_all()?
            .into_iter()
            .enumerate()
            .map(|(index, offer)| IndexedOffer::new(index, offer))
            .collect())
    }

    /// Offers listed by `address`, paired with their position in the full
    /// store. Positions are valid until the next mutation.
    pub fn filter_by_seller(&self, address: &str) -> Result<Vec<(OfferRecord, usize)>, crate::Error> {
        Ok(self
            .load_all()?
            .into_iter()
            .enumerate()
            .filter(|(_, offer)| offer.is_sold_by(address))
            .map(|(index, offer)| (offer, index))
            .collect())
    }

    fn write_all(&self, offers: &[OfferRecord]) -> Result<(), crate::Error> {
        self.backend.set(OFFERS_KEY, &encode_offers(offers)?)?;
        METRICS.store_writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
