//! Offer store persistence through the file backend.

use anyhow::Result;
use market_service::offer_store::{OfferStore, OFFERS_KEY};
use market_service::storage::{FileStore, KeyValueStore};
use market_service::Error;
use std::path::PathBuf;
use std::sync::Arc;

use crate::utils::{sample_offer, BUYER_HEX, SELLER_HEX};

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("market_store_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn file_store(dir: &PathBuf) -> (OfferStore, Arc<FileStore>) {
    let backend = Arc::new(FileStore::new(dir.clone()));
    (OfferStore::new(backend.clone()), backend)
}

#[test]
fn test_append_to_empty_store_persists_single_record() -> Result<()> {
    let dir = temp_dir("append");
    let (store, backend) = file_store(&dir);

    let index = store.append_one(sample_offer(SELLER_HEX, 1))?;

    assert_eq!(index, 0);
    let raw = backend.get(OFFERS_KEY)?.expect("offers written");
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    assert_eq!(parsed.as_array().map(Vec::len), Some(1));
    assert_eq!(parsed[0]["seller"], sample_offer(SELLER_HEX, 1).seller);
    assert_eq!(parsed[0]["outputId"], 1);

    // A fresh store over the same directory sees the record
    let (reopened, _) = file_store(&dir);
    assert_eq!(reopened.load_all()?, vec![sample_offer(SELLER_HEX, 1)]);
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_remove_only_offer_leaves_empty_list() -> Result<()> {
    let dir = temp_dir("remove");
    let (store, backend) = file_store(&dir);
    store.append_one(sample_offer(SELLER_HEX, 1))?;

    let removed = store.remove_at(0)?;

    assert_eq!(removed, sample_offer(SELLER_HEX, 1));
    assert!(store.is_empty()?);
    assert_eq!(backend.get(OFFERS_KEY)?.as_deref(), Some("[]"));
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_remove_out_of_range_keeps_file() -> Result<()> {
    let dir = temp_dir("range");
    let (store, backend) = file_store(&dir);
    store.append_one(sample_offer(SELLER_HEX, 1))?;
    let before = backend.get(OFFERS_KEY)?;

    let result = store.remove_at(3);

    assert!(matches!(result, Err(Error::IndexOutOfRange { index: 3, len: 1 })));
    assert_eq!(backend.get(OFFERS_KEY)?, before);
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_malformed_record_reads_as_empty() -> Result<()> {
    let dir = temp_dir("malformed");
    let (store, backend) = file_store(&dir);
    backend.set(OFFERS_KEY, "{not json")?;

    assert!(store.load_all()?.is_empty());

    // The next append replaces the malformed text
    store.append_one(sample_offer(BUYER_HEX, 2))?;
    assert_eq!(store.load_all()?, vec![sample_offer(BUYER_HEX, 2)]);
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn test_seller_filter_keeps_global_positions() -> Result<()> {
    let dir = temp_dir("seller");
    let (store, _) = file_store(&dir);
    store.append_one(sample_offer(BUYER_HEX, 1))?;
    store.append_one(sample_offer(SELLER_HEX, 2))?;
    store.append_one(sample_offer(BUYER_HEX, 3))?;
    store.append_one(sample_offer(SELLER_HEX, 4))?;

    let mine = store.filter_by_seller(&sample_offer(SELLER_HEX, 0).seller)?;

    let positions: Vec<usize> = mine.iter().map(|(_, index)| *index).collect();
    assert_eq!(positions, vec![1, 3]);
    assert_eq!(mine[1].0, sample_offer(SELLER_HEX, 4));
    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
