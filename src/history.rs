use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One completed try-on, recorded fire-and-forget when a photo or video
/// session finishes. The per-product record count doubles as the
/// product's try-on view counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TryOnRecord {
    pub id: String,
    pub category: String,
    pub mode: String,
    pub frames_rendered: u32,
}

impl TryOnRecord {
    pub fn new(category: &str, mode: &str, frames_rendered: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category: category.to_string(),
            mode: mode.to_string(),
            frames_rendered,
        }
    }
}

fn product_store_path(store_root: &Path, product_id: &str) -> PathBuf {
    store_root.join(product_id)
}

pub fn load_records(store_root: &Path, product_id: &str) -> Result<Vec<TryOnRecord>> {
    let file = product_store_path(store_root, product_id).join("tryons.bin");
    if !file.exists() {
        return Ok(vec![]);
    }
    let data = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    Ok(postcard::from_bytes(&data)?)
}

pub fn record_try_on(store_root: &Path, product_id: &str, record: TryOnRecord) -> Result<()> {
    let path = product_store_path(store_root, product_id);
    std::fs::create_dir_all(&path)?;
    let mut records = load_records(store_root, product_id)?;
    records.push(record);
    let file = path.join("tryons.bin");
    let data = postcard::to_allocvec(&records)?;
    std::fs::write(&file, data)?;
    Ok(())
}

/// Try-on view count for a product.
pub fn count(store_root: &Path, product_id: &str) -> Result<usize> {
    Ok(load_records(store_root, product_id)?.len())
}

pub fn purge(store_root: &Path, product_id: &str) -> Result<()> {
    let path = product_store_path(store_root, product_id);
    if path.exists() {
        std::fs::remove_dir_all(&path).with_context(|| format!("removing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("facefit-history-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn records_accumulate_per_product() {
        let root = temp_store("accumulate");
        record_try_on(&root, "prod-1", TryOnRecord::new("glasses", "photo", 1)).unwrap();
        record_try_on(&root, "prod-1", TryOnRecord::new("glasses", "video", 42)).unwrap();
        record_try_on(&root, "prod-2", TryOnRecord::new("earrings", "photo", 1)).unwrap();

        assert_eq!(count(&root, "prod-1").unwrap(), 2);
        assert_eq!(count(&root, "prod-2").unwrap(), 1);
        let records = load_records(&root, "prod-1").unwrap();
        assert_eq!(records[1].frames_rendered, 42);
        assert_eq!(records[1].mode, "video");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn purge_resets_the_counter() {
        let root = temp_store("purge");
        record_try_on(&root, "prod-9", TryOnRecord::new("earrings", "photo", 1)).unwrap();
        assert_eq!(count(&root, "prod-9").unwrap(), 1);
        purge(&root, "prod-9").unwrap();
        assert_eq!(count(&root, "prod-9").unwrap(), 0);
        // Purging an absent product is a no-op.
        purge(&root, "prod-9").unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }
}
