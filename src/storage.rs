use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::scraper::{Product, ProductId};

use color_eyre::{Result, eyre::Context};
use log::{debug, error, info};

/// Every product seen so far, in the order it was first seen. Entries are
/// never replaced or removed.
#[derive(Debug, Default)]
pub struct KnownProducts {
    ids: HashSet<ProductId>,
    products: Vec<Product>,
}

impl KnownProducts {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records `product` unless its ID is already known. Returns whether it
    /// was added.
    pub fn insert(&mut self, product: Product) -> bool {
        if !self.ids.insert(product.id.clone()) {
            return false;
        }
        self.products.push(product);
        true
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }
}

impl FromIterator<Product> for KnownProducts {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut known = Self::default();
        for product in iter {
            known.insert(product);
        }
        known
    }
}

/// Flat JSON-array snapshot of [`KnownProducts`].
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<Vec<Product>>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Never fails: a missing, unreadable or malformed snapshot counts as empty.
    pub fn load(&self) -> KnownProducts {
        match self.read() {
            Ok(Some(products)) => {
                let known: KnownProducts = products.into_iter().collect();
                debug!("Read {} products from {}", known.len(), self.path.display());
                known
            }
            Ok(None) => {
                debug!("No snapshot at {}, starting empty", self.path.display());
                KnownProducts::default()
            }
            Err(e) => {
                error!("Failed to load {}: {e:#}", self.path.display());
                KnownProducts::default()
            }
        }
    }

    /// Overwrites the whole file. Not atomic.
    pub fn save(&self, known: &KnownProducts) -> Result<()> {
        info!("Saving {} known products", known.len());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let products: Vec<&Product> = known.iter().collect();
        fs::write(&self.path, serde_json::to_string_pretty(&products)?)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))
    }
}
