use std::thread;
use std::time::Duration;

use crate::diff::absorb_new;
use crate::notify::Notifier;
use crate::scraper::{Catalog, Category, Product};
use crate::storage::{KnownProducts, SnapshotStore};

use color_eyre::{Result, eyre::Context};
use log::{debug, error, info, warn};
use strum::VariantArray;

#[derive(Debug)]
pub struct CycleReport {
    pub build_id: String,
    pub fetched: usize,
    pub new_products: Vec<Product>,
    pub saved: bool,
}

/// Owns the known-product mirror and drives fetch, diff, notify and save.
pub struct Monitor<C, N> {
    catalog: C,
    notifier: N,
    store: SnapshotStore,
    known: KnownProducts,
}

impl<C: Catalog, N: Notifier> Monitor<C, N> {
    /// Loads the snapshot once; from here on the monitor is its only writer.
    pub fn new(catalog: C, notifier: N, store: SnapshotStore) -> Self {
        let known = store.load();
        if known.is_empty() {
            info!("No known products yet, every listed product will be reported");
        } else {
            info!("Loaded {} known products from {}", known.len(), store.path().display());
        }
        Self {
            catalog,
            notifier,
            store,
            known,
        }
    }

    pub const fn known(&self) -> &KnownProducts {
        &self.known
    }

    // A failing category contributes nothing; the rest of the cycle goes on.
    fn fetch_category(&self, build_id: &str, category: Category) -> Vec<Product> {
        match self.catalog.category_products(build_id, category) {
            Ok(products) => {
                debug!("{category}: {} products", products.len());
                products
            }
            Err(e) => {
                warn!("Error fetching products for category {}: {e:#}", category.key());
                Vec::new()
            }
        }
    }

    pub fn run_cycle(&mut self) -> Result<CycleReport> {
        let build_id = self.catalog.build_id().wrap_err("failed to resolve build ID")?;
        debug!("Using build ID {build_id}");

        let mut fetched = 0;
        let mut new_products = Vec::new();

        for &category in Category::VARIANTS {
            let products = self.fetch_category(&build_id, category);
            fetched += products.len();

            for product in absorb_new(&mut self.known, products) {
                if let Err(e) = self.notifier.notify(&product) {
                    warn!("Failed to notify about product {}: {e:#}", product.id);
                }
                new_products.push(product);
            }
        }

        let saved = !new_products.is_empty();
        if saved {
            self.store.save(&self.known)?;
        }

        Ok(CycleReport {
            build_id,
            fetched,
            new_products,
            saved,
        })
    }

    /// Runs cycles back to back with `interval` of idle time after each one,
    /// whatever its outcome. Returns only once `max_cycles` have run.
    pub fn run(&mut self, interval: Duration, max_cycles: Option<u64>) {
        let mut completed = 0;
        loop {
            match self.run_cycle() {
                Ok(report) => info!(
                    "Cycle done (build {}): {} fetched, {} new, {} known{}",
                    report.build_id,
                    report.fetched,
                    report.new_products.len(),
                    self.known().len(),
                    if report.saved { ", snapshot saved" } else { "" }
                ),
                Err(e) => error!("Monitor error: {e:#}"),
            }

            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                break;
            }
            thread::sleep(interval);
        }
    }
}
