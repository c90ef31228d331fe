use crate::scraper::Product;
use crate::storage::KnownProducts;

/// Moves every product whose ID is not yet known into `known` and returns
/// those products in fetch order. A product is new purely by ID; changes to
/// an already-known product are ignored.
pub fn absorb_new(known: &mut KnownProducts, fetched: Vec<Product>) -> Vec<Product> {
    let mut fresh = Vec::new();
    for product in fetched {
        if known.contains(&product.id) {
            continue;
        }
        known.insert(product.clone());
        fresh.push(product);
    }
    fresh
}
