//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `bucketlist_core` linkage.
//! - Report how many places the configured store currently holds.

use bucketlist_core::{JsonFileLocationRepository, LocationStore, StoreConfig};

fn main() {
    println!("bucketlist_core ping={}", bucketlist_core::ping());
    println!("bucketlist_core version={}", bucketlist_core::core_version());

    let config = StoreConfig::from_env();
    if let Err(err) = config.validate() {
        eprintln!("bucketlist_core config_error={err}");
        std::process::exit(2);
    }
    // Read-only probe: opening loads the collection but never writes it.
    let path = config.save_path();
    let store = LocationStore::open(JsonFileLocationRepository::new(&path));
    println!("bucketlist_core store={} places={}", path.display(), store.len());
}
