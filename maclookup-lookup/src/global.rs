//! Process-wide lookup instance.

use std::sync::OnceLock;

use maclookup_core::error::Result;
use maclookup_core::Manufacturer;

use crate::lookup::ManufacturerLookup;

static GLOBAL: OnceLock<ManufacturerLookup> = OnceLock::new();

/// Returns the shared lookup, building it from the environment on first use.
///
/// A configuration error is returned to the caller and the next call tries
/// again.
pub fn global() -> Result<&'static ManufacturerLookup> {
    if let Some(lookup) = GLOBAL.get() {
        return Ok(lookup);
    }
    let built = ManufacturerLookup::from_env()?;
    // A racing caller may have won; its instance is kept and ours dropped.
    Ok(GLOBAL.get_or_init(|| built))
}

/// [`ManufacturerLookup::lookup_manufacturer`] on the shared instance.
pub async fn lookup_manufacturer(raw_mac: &str, persist: bool) -> Result<Option<Manufacturer>> {
    global()?.lookup_manufacturer(raw_mac, persist).await
}

/// [`ManufacturerLookup::force_cache_save`] on the shared instance.
pub async fn force_cache_save() -> Result<()> {
    global()?.force_cache_save().await
}
