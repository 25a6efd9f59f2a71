mod loader;
mod types;

pub use loader::load_zone_catalog;
pub use types::{CatalogError, Zone, ZoneCatalog, MIN_POLYGON_VERTICES};
