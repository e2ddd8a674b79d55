pub mod boundaries;
pub mod cache;
pub mod loader;
pub mod types;

pub use boundaries::{join_boundaries, load_boundaries, read_boundaries, DistrictBoundary, JoinResult, MapFeature};
pub use cache::{clear_cache, get_cache_path, CacheConfig, CacheSource, DatasetCache, Fingerprint};
pub use loader::{load_indicators, read_indicators};
pub use types::{ColumnView, IndicatorRecord, IndicatorTable};
