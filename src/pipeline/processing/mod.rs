// Transform stage: renaming, unit conversion, joining and aggregation

pub mod aggregate;
pub mod join;
pub mod normalize;
pub mod transform;

pub use aggregate::{filter_by_gdp_at_least, top_k_average_by_region};
pub use join::join;
pub use normalize::{
    drop_duplicate_countries, normalize, BuiltinMapping, JsonFileMapping, NameMapping,
    NameMappingSource,
};
pub use transform::transform;
