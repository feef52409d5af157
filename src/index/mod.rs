//! Economic price index: normalization, interpolation and monetary correction ratios

mod series;
pub mod loader;

pub use series::{InterpolatedIndex, PriceIndexPoint};
pub use loader::{load_index, load_index_from_reader, normalize_index_rows, IndexRow};
