//! Data module - CSV loading, normalization and the unified click table

mod loader;
mod normalizer;
pub mod table;

pub use loader::{DataLoader, LoaderError, RawSource, REQUIRED_COLUMNS};
pub use normalizer::{DateLayout, NormalizeError, Normalizer};
pub use table::{ClickRecord, ClickTable};
