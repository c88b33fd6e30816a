//! Record-level preprocessing shared by training and serving

pub mod age;
pub mod cleaner;
pub mod text;

pub use age::derive_age;
pub use cleaner::{basic_clean, RawTable, REQUIRED_COLUMNS};
pub use text::{normalize_field, normalize_text};
