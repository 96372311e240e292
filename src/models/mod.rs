/// Extracted identity fields
pub mod field;
/// Scan rectangles and polarity
pub mod region;

pub use field::{Field, ScannedRecord};
pub use region::{Polarity, ScanRegion};
