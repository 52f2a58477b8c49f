pub mod precision;

pub use precision::{format, format_pair, Axis, PrecisionError};
