//! Time helpers: ISO-8601 UTC strings and calendar day ranges.

pub mod utc;

pub use utc::{
    day_range, day_start, format_naive, format_utc, parse_utc, truncate_to_minute,
};
