//! Utility functions and helpers

mod time;

pub use time::{format_datetime, timestamp_to_datetime};
