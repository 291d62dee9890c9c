//! Availability windowing shared by every view
//!
//! Pure functions only: no I/O, no clock reads. Callers pass the current
//! local instant in.
//!
//! - [`range`]: filter tag → concrete local `[start, end]`
//! - [`period`]: timestamp → morning/afternoon/evening/night
//! - [`visibility`]: hangout → mine/joined/past/discoverable/excluded
//! - [`format`]: "Today, 3:00 PM" style labels

pub mod format;
pub mod period;
pub mod range;
pub mod visibility;

pub use format::when_label;
pub use period::{group_by_period, periods_spanned, Period};
pub use range::{resolve_range, TimeFilter, TimeRange, WeekendPolicy};
pub use visibility::{classify, partition, Bucket, Partitioned};
