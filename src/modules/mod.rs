//! Peerpool views and mutations
//!
//! Each view runs its section queries one after another. A failing section is
//! logged, emptied and named in the view's `degraded` list; it never fails
//! the whole view.

pub mod availability;
pub mod create;
pub mod hangouts;
pub mod home;
pub mod people;
pub mod time;

use tracing::warn;

/// Unwrap a section result, falling back to an empty value on failure
pub(crate) fn or_empty<T: Default>(
    result: anyhow::Result<T>,
    section: &'static str,
    degraded: &mut Vec<&'static str>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(section, error = %e, "view section failed, showing it empty");
            if !degraded.contains(&section) {
                degraded.push(section);
            }
            T::default()
        }
    }
}
