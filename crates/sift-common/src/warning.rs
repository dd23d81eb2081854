//! Parser warnings routed through the `log` facade.
//!
//! Provides deduplication so a document with thousands of identical
//! malformed constructs reports each distinct problem once.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already logged (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about a recoverable problem (logged once per unique message).
///
/// The message goes to the `log` facade at `warn` level with `component`
/// as the target, so hosts can filter per component.
///
/// # Example
/// ```
/// use sift_common::warning::warn_once;
///
/// warn_once("attributes", "gave up recovering quotes in <a title=\"x>");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_log = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_log {
        log::warn!(target: component, "{message}");
    }
}

/// Clear all recorded warnings (call when starting an unrelated document).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

/// Whether `message` for `component` has already been logged.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|set| set.contains(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_records_message() {
        warn_once("test-component", "first message");
        assert!(was_warned("test-component", "first message"));
        assert!(!was_warned("test-component", "never logged"));
    }

    #[test]
    fn test_same_message_other_component_is_distinct() {
        warn_once("component-a", "shared text");
        assert!(was_warned("component-a", "shared text"));
        assert!(!was_warned("component-b", "shared text"));
    }
}
