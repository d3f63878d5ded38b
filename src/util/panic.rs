//! Rendering of panic payloads caught with `catch_unwind`.

use std::any::Any;

/// Extract a human-readable message from a panic payload.
///
/// `panic!` with a literal produces a `&'static str` payload, with format
/// arguments a `String`; anything else is reported generically.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
