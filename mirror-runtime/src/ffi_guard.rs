// Panic containment for the C exports and the protocol handler table.

use std::any::Any;
use std::panic::{self, UnwindSafe};

/// Run an exported function body, turning a panic into `sentinel`.
///
/// Unwinding out of an `extern "C"` function aborts the host, so every
/// `mirror_*` export wraps its body in this.
pub fn ffi_boundary<F, R>(sentinel: R, f: F) -> R
where
    F: FnOnce() -> R + UnwindSafe,
{
    panic::catch_unwind(f).unwrap_or_else(|payload| {
        log::error!("panic in C API call: {}", panic_message(payload.as_ref()));
        sentinel
    })
}

/// The message a panic was raised with, if it carried one.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_results_through() {
        assert_eq!(ffi_boundary(0u32, || 7), 7);
        assert_eq!(ffi_boundary(None, || Some("Transform")), Some("Transform"));
    }

    #[test]
    fn panics_become_the_sentinel() {
        assert_eq!(ffi_boundary(-1i32, || panic!("field table corrupt")), -1);
        assert!(!ffi_boundary(false, || -> bool { panic!("{} missing", "Transform") }));
    }

    #[test]
    fn messages_are_recovered_from_payloads() {
        let literal = panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), "static text");
        let formatted = panic::catch_unwind(|| panic!("id {}", 3)).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), "id 3");
        let other = panic::catch_unwind(|| panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(other.as_ref()), "<non-string panic payload>");
    }
}
