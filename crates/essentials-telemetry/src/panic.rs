//! Panic reporting.
//!
//! [`install_panic_hook`] routes panics into the log as `Uncaught exception`
//! events so they reach the same sink as every other log line.

/// Extracts the message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Replaces the process panic hook with one that logs at error level.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();
        let message = panic_message(info.payload());

        tracing::error!(
            error = %message,
            location = %location,
            "Uncaught exception"
        );
    }));
}
