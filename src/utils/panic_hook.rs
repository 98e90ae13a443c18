use std::panic;

/// Extracts the message carried by a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    }
}

/// Sets up a panic hook that reports panics through `tracing` before handing
/// off to the previous hook, so a panicking handler shows up in the service log.
pub fn set_custom_panic_hook() {
    let original_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());
        tracing::error!(
            "[PANIC] {} at {}",
            panic_message(panic_info.payload()),
            location
        );

        original_hook(panic_info);
    }));
}

/// Call in main.rs before the server starts
pub fn init() {
    set_custom_panic_hook();
    tracing::debug!("[PANIC_HOOK] Custom panic hook set up successfully");
}
