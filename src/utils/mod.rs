pub mod logging;
pub mod panic_hook;
