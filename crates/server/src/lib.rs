pub mod api;
pub mod state;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
