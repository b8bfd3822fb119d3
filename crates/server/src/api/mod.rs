pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::start_server;
