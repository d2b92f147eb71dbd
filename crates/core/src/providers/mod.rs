pub mod registry;
pub mod traits;

// Collaborator implementations
pub mod http_backend;
#[cfg(not(target_arch = "wasm32"))]
pub mod yahoo_finance;
