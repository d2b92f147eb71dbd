pub mod store;

// Durable store implementations
#[cfg(not(target_arch = "wasm32"))]
pub mod file_store;
pub mod memory_store;
