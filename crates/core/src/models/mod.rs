pub mod goal;
pub mod holdings;
pub mod investment;
pub mod projection;
pub mod query;
pub mod quote;
pub mod settings;
pub mod summary;
