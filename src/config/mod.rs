// src/config/mod.rs
pub mod schema;
pub mod settings;

// Re-export commonly used types
pub use schema::{Format, NamingPolicy, Role};
pub use settings::Settings;
