//! Generic save/load of serde data.
//!
//! Files live under two roots: a bundled, read-mostly *default* root and a
//! writable *external* root. A [`NamingPolicy`] decides where each file goes
//! and a [`SaveHandler`] moves one data type in and out of those files,
//! either with the built-in XML/JSON codecs or with caller-supplied
//! functions.
//!
//! Modules:
//! - `config`: naming policy, roles, formats and layered settings
//! - `file`: codecs, strategies and the save handler
//! - `error`: error type shared by handler operations

pub mod config;
pub mod error;
pub mod file;

pub use self::config::{Format, NamingPolicy, Role, Settings};
pub use error::SaveError;
pub use file::{
    BuiltinCodec, Codec, CustomStrategy, JsonCodec, LoadOutcome, SaveHandler, SaveOutcome,
    SeedOutcome, Strategy, XmlCodec,
};
