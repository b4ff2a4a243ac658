#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod backend;
pub mod error;
pub mod policy;

mod config;

pub use backend::{Backend, ValueFormat, ValueSerialization};
pub use config::ConfigShelter;
pub use error::ConfigError;
pub use policy::{ConfigPolicy, ConfigRule};
