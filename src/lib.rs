pub mod cli;
pub mod settings;
pub mod database;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod readers;
pub mod utils;
pub mod writers;

pub use error::{ErrorKind, EtlError, Result};
