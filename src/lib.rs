pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod scan;
pub mod schema;

pub use error::{ProbeError, Result};
