pub mod civiltime;
pub mod config;
pub mod error;
pub mod ids;

pub use config::Config;
pub use error::{CoreError, Result};
