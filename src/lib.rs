extern crate env_logger;
extern crate log;

pub mod chain;
pub mod error;
pub mod evidence;
pub mod names;
pub mod orientation;
pub mod pipelines;
pub mod schema;
pub mod tables;

pub use error::{Error, Result};
