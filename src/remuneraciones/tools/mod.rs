pub mod apportion;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod hours;
pub mod io;
pub mod logging;
pub mod merge;
pub mod mode;
pub mod model;
pub mod pipeline;
pub mod validate;
pub mod worker;

pub use error::{Result, ToolError};
