pub mod checker;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod git;
pub mod io;
pub mod paths;
pub mod report;
pub mod scan;

pub use error::{Result, StaleError};
