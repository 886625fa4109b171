pub mod error;
pub mod paths;
