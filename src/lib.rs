pub mod config;
pub mod cycle;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod parse;
pub mod report;
