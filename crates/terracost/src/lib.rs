#![forbid(unsafe_code)]

pub(crate) mod auth;
mod cli;
pub(crate) mod client;
pub mod config;
pub(crate) mod report;
#[cfg(test)]
mod testing;
pub(crate) mod token;

pub use cli::run;
pub use config::Config;
