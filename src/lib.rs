pub mod banner;
pub mod commands;
pub mod completion;
pub mod config;
pub mod consts;
pub mod error;
pub mod events;
pub mod http;
pub mod search;
pub mod workflow;

pub use error::{Error, Result, RunFailure};
