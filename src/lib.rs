pub mod api;
pub mod app;
pub mod manager;
pub mod error;
pub mod ports;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;

pub use crate::manager::session::{NotifyManager, SendOutcome};
pub use crate::error::{Error, Result};
