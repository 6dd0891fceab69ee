#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod card;
pub mod config;
pub mod data;
pub mod detail;
pub mod dummyjson;
pub mod feed;
pub mod logging;
pub mod login;
pub mod session;
pub mod storage;
pub mod ui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
