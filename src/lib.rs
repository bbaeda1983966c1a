pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod signal;
pub mod trading;
pub mod util;
