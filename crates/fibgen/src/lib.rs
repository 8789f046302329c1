//! fibgen library — application logic for the Fibonacci generator demo.

pub mod app;
pub mod config;
pub mod errors;
pub mod filter;
pub mod version;
