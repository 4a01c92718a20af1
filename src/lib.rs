// Library target shared by the binary, integration tests and benchmarks.

pub mod app;
pub mod config;
pub mod event;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod snippet;
pub mod ui;
