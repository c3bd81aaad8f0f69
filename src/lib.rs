pub mod action;
pub mod app;
pub mod clients;
pub mod config;
pub mod event;
pub mod format;
pub mod kernel;
pub mod logging;
pub mod report;
pub mod telemetry;
pub mod ui;
