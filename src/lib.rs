pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod input;
pub mod model;
pub mod session;
pub mod ui;
