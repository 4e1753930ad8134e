pub mod config;
pub mod error;
pub mod frame;
pub mod report;
pub mod request;
pub mod session;
pub mod state;
