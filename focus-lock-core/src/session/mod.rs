pub mod controller;
pub mod focus_session;
