pub mod capture_device;
pub mod focus_delegate;
