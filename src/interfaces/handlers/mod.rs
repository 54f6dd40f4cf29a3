pub mod analyses;
pub mod analyze;
pub mod home;
pub mod json_error;
pub mod system;
