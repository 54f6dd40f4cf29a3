pub mod intake;
pub mod queries;
