pub mod analysis;
pub mod asset;
pub mod pipeline;
