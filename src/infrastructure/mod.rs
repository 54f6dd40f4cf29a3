pub mod db;
pub mod inference;
pub mod storage;
pub mod utils;
