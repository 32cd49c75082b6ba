pub mod matcher;
pub mod types;
