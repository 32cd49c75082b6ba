pub mod error;
pub mod gate;
pub mod handlers;
pub mod rest;
pub mod types;
