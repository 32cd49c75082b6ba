#[path = "../common/mod.rs"]
mod common;

mod api_tests;
mod sequencing_tests;
