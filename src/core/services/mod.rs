pub mod attendance;
pub mod enrollment;
pub mod health;
pub mod report;
pub mod resolution;
pub mod sequencer;
