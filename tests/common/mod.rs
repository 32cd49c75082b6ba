// tests/common/mod.rs
use attendance_node::{utils::config::Config, AppState};

pub const API_KEY: &str = "integration-test-key";
pub const TEMPLATE_LEN: usize = 120;

pub fn test_config() -> Config {
    Config::with_api_key(API_KEY).expect("default test config is valid")
}

pub fn test_state() -> AppState {
    AppState::from_config(&test_config()).expect("in-memory state builds")
}

/// Sinusoid template; distinct frequencies give templates that do not match
/// each other, small phase offsets give resembling samples.
pub fn wave(frequency: f32, phase: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * frequency + phase).sin()).collect()
}

/// Alternating +1/-1, uncorrelated with every `wave` template.
pub fn stranger(len: usize) -> Vec<f32> {
    (0..len).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
}

/// Builds the full service (health + gated API) the way the server does.
macro_rules! init_app {
    ($state:expr) => {{
        let state = $state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::from_fn(attendance_node::api::rest::track_requests))
                .configure(move |cfg| attendance_node::api::rest::configure(cfg, &state)),
        )
        .await
    }};
}
pub(crate) use init_app;
