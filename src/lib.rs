pub mod api;
pub mod core;
pub mod storage;
pub mod utils;

use std::sync::Arc;
use tokio::signal;
use tracing::{info, error};

use crate::{
    api::{gate::ApiKeyComparator, rest},
    core::{
        identity::matcher::matcher_from_name,
        services::{
            attendance::AttendanceService,
            enrollment::{EnrollmentPolicy, EnrollmentService},
            health::HealthService,
            report::ReportService,
            resolution::{ResolutionPolicy, ResolutionService},
            sequencer::AttendanceSequencer,
        },
    },
    storage::{AttendanceLedger, IdentityStore},
    utils::{
        config::Config,
        error::{AttendanceError, Result},
        metrics::Metrics,
        monitoring::Monitor,
    },
};

/// Everything the HTTP surface needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub comparator: Arc<ApiKeyComparator>,
    pub metrics: Arc<Metrics>,
    pub enrollment: Arc<EnrollmentService>,
    pub attendance: Arc<AttendanceService>,
    pub reports: Arc<ReportService>,
    pub health: Arc<HealthService>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let (store, ledger) = storage::open(&config.storage)?;
        Self::with_stores(config, store, ledger)
    }

    pub fn with_stores(
        config: &Config,
        store: Arc<dyn IdentityStore>,
        ledger: Arc<dyn AttendanceLedger>,
    ) -> Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let matcher = matcher_from_name(&config.resolution.matcher)?;

        let resolution = Arc::new(ResolutionService::new(
            store.clone(),
            matcher,
            ResolutionPolicy::from(&config.resolution),
            metrics.clone(),
        ));
        let sequencer = Arc::new(AttendanceSequencer::new(ledger.clone(), metrics.clone()));

        Ok(Self {
            comparator: Arc::new(ApiKeyComparator::new(&config.security.api_key)),
            enrollment: Arc::new(EnrollmentService::new(
                store.clone(),
                EnrollmentPolicy::from(&config.resolution),
            )),
            attendance: Arc::new(AttendanceService::new(
                resolution,
                sequencer,
                config.request_timeout(),
            )),
            reports: Arc::new(ReportService::new(store.clone(), ledger.clone())),
            health: Arc::new(HealthService::new(store, ledger, metrics.clone())),
            metrics,
        })
    }
}

pub struct Application {
    config: Arc<Config>,
    state: AppState,
}

impl Application {
    pub fn new(config: Config) -> Result<Self> {
        info!(
            backend = ?config.storage.backend,
            matcher = %config.resolution.matcher,
            threshold = config.resolution.acceptance_threshold,
            min_template_len = config.resolution.min_template_len,
            "Initializing services..."
        );
        let state = AppState::from_config(&config)?;

        Ok(Self {
            config: Arc::new(config),
            state,
        })
    }

    /// Serves until ctrl-c, then drains in-flight requests.
    pub async fn run(self) -> Result<()> {
        use actix_web::{middleware::from_fn, App, HttpServer};

        let monitor = Monitor::new(self.state.metrics.clone(), self.config.metrics_interval()).start();

        let state = self.state.clone();
        let origins = self.config.node.allowed_origins.clone();
        let mut server = HttpServer::new(move || {
            let state = state.clone();
            App::new()
                .wrap(rest::cors(&origins))
                .wrap(from_fn(rest::track_requests))
                .configure(move |cfg| rest::configure(cfg, &state))
        })
        .disable_signals();

        if self.config.node.workers > 0 {
            server = server.workers(self.config.node.workers);
        }

        let server = server
            .bind((self.config.node.host.as_str(), self.config.node.port))
            .map_err(|e| AttendanceError::Config(format!("Failed to bind API server: {}", e)))?
            .run();
        let handle = server.handle();

        info!(
            host = %self.config.node.host,
            port = self.config.node.port,
            "API server listening"
        );

        let mut server_task = actix_web::rt::spawn(server);
        let result = tokio::select! {
            joined = &mut server_task => match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(AttendanceError::Internal(format!("API server failed: {}", e))),
                Err(e) => Err(AttendanceError::Internal(format!("API server task failed: {}", e))),
            },
            signal = signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Received shutdown signal"),
                    Err(e) => error!("Failed to listen for shutdown signal: {}", e),
                }
                handle.stop(true).await;
                let _ = server_task.await;
                Ok(())
            }
        };

        monitor.abort();
        info!("Application shutdown complete");
        result
    }
}
