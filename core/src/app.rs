//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::queue::QueueService;
use crate::data::stores::StoreService;
use crate::domain::IngestPipeline;

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub queue: Arc<QueueService>,
    pub stores: Arc<StoreService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Check) => Self::check(&cli_config).await,
            Some(Commands::Start) | None => {
                let app = Self::init(&cli_config).await?;
                Self::start_pipeline(app).await
            }
        }
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let queue = Arc::new(
            QueueService::init(config.queue.backend, &config.queue.url, &config.queue.name)
                .await
                .context("Failed to initialize queue service")?,
        );
        tracing::debug!(backend = queue.backend_name(), "Queue initialized");

        let stores = Arc::new(
            StoreService::init(&config.stores)
                .await
                .context("Failed to initialize store backends")?,
        );

        let shutdown = ShutdownService::new(Arc::clone(&queue));

        Ok(Self {
            shutdown,
            config,
            queue,
            stores,
        })
    }

    /// Verify every configured connection, then exit
    async fn check(cli: &CliConfig) -> Result<()> {
        let app = Self::init(cli).await?;

        app.queue
            .health_check()
            .await
            .context("Queue health check failed")?;
        println!("queue ({}): ok", app.queue.backend_name());

        app.stores
            .initialize()
            .await
            .context("Store initialization failed")?;
        app.stores
            .health_check()
            .await
            .context("Store health check failed")?;
        for backend in app.stores.backends() {
            println!("store {}: ok", backend.name());
        }

        app.queue.close().await;
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_pipeline(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        app.stores
            .initialize()
            .await
            .context("Store initialization failed")?;

        banner::print_banner(&app.config);

        let pipeline = IngestPipeline::new(
            Arc::clone(&app.queue),
            Arc::clone(&app.stores),
            &app.config.core,
        );
        app.shutdown
            .register(pipeline.start(app.shutdown.subscribe()))
            .await;

        tracing::info!(
            queue = app.queue.work_queue(),
            backend = app.queue.backend_name(),
            "Pipeline ready"
        );

        // Block until a signal or internal trigger, then drain
        app.shutdown.wait().await;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
