//! Products microservice runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: database connection and
//! migrations, the TCP transport, the message-bus transport and graceful
//! shutdown. The binary is a thin CLI around it.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::ProductsService;
use crate::config::{AppConfig, LoggingConfig};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{init_database, SeaOrmProductRepository};
use crate::interfaces::{BusTransport, MessageBus, ProductsController, RpcHandler, TcpTransport};
use crate::shared::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running products microservice.
///
/// ```rust,no_run
/// use products_ms::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Bus with every product pattern subscribed: NATS when `bus.servers`
    /// is set, in-process otherwise.
    pub bus: MessageBus,
    pub service: Arc<ProductsService<SeaOrmProductRepository>>,
    pub config: AppConfig,
    /// Port the TCP transport actually bound (differs from config when 0).
    pub port: u16,

    shutdown: ShutdownCoordinator,
    tcp_task: tokio::task::JoinHandle<()>,
    bus_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        config.validate()?;

        info!("Starting products microservice...");

        // ── Database ───────────────────────────────────────────
        let db = init_database(&config.database_config()).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Service & handlers ─────────────────────────────────
        let repo = Arc::new(SeaOrmProductRepository::new(db));
        let service = Arc::new(ProductsService::new(repo));
        service.connect().await?;

        let handler: Arc<dyn RpcHandler> = Arc::new(ProductsController::new(
            service.clone(),
            config.rpc_policy(),
        ));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Transports ─────────────────────────────────────────
        let transport = TcpTransport::bind(config.server.address(), handler.clone())
            .await?
            .with_shutdown(shutdown_signal.clone());
        let port = transport.local_addr()?.port();

        let bus = if config.bus.servers.is_empty() {
            info!("No bus servers configured, message bus is in-process only");
            MessageBus::new()
        } else {
            MessageBus::connect(&config.bus.servers).await?
        };
        let bus_task = BusTransport::attach(&bus, handler)
            .await?
            .with_shutdown(shutdown_signal)
            .spawn();

        let tcp_task = tokio::spawn(async move {
            if let Err(e) = transport.run().await {
                error!("TCP transport error: {}", e);
            }
        });

        info!("Products microservice running on port:{}", port);

        Ok(Self {
            bus,
            service,
            config,
            port,
            shutdown,
            tcp_task,
            bus_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for shutdown to be triggered, then stop the transports and
    /// release the store, bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            service,
            shutdown,
            tcp_task,
            bus_task,
            ..
        } = self;

        let completed = shutdown
            .shutdown_with_cleanup(|| async move {
                if let Err(e) = tcp_task.await {
                    error!("TCP transport task panicked: {}", e);
                }
                if let Err(e) = bus_task.await {
                    error!("Bus transport task panicked: {}", e);
                }
                if let Err(e) = service.disconnect().await {
                    warn!("Error closing database connection: {}", e);
                }
            })
            .await;

        if completed {
            info!("👋 Products microservice shutdown complete");
        }
    }

    pub async fn shutdown(self) {
        info!("🛑 Shutting down products microservice...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.tcp_task.is_finished() || !self.bus_task.is_finished()
    }
}

/// Initialize tracing from the logging section. `RUST_LOG` takes precedence.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    if config.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
