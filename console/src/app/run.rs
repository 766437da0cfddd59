//! Main application run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::{AppState, Parts};
use crate::errors::ConsoleError;
use crate::http::statuses::StatusSource;
use crate::push::channel::{build_progress_url, WsConnector};
use crate::server::serve::serve;
use crate::server::state::ServerState;
use crate::sync::synchronizer::{SyncHandle, Synchronizer};
use crate::workers::push::PushControl;
use crate::workers::{poller, push};

/// Run the deployment console
pub async fn run(
    console_version: String,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Initializing deployment console v{}...", console_version);

    // Create shutdown channel
    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager =
        ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    // Initialize the app state
    let _app_state = match init(&console_version, &options, &shutdown_tx, &mut shutdown_manager)
        .await
    {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to start console: {}", e);
            shutdown_manager.shutdown().await?;
            return Err(e);
        }
    };

    shutdown_signal.await;
    info!("Shutdown signal received, shutting down...");

    // Shutdown
    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

// =============================== INITIALIZATION ================================== //

async fn init(
    console_version: &str,
    options: &AppOptions,
    shutdown_tx: &broadcast::Sender<()>,
    shutdown_manager: &mut ShutdownManager,
) -> Result<Arc<AppState>, ConsoleError> {
    let (app_state, parts) = AppState::init(options).await?;
    let app_state = Arc::new(app_state);
    shutdown_manager.with_app_state(app_state.clone())?;

    let Parts {
        synchronizer,
        push_control,
    } = parts;

    init_synchronizer(synchronizer, shutdown_manager, shutdown_tx.subscribe())?;

    if options.enable_push {
        init_push_worker(
            console_version,
            options,
            app_state.sync.clone(),
            push_control,
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    if options.enable_poller {
        init_poller_worker(
            options.poller.clone(),
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    if options.enable_console_server {
        init_console_server(
            options,
            app_state.clone(),
            shutdown_manager,
            shutdown_tx.subscribe(),
        )
        .await?;
    }

    Ok(app_state)
}

fn init_synchronizer(
    synchronizer: Synchronizer,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing synchronizer...");

    let handle = tokio::spawn(async move {
        synchronizer
            .run(Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }))
            .await;
    });

    shutdown_manager.with_synchronizer_handle(handle)
}

fn init_push_worker(
    console_version: &str,
    options: &AppOptions,
    sync: SyncHandle,
    control: PushControl,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing push worker...");

    let url = build_progress_url(&options.backend_base_url)?;
    let connector = WsConnector::new(format!("hugodeck/{}", console_version));
    let push_options = options.push.clone();

    let handle = tokio::spawn(async move {
        push::run(
            &push_options,
            &connector,
            url,
            sync,
            control,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_push_worker_handle(handle)
}

fn init_poller_worker(
    options: poller::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing poller worker...");

    let source: Arc<dyn StatusSource> = app_state.http_client.clone();
    let sync = app_state.sync.clone();

    let handle = tokio::spawn(async move {
        poller::run(
            &options,
            source.as_ref(),
            &sync,
            tokio::time::sleep,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_worker_handle(handle)
}

async fn init_console_server(
    options: &AppOptions,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing console server...");

    let server_state = ServerState::new(
        app_state.sync.clone(),
        app_state.push.clone(),
        app_state.dispatcher.clone(),
    );

    let handle = serve(&options.server, Arc::new(server_state), async move {
        let _ = shutdown_rx.recv().await;
    })
    .await?;

    shutdown_manager.with_console_server_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    app_state: Option<Arc<AppState>>,
    console_server_handle: Option<JoinHandle<Result<(), ConsoleError>>>,
    poller_worker_handle: Option<JoinHandle<()>>,
    push_worker_handle: Option<JoinHandle<()>>,
    synchronizer_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            app_state: None,
            console_server_handle: None,
            poller_worker_handle: None,
            push_worker_handle: None,
            synchronizer_handle: None,
        }
    }

    pub fn with_app_state(&mut self, state: Arc<AppState>) -> Result<(), ConsoleError> {
        if self.app_state.is_some() {
            return Err(ConsoleError::ShutdownError("app_state already set".to_string()));
        }
        self.app_state = Some(state);
        Ok(())
    }

    pub fn with_synchronizer_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.synchronizer_handle.is_some() {
            return Err(ConsoleError::ShutdownError(
                "synchronizer_handle already set".to_string(),
            ));
        }
        self.synchronizer_handle = Some(handle);
        Ok(())
    }

    pub fn with_push_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.push_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError("push_handle already set".to_string()));
        }
        self.push_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_poller_worker_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.poller_worker_handle.is_some() {
            return Err(ConsoleError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_worker_handle = Some(handle);
        Ok(())
    }

    pub fn with_console_server_handle(
        &mut self,
        handle: JoinHandle<Result<(), ConsoleError>>,
    ) -> Result<(), ConsoleError> {
        if self.console_server_handle.is_some() {
            return Err(ConsoleError::ShutdownError("server_handle already set".to_string()));
        }
        self.console_server_handle = Some(handle);
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConsoleError> {
        info!("Shutting down deployment console...");

        // 1. Console server
        if let Some(handle) = self.console_server_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))??;
        }

        // 2. Poller worker
        if let Some(handle) = self.poller_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 3. Push worker
        if let Some(handle) = self.push_worker_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 4. App state
        if let Some(app_state) = self.app_state.take() {
            app_state.shutdown().await?;
        }

        // 5. Synchronizer
        if let Some(handle) = self.synchronizer_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
