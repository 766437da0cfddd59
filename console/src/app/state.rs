//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::dispatcher::Dispatcher;
use crate::errors::ConsoleError;
use crate::http::actions::DeployBackend;
use crate::http::client::HttpClient;
use crate::journal::store::Journal;
use crate::render::terminal::TerminalRenderer;
use crate::render::Renderer;
use crate::sync::synchronizer::{SyncHandle, Synchronizer};
use crate::workers::push::{self, PushControl, PushHandle};

/// Main application state
pub struct AppState {
    /// HTTP client for backend communication
    pub http_client: Arc<HttpClient>,

    /// Handle to the synchronizer owning the board and journal
    pub sync: SyncHandle,

    /// Push channel control
    pub push: PushHandle,

    /// Operator action dispatch
    pub dispatcher: Arc<Dispatcher<dyn DeployBackend>>,
}

/// Pieces of the state that are moved into their own tasks
pub struct Parts {
    pub synchronizer: Synchronizer,
    pub push_control: PushControl,
}

impl AppState {
    /// Initialize application state
    pub async fn init(options: &AppOptions) -> Result<(Self, Parts), ConsoleError> {
        info!("Initializing application state...");

        let layout = &options.storage.layout;
        layout.setup().await?;

        let http_client = Arc::new(HttpClient::new(
            &options.backend_base_url,
            options.request_timeout,
        )?);

        let journal = Journal::load(layout.journal_file(), options.storage.log_retention).await;
        info!("Journal loaded with {} entries", journal.entries().len());

        let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();
        if options.render_terminal {
            renderers.push(Box::new(TerminalRenderer::stdout()));
        }
        let (synchronizer, sync) = Synchronizer::new(journal, renderers);

        let (push, push_control) = push::control();

        let backend: Arc<dyn DeployBackend> = http_client.clone();
        let dispatcher = Arc::new(Dispatcher::new(backend, sync.clone()));

        let state = Self {
            http_client,
            sync,
            push,
            dispatcher,
        };
        let parts = Parts {
            synchronizer,
            push_control,
        };
        Ok((state, parts))
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> Result<(), ConsoleError> {
        info!("Shutting down application state...");
        self.push.disconnect();
        Ok(())
    }
}
