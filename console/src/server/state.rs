//! Server state

use std::sync::Arc;

use crate::deploy::dispatcher::Dispatcher;
use crate::http::actions::DeployBackend;
use crate::sync::synchronizer::SyncHandle;
use crate::workers::push::PushHandle;

/// Server state shared across handlers
pub struct ServerState {
    pub sync: SyncHandle,
    pub push: PushHandle,
    pub dispatcher: Arc<Dispatcher<dyn DeployBackend>>,
}

impl ServerState {
    pub fn new(
        sync: SyncHandle,
        push: PushHandle,
        dispatcher: Arc<Dispatcher<dyn DeployBackend>>,
    ) -> Self {
        Self {
            sync,
            push,
            dispatcher,
        }
    }
}
