//! ToolContext - execution context shared by every tool call

use std::sync::Arc;

use moorrest::MoorClient;
use tracing::debug;

/// Everything a tool needs to talk to the server
#[derive(Clone)]
pub struct ToolContext {
    /// Shared REST client; its session is shared by concurrent calls
    pub client: Arc<MoorClient>,
}

impl ToolContext {
    pub fn new(client: Arc<MoorClient>) -> Self {
        debug!("ToolContext::new: called");
        Self { client }
    }
}
