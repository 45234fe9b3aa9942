//! Built-in mooR tools

mod auth;
mod eval;
mod history;
mod objects;
mod properties;
mod sysobjs;
mod verbs;

pub use auth::{ConnectAuthTool, DisconnectAuthTool};
pub use eval::EvalExprTool;
pub use history::{DismissPresentationTool, GetHistoryTool, ListPresentationsTool};
pub use objects::{CreateObjectTool, MoveObjectTool, RecycleObjectTool, ResolveObjectTool};
pub use properties::{GetPropertyTool, ListPropertiesTool, SetPropertyTool};
pub use sysobjs::ListSysobjsTool;
pub use verbs::{EnsureVerbTool, GetVerbTool, InvokeVerbTool, ListVerbsTool, ProgramVerbTool};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use moorrest::{ClientConfig, MoorClient};

    use crate::tools::ToolContext;

    /// Context whose client points at a port nothing listens on
    ///
    /// Good for checking argument validation and the no-credentials path,
    /// which both fail before any request is sent.
    pub fn offline_ctx() -> ToolContext {
        let client = MoorClient::new(ClientConfig::new("http://127.0.0.1:1")).unwrap();
        ToolContext::new(Arc::new(client))
    }
}
