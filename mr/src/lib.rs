//! moorrest - authenticated REST client for mooR servers
//!
//! The crate is layered leaf-first:
//!
//! - [`literal`] encodes JSON-shaped values as MOO literals
//! - [`reference`] turns CURIEs such as `oid:42` into object expressions
//! - [`error`] maps HTTP failures onto [`MoorError`]
//! - [`session`] holds the cached auth token behind one async lock
//! - [`client`] issues every request and applies the single 401 retry
//! - [`api`] adds one typed method per REST endpoint on [`MoorClient`]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod literal;
pub mod reference;
pub mod session;
pub mod transport;

pub use api::{DEFAULT_VERB_ARGS, VerbSpec, normalize_expression};
pub use client::{ApiRequest, DisconnectOutcome, MoorClient};
pub use config::ClientConfig;
pub use error::{ErrorKind, MoorError};
pub use literal::{LiteralValue, Number, encode_json, escape_string};
pub use reference::{Reference, extract_obj_curie, resolve};
pub use session::{AuthSession, AuthToken, ConnectOutcome, Credentials, SessionState};
pub use transport::{AUTH_HEADER, ReqwestTransport, Transport};
