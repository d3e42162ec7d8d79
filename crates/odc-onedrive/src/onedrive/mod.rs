//! # odc-onedrive – OneDrive Console client core
//!
//! Client for the OneDrive Console backend proxy.  The backend performs
//! the OAuth token exchange, the Microsoft Graph calls and the subscription
//! fan-out; this crate consumes its REST and Server-Sent-Events contracts
//! and holds the client-side state.
//!
//! ## Capabilities
//!
//! - **Login** – fetch the identity-provider login URL and exchange the
//!   redirect's authorization code for a bearer token.
//! - **Files** – list the drive's files and download a file by ID.
//! - **Permissions** – list the users a file (or resource) is shared with.
//! - **Delta** – fetch the most recent changes scoped to a resource.
//! - **Subscriptions** – register a realtime subscription for a file.
//! - **Push channel** – a cancellable stream of typed change notifications
//!   read from the backend's SSE endpoint.
//! - **Session** – an explicit authentication context backed by a
//!   pluggable session store.
//! - **Console** – the state machine and operation controller the
//!   presentation layer drives.

pub mod types;
pub mod error;
pub mod api_client;
pub mod auth;
pub mod files;
pub mod permissions;
pub mod delta;
pub mod subscriptions;
pub mod push;
pub mod backend;
pub mod session;
pub mod state;
pub mod service;

// Re-exports
pub use backend::{Backend, HttpBackend};
pub use error::{ConsoleError, ConsoleErrorCode, ConsoleResult};
pub use push::PushSubscription;
pub use service::Console;
pub use session::{AuthContext, FileSessionStore, MemorySessionStore, SessionStore};
pub use state::{ConsoleState, SessionPhase};
pub use types::*;
