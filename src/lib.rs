//! # onedrive-console
//!
//! Terminal front end for the OneDrive Console backend.  The client core
//! lives in the `odc-onedrive` crate; this crate adds the command line,
//! logging, the local OAuth redirect listener, routing, the view model
//! and the interactive event loop.

pub mod app;
pub mod callback_server;
pub mod cli;
pub mod error;
pub mod logging;
pub mod render;
pub mod router;
pub mod view;

pub use error::{AppError, AppResult};
