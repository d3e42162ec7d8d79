//! Local listener for the OAuth redirect.
//!
//! The identity provider sends the browser back to `/callback?code=...` on
//! this listener.  Codes are forwarded to the event loop over a channel;
//! the browser gets a short page telling the user to return to the
//! terminal.

use crate::router::Route;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::Html,
    Router,
};
use log::{error, info, warn};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const LOGGING_IN_PAGE: &str = "<!doctype html><html><head><title>OneDrive Console</title>\
<meta http-equiv=\"refresh\" content=\"2;url=/\"></head>\
<body><p>Logging in...</p></body></html>";

const MAIN_PAGE: &str = "<!doctype html><html><head><title>OneDrive Console</title></head>\
<body><h1>OneDrive Integration</h1><p>You can return to the terminal.</p></body></html>";

const NOT_FOUND_PAGE: &str = "<!doctype html><html><head><title>OneDrive Console</title></head>\
<body><p>Not found</p></body></html>";

/// A running redirect listener.  Stops when dropped.
pub struct CallbackServer {
    addr: SocketAddr,
    codes: mpsc::Receiver<String>,
    task: JoinHandle<()>,
}

impl CallbackServer {
    /// Bind `addr` and start serving.
    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (tx, codes) = mpsc::channel(8);

        let app = create_router(tx);
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Callback listener stopped: {}", e);
            }
        });
        info!("Callback listener on http://{}", addr);

        Ok(Self { addr, codes, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Next authorization code delivered to `/callback`.
    pub async fn next_code(&mut self) -> Option<String> {
        self.codes.recv().await
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn create_router(codes: mpsc::Sender<String>) -> Router {
    Router::new().fallback(dispatch).with_state(codes)
}

async fn dispatch(
    State(codes): State<mpsc::Sender<String>>,
    uri: Uri,
) -> (StatusCode, Html<&'static str>) {
    match Route::parse(&uri.to_string()) {
        Ok(Route::Main) => (StatusCode::OK, Html(MAIN_PAGE)),
        Ok(Route::Callback { code: Some(code) }) => {
            if codes.send(code).await.is_err() {
                warn!("Authorization code received after the console closed");
            }
            (StatusCode::OK, Html(LOGGING_IN_PAGE))
        }
        Ok(Route::Callback { code: None }) => {
            warn!("Callback received without an authorization code");
            (StatusCode::OK, Html(LOGGING_IN_PAGE))
        }
        Ok(Route::NotFound(_)) | Err(_) => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)),
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
