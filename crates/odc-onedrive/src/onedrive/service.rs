//! High-level console – the single facade driven by the presentation
//! layer.
//!
//! Owns the backend, the session store, the authentication context, the
//! UI state and the push channel.  Every operation is one user- or
//! event-triggered action; failures are logged here, at the call site,
//! and returned so the caller can decide whether to say anything.

use crate::onedrive::backend::Backend;
use crate::onedrive::delta::latest_change;
use crate::onedrive::error::{ConsoleError, ConsoleResult};
use crate::onedrive::push::PushSubscription;
use crate::onedrive::session::{AuthContext, SessionStore};
use crate::onedrive::state::{ConsoleState, SessionPhase};
use crate::onedrive::types::{
    ClientVariant, DownloadedFile, FileRecord, Notification, PushNotification,
};
use log::{debug, error, info, warn};

/// Operation controller for one user session.
pub struct Console<B: Backend, S: SessionStore> {
    backend: B,
    store: S,
    auth: AuthContext,
    state: ConsoleState,
    push: Option<PushSubscription>,
}

impl<B: Backend, S: SessionStore> Console<B, S> {
    /// Build a console, picking up a token already held by `store`.
    pub fn new(backend: B, store: S, variant: ClientVariant) -> ConsoleResult<Self> {
        let auth = AuthContext::from_store(&store)?;
        let state = ConsoleState::new(variant, auth.is_authenticated());
        Ok(Self {
            backend,
            store,
            auth,
            state,
            push: None,
        })
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn is_push_open(&self) -> bool {
        self.push.is_some()
    }

    /// Open the push channel if a session is already held.
    pub fn start(&mut self) {
        self.open_push();
    }

    // ─── Session lifecycle ───────────────────────────────────────────

    /// Ask the backend for the login URL and enter `Redirected`.
    pub async fn login(&mut self) -> ConsoleResult<String> {
        if self.auth.is_authenticated() {
            warn!("Login requested while already logged in");
            return Err(ConsoleError::invalid("Already logged in"));
        }
        match self.backend.login_url().await {
            Ok(url) => {
                info!("Redirecting to identity provider");
                self.state.set_phase(SessionPhase::Redirected {
                    login_url: url.clone(),
                });
                Ok(url)
            }
            Err(e) => {
                error!("Error during login: {}", e);
                Err(e)
            }
        }
    }

    /// Finish the OAuth redirect: exchange `code`, keep the token, open
    /// the push channel.
    pub async fn complete_login(&mut self, code: &str) -> ConsoleResult<()> {
        if code.trim().is_empty() {
            error!("Callback carried no authorization code");
            return Err(ConsoleError::invalid("Callback carried no authorization code"));
        }

        let token = match self.backend.exchange_code(code).await {
            Ok(t) => t,
            Err(e) => {
                error!("Error fetching access token: {}", e);
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&token) {
            error!("Error storing access token: {}", e);
            return Err(e);
        }

        self.close_push();
        self.auth.set(token);
        self.state.set_phase(SessionPhase::LoggedIn);
        info!("Logged in");
        self.open_push();
        Ok(())
    }

    /// Drop the session: token, lists, selection and push channel.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            error!("Error clearing session store: {}", e);
        }
        self.auth.clear();
        self.close_push();
        self.state.reset_session();
        info!("Logged out");
    }

    // ─── Queries ─────────────────────────────────────────────────────

    /// Replace the file list with the backend's.  Returns the count.
    pub async fn list_files(&mut self) -> ConsoleResult<usize> {
        let token = self.token_for("listing files")?;
        match self.backend.list_files(&token).await {
            Ok(files) => {
                let count = files.len();
                self.state.replace_files(files);
                Ok(count)
            }
            Err(e) => {
                error!("Error listing files: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the user list for the selected identifier.
    pub async fn list_users(&mut self) -> ConsoleResult<usize> {
        let token = self.token_for("listing users")?;
        let id = self.selected_for("listing users")?;
        let param = self.state.variant().identifier_param();

        match self.backend.list_users(&token, param, &id).await {
            Ok(users) => {
                let count = users.len();
                self.state.replace_users(users);
                Ok(count)
            }
            Err(e) => {
                error!("Error listing users: {}", e);
                Err(e)
            }
        }
    }

    /// Changed records for `resource`, most recent first.
    pub async fn delta(&mut self, resource: &str) -> ConsoleResult<Vec<FileRecord>> {
        let token = self.token_for("fetching changes")?;
        if resource.trim().is_empty() {
            error!("Error fetching changes: no resource given");
            return Err(ConsoleError::missing_identifier("Resource ID"));
        }
        self.backend.delta(&token, resource).await.map_err(|e| {
            error!("Error fetching delta for {}: {}", resource, e);
            e
        })
    }

    /// Download a file by ID, or the selected identifier when `None`.
    pub async fn download_file(&mut self, file_id: Option<&str>) -> ConsoleResult<DownloadedFile> {
        let token = self.token_for("downloading file")?;
        let file_id = match file_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => self.selected_for("downloading file")?,
        };

        match self.backend.download_file(&token, &file_id).await {
            Ok(bytes) => {
                let file = DownloadedFile { file_id, bytes };
                self.state.set_downloaded(file.clone());
                Ok(file)
            }
            Err(e) => {
                error!("Error downloading file: {}", e);
                Err(e)
            }
        }
    }

    // ─── Subscriptions ───────────────────────────────────────────────

    /// Subscribe to the selected file.  The outcome is always surfaced as
    /// a notification.
    pub async fn create_subscription(&mut self) -> ConsoleResult<String> {
        let result = self.try_create_subscription().await;
        match &result {
            Ok(id) => {
                self.state
                    .notify(Notification::success(format!("Subscription created: {}", id)));
            }
            Err(e) => {
                error!("Error creating subscription: {}", e);
                self.state
                    .notify(Notification::error("Error creating subscription"));
            }
        }
        result
    }

    async fn try_create_subscription(&mut self) -> ConsoleResult<String> {
        if !self.state.variant().supports_subscriptions() {
            return Err(ConsoleError::unavailable(
                "Subscriptions are not offered by this client",
            ));
        }
        let token = self.auth.require()?.to_string();
        let id = self.state.selected_id().to_string();
        if id.trim().is_empty() {
            return Err(ConsoleError::missing_identifier(
                self.state.variant().identifier_label(),
            ));
        }
        self.backend.subscribe(&token, &id).await
    }

    // ─── Push channel ────────────────────────────────────────────────

    /// Wait for the next push notification.  Pending forever while no
    /// channel is open.  The channel reconnects by itself; it only ends
    /// when the backend rejects it.
    pub async fn next_push(&mut self) -> PushNotification {
        loop {
            match self.push.as_mut() {
                Some(sub) => match sub.recv().await {
                    Some(n) => return n,
                    None => {
                        warn!("Push channel ended by the backend");
                        self.push = None;
                    }
                },
                None => return std::future::pending().await,
            }
        }
    }

    /// React to a push notification.
    pub async fn handle_push(&mut self, notification: PushNotification) {
        let Some(token) = self.auth.token().map(str::to_string) else {
            debug!("Ignoring push notification while logged out");
            return;
        };

        match notification {
            PushNotification::Message { message } => {
                self.state
                    .notify(Notification::info(format!("File change detected: {}", message)));
            }
            PushNotification::Resource { resource } => {
                match self.backend.delta(&token, &resource).await {
                    Ok(records) => match latest_change(&records) {
                        Some(file) => {
                            self.state
                                .notify(Notification::info(format!("File updated: {}", file.name)));
                        }
                        None => warn!("Delta for {} returned no changes", resource),
                    },
                    Err(e) => {
                        error!("Error fetching delta for {}: {}", resource, e);
                        self.state
                            .notify(Notification::error("Error fetching file changes"));
                    }
                }
            }
        }
    }

    // ─── UI state ────────────────────────────────────────────────────

    pub fn set_selected_id(&mut self, id: impl Into<String>) {
        self.state.set_selected_id(id);
    }

    pub fn select_tab(&mut self, index: usize) -> ConsoleResult<()> {
        self.state.select_tab(index).map_err(|e| {
            warn!("Error selecting tab: {}", e);
            e
        })
    }

    /// Take every pending notification, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        self.state.drain_notifications()
    }

    // ─── Internal ────────────────────────────────────────────────────

    fn token_for(&self, action: &str) -> ConsoleResult<String> {
        self.auth.require().map(str::to_string).map_err(|e| {
            error!("Error {}: {}", action, e);
            e
        })
    }

    /// The selected identifier as entered; blank counts as missing.
    fn selected_for(&self, action: &str) -> ConsoleResult<String> {
        let id = self.state.selected_id();
        if id.trim().is_empty() {
            let e = ConsoleError::missing_identifier(self.state.variant().identifier_label());
            error!("Error {}: {}", action, e);
            return Err(e);
        }
        Ok(id.to_string())
    }

    fn open_push(&mut self) {
        if self.push.is_some() {
            return;
        }
        if let Some(token) = self.auth.token() {
            self.push = Some(self.backend.open_push(token));
            info!("Push channel requested");
        }
    }

    fn close_push(&mut self) {
        if let Some(mut sub) = self.push.take() {
            sub.close();
            info!("Push channel released");
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
