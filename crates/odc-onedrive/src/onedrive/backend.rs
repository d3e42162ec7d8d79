//! The backend seam.
//!
//! [`Backend`] lists every call the console makes against the proxy.
//! [`HttpBackend`] is the real implementation; tests substitute a mock.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::auth;
use crate::onedrive::delta::ConsoleDelta;
use crate::onedrive::error::ConsoleResult;
use crate::onedrive::files::ConsoleFiles;
use crate::onedrive::permissions::ConsolePermissions;
use crate::onedrive::push::{self, PushSubscription};
use crate::onedrive::subscriptions::ConsoleSubscriptions;
use crate::onedrive::types::{ConsoleConfig, FileRecord, UserRecord};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identity-provider login URL.
    async fn login_url(&self) -> ConsoleResult<String>;

    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> ConsoleResult<String>;

    async fn list_files(&self, token: &str) -> ConsoleResult<Vec<FileRecord>>;

    /// Users with access to the item identified by `param=id`.
    async fn list_users(
        &self,
        token: &str,
        param: &str,
        id: &str,
    ) -> ConsoleResult<Vec<UserRecord>>;

    /// Changed records for a resource, most recent first.
    async fn delta(&self, token: &str, resource: &str) -> ConsoleResult<Vec<FileRecord>>;

    /// Create a realtime subscription; returns its ID.
    async fn subscribe(&self, token: &str, file_id: &str) -> ConsoleResult<String>;

    async fn download_file(&self, token: &str, file_id: &str) -> ConsoleResult<Vec<u8>>;

    /// Open the push channel.
    fn open_push(&self, token: &str) -> PushSubscription;
}

/// [`Backend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: BackendClient,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig) -> ConsoleResult<Self> {
        Ok(Self {
            client: BackendClient::new(config)?,
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login_url(&self) -> ConsoleResult<String> {
        auth::login_url(&self.client).await
    }

    async fn exchange_code(&self, code: &str) -> ConsoleResult<String> {
        auth::exchange_code(&self.client, code).await
    }

    async fn list_files(&self, token: &str) -> ConsoleResult<Vec<FileRecord>> {
        ConsoleFiles::new(&self.client, token).list().await
    }

    async fn list_users(
        &self,
        token: &str,
        param: &str,
        id: &str,
    ) -> ConsoleResult<Vec<UserRecord>> {
        ConsolePermissions::new(&self.client, token)
            .list_users(param, id)
            .await
    }

    async fn delta(&self, token: &str, resource: &str) -> ConsoleResult<Vec<FileRecord>> {
        ConsoleDelta::new(&self.client, token).changes(resource).await
    }

    async fn subscribe(&self, token: &str, file_id: &str) -> ConsoleResult<String> {
        ConsoleSubscriptions::new(&self.client, token)
            .create(file_id)
            .await
    }

    async fn download_file(&self, token: &str, file_id: &str) -> ConsoleResult<Vec<u8>> {
        ConsoleFiles::new(&self.client, token).download(file_id).await
    }

    fn open_push(&self, token: &str) -> PushSubscription {
        push::open(self.client.clone(), Some(token.to_string()))
    }
}
