//! Realtime subscriptions for file change notifications.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::ConsoleResult;
use crate::onedrive::types::{SubscriptionRequest, SubscriptionResponse};
use log::info;

pub const SUBSCRIBE_PATH: &str = "realtime/subscribe";

/// Subscription operations.
pub struct ConsoleSubscriptions<'a> {
    client: &'a BackendClient,
    token: &'a str,
}

impl<'a> ConsoleSubscriptions<'a> {
    pub fn new(client: &'a BackendClient, token: &'a str) -> Self {
        Self { client, token }
    }

    /// Subscribe to changes of a file.  Returns the subscription ID.
    pub async fn create(&self, file_id: &str) -> ConsoleResult<String> {
        let body = SubscriptionRequest {
            file_id: file_id.to_string(),
        };
        let resp: SubscriptionResponse = self
            .client
            .post_json(SUBSCRIBE_PATH, &body, Some(self.token))
            .await?;
        info!("Created subscription {} for file {}", resp.id, file_id);
        Ok(resp.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_response_serde() {
        let resp: SubscriptionResponse =
            serde_json::from_str(r#"{"id":"sub-1","resource":"/me/drive/root"}"#).unwrap();
        assert_eq!(resp.id, "sub-1");
    }
}
