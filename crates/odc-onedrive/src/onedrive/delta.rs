//! Delta (changed-file) queries scoped to a resource.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::ConsoleResult;
use crate::onedrive::types::{FileRecord, ValueEnvelope};
use log::debug;

pub const DELTA_PATH: &str = "onedrive/delta";

/// Delta operations.
pub struct ConsoleDelta<'a> {
    client: &'a BackendClient,
    token: &'a str,
}

impl<'a> ConsoleDelta<'a> {
    pub fn new(client: &'a BackendClient, token: &'a str) -> Self {
        Self { client, token }
    }

    /// Changed records for `resource`, most recent first.
    pub async fn changes(&self, resource: &str) -> ConsoleResult<Vec<FileRecord>> {
        let resp: ValueEnvelope<FileRecord> = self
            .client
            .get_json(DELTA_PATH, &[("resource", resource)], Some(self.token))
            .await?;
        debug!("Delta for {}: {} records", resource, resp.value.len());
        Ok(resp.value)
    }
}

/// The most recently changed record of a delta page.
pub fn latest_change(records: &[FileRecord]) -> Option<&FileRecord> {
    records.first()
}
