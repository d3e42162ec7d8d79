//! File listing and direct download.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::ConsoleResult;
use crate::onedrive::types::{FileRecord, ValueEnvelope};
use log::{debug, info};

pub const LIST_FILES_PATH: &str = "onedrive/list-files";
pub const DOWNLOAD_FILE_PATH: &str = "onedrive/download-file";

/// File operations.
pub struct ConsoleFiles<'a> {
    client: &'a BackendClient,
    token: &'a str,
}

impl<'a> ConsoleFiles<'a> {
    pub fn new(client: &'a BackendClient, token: &'a str) -> Self {
        Self { client, token }
    }

    /// List the drive's files in server order.
    pub async fn list(&self) -> ConsoleResult<Vec<FileRecord>> {
        let resp: ValueEnvelope<FileRecord> = self
            .client
            .get_json(LIST_FILES_PATH, &[], Some(self.token))
            .await?;
        debug!("Listed {} files", resp.value.len());
        Ok(resp.value)
    }

    /// Download a file's content by ID.
    pub async fn download(&self, file_id: &str) -> ConsoleResult<Vec<u8>> {
        let bytes = self
            .client
            .get_bytes(DOWNLOAD_FILE_PATH, &[("fileId", file_id)], Some(self.token))
            .await?;
        info!("Downloaded file {} ({} bytes)", file_id, bytes.len());
        Ok(bytes)
    }
}
