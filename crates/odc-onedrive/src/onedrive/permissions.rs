//! Users with access to a file, derived from its permission entries.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::ConsoleResult;
use crate::onedrive::types::{Permission, UserRecord, ValueEnvelope};
use log::debug;

pub const LIST_USERS_PATH: &str = "onedrive/list-users";

/// Permission operations.
pub struct ConsolePermissions<'a> {
    client: &'a BackendClient,
    token: &'a str,
}

impl<'a> ConsolePermissions<'a> {
    pub fn new(client: &'a BackendClient, token: &'a str) -> Self {
        Self { client, token }
    }

    /// List the raw permission entries, scoped by `param=id`.
    pub async fn list(&self, param: &str, id: &str) -> ConsoleResult<Vec<Permission>> {
        let resp: ValueEnvelope<Permission> = self
            .client
            .get_json(LIST_USERS_PATH, &[(param, id)], Some(self.token))
            .await?;
        debug!("{} {} has {} permissions", param, id, resp.value.len());
        Ok(resp.value)
    }

    /// List the users the entries grant access to.
    pub async fn list_users(&self, param: &str, id: &str) -> ConsoleResult<Vec<UserRecord>> {
        let perms = self.list(param, id).await?;
        Ok(users_from_permissions(&perms))
    }
}

/// Extract the user principal of each permission entry, in order.
///
/// Entries that grant access to something other than a user (sharing
/// links, applications) carry no `grantedTo.user` and are skipped.
pub fn users_from_permissions(perms: &[Permission]) -> Vec<UserRecord> {
    perms
        .iter()
        .filter_map(|p| {
            let user = p.user();
            if user.is_none() {
                debug!("Permission {} has no user principal", p.id);
            }
            user
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_from_permissions() {
        let json_str = r#"{
            "value": [
                {"id": "p1", "roles": ["owner"], "grantedTo": {"user": {"id": "u1", "displayName": "Alice"}}},
                {"id": "p2", "roles": ["read"], "link": {"type": "view"}},
                {"id": "p3", "roles": ["write"], "grantedTo": {"user": {"id": "u2", "displayName": "Bob"}}}
            ]
        }"#;
        let resp: ValueEnvelope<Permission> = serde_json::from_str(json_str).unwrap();
        let users = users_from_permissions(&resp.value);
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].display_name, "Alice");
        assert_eq!(users[1].id, "u2");
    }
}
