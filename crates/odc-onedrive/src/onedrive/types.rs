//! Shared types for the OneDrive Console client.
//!
//! Models cover configuration, the backend's auth responses, file records,
//! permissions and the users extracted from them, subscriptions, push
//! notifications and the toast notifications shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════
//  Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "ODC_BASE_URL";
/// Environment variable selecting the client variant.
pub const ENV_VARIANT: &str = "ODC_VARIANT";
/// Environment variable pointing at a session file.
pub const ENV_SESSION_FILE: &str = "ODC_SESSION_FILE";
/// Environment variable for the local OAuth redirect listener address.
pub const ENV_CALLBACK_ADDR: &str = "ODC_CALLBACK_ADDR";

/// Configuration for a console connected to the backend proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Backend base URL.  Default: `http://localhost:8000`.
    pub base_url: String,
    /// Which flavour of the client to run.
    pub variant: ClientVariant,
    /// Plain-text session file.  `None` keeps the token in memory only.
    pub session_file: Option<PathBuf>,
    /// Address of the local listener serving `/` and `/callback`.
    pub callback_addr: SocketAddr,
    /// Open the login URL in the system browser.
    pub open_browser: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            variant: ClientVariant::FileSubscriptions,
            session_file: None,
            callback_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            open_browser: true,
        }
    }
}

impl ConsoleConfig {
    /// Defaults overlaid with whatever `ODC_*` variables are set.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(variant) = lookup(ENV_VARIANT).filter(|v| !v.is_empty()) {
            config.variant = variant.parse()?;
        }
        if let Some(path) = lookup(ENV_SESSION_FILE).filter(|v| !v.is_empty()) {
            config.session_file = Some(PathBuf::from(path));
        }
        if let Some(addr) = lookup(ENV_CALLBACK_ADDR).filter(|v| !v.is_empty()) {
            config.callback_addr = addr
                .parse()
                .map_err(|e| format!("invalid {}: {}", ENV_CALLBACK_ADDR, e))?;
        }
        Ok(config)
    }
}

/// The two flavours of the client.
///
/// `FileSubscriptions` scopes queries by file ID and offers the
/// subscription tab; `ResourceDelta` scopes them by resource ID and relies on
/// push-triggered delta queries instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientVariant {
    FileSubscriptions,
    ResourceDelta,
}

impl ClientVariant {
    /// Tabs shown in the main view, in order.
    pub fn tabs(&self) -> &'static [Tab] {
        match self {
            Self::FileSubscriptions => &[Tab::Files, Tab::Users, Tab::Subscribe],
            Self::ResourceDelta => &[Tab::Files, Tab::Users],
        }
    }

    /// Query parameter naming the selected identifier on list-users.
    pub fn identifier_param(&self) -> &'static str {
        match self {
            Self::FileSubscriptions => "fileId",
            Self::ResourceDelta => "resource",
        }
    }

    /// Label of the identifier input field.
    pub fn identifier_label(&self) -> &'static str {
        match self {
            Self::FileSubscriptions => "File ID",
            Self::ResourceDelta => "Resource ID",
        }
    }

    pub fn supports_subscriptions(&self) -> bool {
        matches!(self, Self::FileSubscriptions)
    }
}

impl FromStr for ClientVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "file" | "file-subscriptions" => Ok(Self::FileSubscriptions),
            "b" | "resource" | "resource-delta" => Ok(Self::ResourceDelta),
            other => Err(format!("unknown client variant: {}", other)),
        }
    }
}

impl fmt::Display for ClientVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileSubscriptions => write!(f, "file-subscriptions"),
            Self::ResourceDelta => write!(f, "resource-delta"),
        }
    }
}

/// A tab of the main view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tab {
    Files,
    Users,
    Subscribe,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Files => "List Files",
            Self::Users => "User Details",
            Self::Subscribe => "Subscribe to File",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Auth
// ═══════════════════════════════════════════════════════════════════════

/// Response of `GET /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

/// Response of `GET /auth/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Files
// ═══════════════════════════════════════════════════════════════════════

/// A file or folder as returned by the listing and delta endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(
        default,
        rename = "@microsoft.graph.downloadUrl",
        alias = "downloadUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub download_url: Option<String>,
}

impl FileRecord {
    /// Folders and empty files report a zero (or missing) size.
    pub fn has_content(&self) -> bool {
        self.size.unwrap_or(0) > 0
    }
}

/// `{ "value": [...] }` envelope used by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Bytes fetched through the direct download endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub file_id: String,
    pub bytes: Vec<u8>,
}

// ═══════════════════════════════════════════════════════════════════════
//  Permissions
// ═══════════════════════════════════════════════════════════════════════

/// A set of identities (user, application, device).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySet {
    pub application: Option<Identity>,
    pub device: Option<Identity>,
    pub user: Option<Identity>,
}

/// A single identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Option<String>,
    pub display_name: Option<String>,
}

/// A permission entry on a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub granted_to: Option<IdentitySet>,
}

impl Permission {
    /// The user principal this permission grants access to, if any.
    pub fn user(&self) -> Option<UserRecord> {
        let user = self.granted_to.as_ref()?.user.as_ref()?;
        Some(UserRecord {
            id: user.id.clone().unwrap_or_default(),
            display_name: user.display_name.clone().unwrap_or_default(),
        })
    }
}

/// A user with access to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub display_name: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  Subscriptions & push
// ═══════════════════════════════════════════════════════════════════════

/// Body of `POST /realtime/subscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    pub file_id: String,
}

/// Response of `POST /realtime/subscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: String,
}

/// A change notification received on the push channel.
///
/// The backend sends either a readable message or the identifier of the
/// resource that changed; both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PushNotification {
    Message { message: String },
    Resource { resource: String },
}

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient notification shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, text)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
