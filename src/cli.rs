//! Command-line arguments.
//!
//! Settings are layered: built-in defaults, then `.env`, then `ODC_*`
//! environment variables, then the flags below.

use clap::{Parser, Subcommand};
use odc_onedrive::{ClientVariant, ConsoleConfig};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "odc",
    version,
    about = "Browse OneDrive files, sharing and change notifications through the OneDrive Console backend"
)]
pub struct Cli {
    /// Backend base URL [env: ODC_BASE_URL] [default: http://localhost:8000]
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Client variant: `file-subscriptions` (a) or `resource-delta` (b) [env: ODC_VARIANT]
    #[arg(long, global = true)]
    pub variant: Option<ClientVariant>,

    /// Keep the session token in this file instead of in memory [env: ODC_SESSION_FILE]
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Address of the local OAuth redirect listener [env: ODC_CALLBACK_ADDR] [default: 127.0.0.1:3000]
    #[arg(long, global = true)]
    pub callback_addr: Option<SocketAddr>,

    /// Print the login URL instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive console (default)
    Interactive,
    /// Print the identity-provider login URL
    Login,
    /// Complete login from a redirect URL or a bare authorization code
    Callback { input: String },
    /// Forget the stored session
    Logout,
    /// List the drive's files
    Files,
    /// List users a file (or resource) is shared with
    Users { id: String },
    /// Subscribe to change notifications for a file
    Subscribe { id: String },
    /// Show the most recent change for a resource
    Delta { resource: String },
    /// Download a file by ID
    Download { file_id: String, out: PathBuf },
    /// Print push notifications until interrupted
    Watch,
}

impl Cli {
    /// Overlay flags onto the environment-derived configuration.
    pub fn config(&self) -> Result<ConsoleConfig, String> {
        let mut config = ConsoleConfig::from_env()?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ConsoleConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(path) = &self.session_file {
            config.session_file = Some(path.clone());
        }
        if let Some(addr) = self.callback_addr {
            config.callback_addr = addr;
        }
        if self.no_browser {
            config.open_browser = false;
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "odc",
            "--base-url",
            "http://backend:9000",
            "--variant",
            "b",
            "--no-browser",
            "files",
        ]);
        let mut config = ConsoleConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.variant, ClientVariant::ResourceDelta);
        assert!(!config.open_browser);
        assert_eq!(cli.command, Some(Command::Files));
    }

    #[test]
    fn test_defaults_untouched_without_flags() {
        let cli = Cli::parse_from(["odc"]);
        let mut config = ConsoleConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.open_browser);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_download_arguments() {
        let cli = Cli::parse_from(["odc", "download", "f1", "/tmp/out.bin"]);
        assert_eq!(
            cli.command,
            Some(Command::Download {
                file_id: "f1".into(),
                out: PathBuf::from("/tmp/out.bin"),
            })
        );
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Cli::try_parse_from(["odc", "--variant", "c"]).is_err());
    }
}
