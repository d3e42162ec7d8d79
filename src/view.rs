//! View model derived from the console state.
//!
//! Rendering is split in two: [`screen`] decides *what* is shown, the
//! `render` module decides how it looks in a terminal.

use crate::router::Route;
use odc_onedrive::{ConsoleState, FileRecord, SessionPhase, Tab, UserRecord};

/// Label rendered for folders and empty files.
pub const EMPTY_LABEL: &str = "Empty file / folder";
pub const DOWNLOAD_LABEL: &str = "Download";
pub const TITLE: &str = "OneDrive Integration";

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Logged out: only the login control.
    Login,
    /// Waiting for the authorization code to be exchanged.
    Callback,
    Main(MainView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainView {
    pub tabs: Vec<TabHeader>,
    /// One panel per tab; only the active one is visible.
    pub panels: Vec<Panel>,
}

impl MainView {
    pub fn active_panel(&self) -> Option<&Panel> {
        self.panels.iter().find(|p| !p.hidden)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHeader {
    pub index: usize,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub tab: Tab,
    pub hidden: bool,
    pub body: PanelBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Files(Vec<FileRow>),
    Users {
        identifier_label: &'static str,
        selected_id: String,
        rows: Vec<UserRow>,
    },
    Subscribe {
        identifier_label: &'static str,
        selected_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub name: String,
    pub id: String,
    pub action: FileAction,
}

/// What the action column of a file row shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    Download { href: String },
    /// Has content but the backend supplied no download URL.
    Unavailable,
    Empty,
}

impl FileAction {
    pub fn label(&self) -> &str {
        match self {
            Self::Download { .. } => DOWNLOAD_LABEL,
            Self::Unavailable => "Download unavailable",
            Self::Empty => EMPTY_LABEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: String,
    pub display_name: String,
}

impl From<&FileRecord> for FileRow {
    fn from(file: &FileRecord) -> Self {
        let action = if !file.has_content() {
            FileAction::Empty
        } else {
            match &file.download_url {
                Some(href) => FileAction::Download { href: href.clone() },
                None => FileAction::Unavailable,
            }
        };
        Self {
            name: file.name.clone(),
            id: file.id.clone(),
            action,
        }
    }
}

impl From<&UserRecord> for UserRow {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// The screen for the current state and route.
pub fn screen(state: &ConsoleState, route: &Route) -> Screen {
    match (state.phase(), route) {
        (SessionPhase::LoggedIn, _) => Screen::Main(main_view(state)),
        (_, Route::Callback { .. }) => Screen::Callback,
        _ => Screen::Login,
    }
}

fn main_view(state: &ConsoleState) -> MainView {
    let variant = state.variant();
    let active = state.active_tab();

    let tabs = state
        .tabs()
        .iter()
        .enumerate()
        .map(|(index, tab)| TabHeader {
            index,
            label: tab.label(),
            active: index == active,
        })
        .collect();

    let panels = state
        .tabs()
        .iter()
        .enumerate()
        .map(|(index, &tab)| {
            let body = match tab {
                Tab::Files => PanelBody::Files(state.files().iter().map(FileRow::from).collect()),
                Tab::Users => PanelBody::Users {
                    identifier_label: variant.identifier_label(),
                    selected_id: state.selected_id().to_string(),
                    rows: state.users().iter().map(UserRow::from).collect(),
                },
                Tab::Subscribe => PanelBody::Subscribe {
                    identifier_label: variant.identifier_label(),
                    selected_id: state.selected_id().to_string(),
                },
            };
            Panel {
                tab,
                hidden: index != active,
                body,
            }
        })
        .collect();

    MainView { tabs, panels }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
