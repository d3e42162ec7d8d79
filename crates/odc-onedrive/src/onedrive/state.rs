//! Client-side UI state.
//!
//! Everything here is transient: lists are replaced wholesale by each
//! fetch and wiped on logout.

use crate::onedrive::error::{ConsoleError, ConsoleResult};
use crate::onedrive::types::{
    ClientVariant, DownloadedFile, FileRecord, Notification, Tab, UserRecord,
};
use std::collections::VecDeque;

/// Oldest notifications are dropped past this many.
const MAX_NOTIFICATIONS: usize = 50;

/// Where the session is in the login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    LoggedOut,
    /// Sent to the identity provider; waiting for the callback.
    Redirected { login_url: String },
    LoggedIn,
}

/// State rendered by the presentation layer.
#[derive(Debug, Clone)]
pub struct ConsoleState {
    variant: ClientVariant,
    phase: SessionPhase,
    files: Vec<FileRecord>,
    users: Vec<UserRecord>,
    selected_id: String,
    active_tab: usize,
    downloaded: Option<DownloadedFile>,
    notifications: VecDeque<Notification>,
}

impl ConsoleState {
    pub fn new(variant: ClientVariant, logged_in: bool) -> Self {
        Self {
            variant,
            phase: if logged_in {
                SessionPhase::LoggedIn
            } else {
                SessionPhase::LoggedOut
            },
            files: Vec::new(),
            users: Vec::new(),
            selected_id: String::new(),
            active_tab: 0,
            downloaded: None,
            notifications: VecDeque::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────

    pub fn variant(&self) -> ClientVariant {
        self.variant
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_logged_in(&self) -> bool {
        self.phase == SessionPhase::LoggedIn
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn selected_id(&self) -> &str {
        &self.selected_id
    }

    pub fn active_tab(&self) -> usize {
        self.active_tab
    }

    pub fn tabs(&self) -> &'static [Tab] {
        self.variant.tabs()
    }

    /// The tab currently shown.
    pub fn current_tab(&self) -> Tab {
        self.tabs()[self.active_tab]
    }

    pub fn downloaded(&self) -> Option<&DownloadedFile> {
        self.downloaded.as_ref()
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    // ─── Mutators ────────────────────────────────────────────────────

    pub fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    pub fn set_selected_id(&mut self, id: impl Into<String>) {
        self.selected_id = id.into();
    }

    /// Show tab `index`.  Other tabs keep their state.
    pub fn select_tab(&mut self, index: usize) -> ConsoleResult<()> {
        if index >= self.tabs().len() {
            return Err(ConsoleError::invalid(format!(
                "No tab {} (this client has {})",
                index,
                self.tabs().len()
            )));
        }
        self.active_tab = index;
        Ok(())
    }

    pub fn replace_files(&mut self, files: Vec<FileRecord>) {
        self.files = files;
    }

    pub fn replace_users(&mut self, users: Vec<UserRecord>) {
        self.users = users;
    }

    pub fn set_downloaded(&mut self, file: DownloadedFile) {
        self.downloaded = Some(file);
    }

    pub fn notify(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(notification);
    }

    /// Take every pending notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Forget everything tied to the session.
    pub fn reset_session(&mut self) {
        self.phase = SessionPhase::LoggedOut;
        self.files.clear();
        self.users.clear();
        self.selected_id.clear();
        self.downloaded = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, size: u64) -> FileRecord {
        FileRecord {
            id: id.into(),
            name: format!("{}.txt", id),
            size: Some(size),
            download_url: None,
        }
    }

    #[test]
    fn test_initial_phase() {
        assert_eq!(
            ConsoleState::new(ClientVariant::FileSubscriptions, false).phase(),
            &SessionPhase::LoggedOut
        );
        assert!(ConsoleState::new(ClientVariant::FileSubscriptions, true).is_logged_in());
    }

    #[test]
    fn test_select_tab_preserves_panel_state() {
        let mut state = ConsoleState::new(ClientVariant::FileSubscriptions, true);
        state.replace_files(vec![file("1", 10)]);
        state.set_selected_id("abc");

        state.select_tab(1).unwrap();
        assert_eq!(state.current_tab(), Tab::Users);
        state.select_tab(0).unwrap();

        assert_eq!(state.files().len(), 1);
        assert_eq!(state.selected_id(), "abc");
    }

    #[test]
    fn test_select_tab_out_of_range() {
        let mut state = ConsoleState::new(ClientVariant::ResourceDelta, true);
        assert!(state.select_tab(2).is_err());
        assert_eq!(state.active_tab(), 0);
    }

    #[test]
    fn test_reset_session() {
        let mut state = ConsoleState::new(ClientVariant::FileSubscriptions, true);
        state.replace_files(vec![file("1", 10), file("2", 0)]);
        state.replace_users(vec![UserRecord {
            id: "u1".into(),
            display_name: "Alice".into(),
        }]);
        state.set_selected_id("1");
        state.set_downloaded(DownloadedFile {
            file_id: "1".into(),
            bytes: vec![1, 2, 3],
        });

        state.reset_session();

        assert_eq!(state.phase(), &SessionPhase::LoggedOut);
        assert!(state.files().is_empty());
        assert!(state.users().is_empty());
        assert!(state.selected_id().is_empty());
        assert!(state.downloaded().is_none());
    }

    #[test]
    fn test_notifications_are_bounded() {
        let mut state = ConsoleState::new(ClientVariant::FileSubscriptions, true);
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            state.notify(Notification::info(format!("n{}", i)));
        }
        let drained = state.drain_notifications();
        assert_eq!(drained.len(), MAX_NOTIFICATIONS);
        assert_eq!(drained[0].text, "n5");
        assert_eq!(state.notifications().count(), 0);
    }
}
