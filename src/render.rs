//! Terminal rendering of screens and notifications.

use crate::view::{FileAction, FileRow, MainView, Panel, PanelBody, Screen, UserRow, TITLE};
use colored::Colorize;
use odc_onedrive::{Notification, NotificationLevel};
use std::fmt::Write;

pub fn render_screen(screen: &Screen) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", TITLE.bold());
    match screen {
        Screen::Login => {
            let _ = writeln!(out, "[ Login ]  type `login` to sign in");
        }
        Screen::Callback => {
            let _ = writeln!(out, "Logging in...");
        }
        Screen::Main(view) => render_main(&mut out, view),
    }
    out
}

fn render_main(out: &mut String, view: &MainView) {
    let _ = writeln!(out, "[ Logout ]");

    let headers: Vec<String> = view
        .tabs
        .iter()
        .map(|t| {
            let label = format!("{}. {}", t.index + 1, t.label);
            if t.active {
                format!("[{}]", label).bold().to_string()
            } else {
                format!(" {} ", label)
            }
        })
        .collect();
    let _ = writeln!(out, "{}", headers.join(" | "));
    let _ = writeln!(out);

    if let Some(panel) = view.active_panel() {
        render_panel(out, panel);
    }
}

fn render_panel(out: &mut String, panel: &Panel) {
    match &panel.body {
        PanelBody::Files(rows) => render_files(out, rows),
        PanelBody::Users {
            identifier_label,
            selected_id,
            rows,
        } => {
            render_identifier(out, identifier_label, selected_id);
            let _ = writeln!(out, "[ Get Users ]");
            render_users(out, rows);
        }
        PanelBody::Subscribe {
            identifier_label,
            selected_id,
        } => {
            render_identifier(out, identifier_label, selected_id);
            let _ = writeln!(out, "[ Subscribe ]");
        }
    }
}

fn render_identifier(out: &mut String, label: &str, value: &str) {
    let shown = if value.is_empty() {
        "(none, use `select <id>`)".dimmed().to_string()
    } else {
        value.to_string()
    };
    let _ = writeln!(out, "{}: {}", label, shown);
}

fn render_files(out: &mut String, rows: &[FileRow]) {
    let _ = writeln!(out, "[ List Files ]");
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            let action = match &row.action {
                FileAction::Download { href } => format!("{} <{}>", row.action.label(), href),
                other => other.label().to_string(),
            };
            vec![row.name.clone(), row.id.clone(), action]
        })
        .collect();
    write_table(out, &["File Name", "File ID", "Action"], &table);
}

fn render_users(out: &mut String, rows: &[UserRow]) {
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|row| vec![row.display_name.clone(), row.id.clone()])
        .collect();
    write_table(out, &["User Name", "User ID"], &table);
}

fn write_table(out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let _ = writeln!(out, "{}", pad_row(headers, &widths).bold());
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{}", pad_row(&cells, &widths));
    }
}

fn pad_row(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join(" | ")
        .trim_end()
        .to_string()
}

pub fn render_notification(notification: &Notification) -> String {
    let stamp = notification.at.format("%H:%M:%S").to_string();
    let text = match notification.level {
        NotificationLevel::Info => notification.text.cyan(),
        NotificationLevel::Success => notification.text.green(),
        NotificationLevel::Error => notification.text.red(),
    };
    format!("{} {}", stamp.dimmed(), text)
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Route;
    use crate::view::{screen, EMPTY_LABEL};
    use odc_onedrive::{ClientVariant, ConsoleState, FileRecord, UserRecord};

    #[test]
    fn test_render_login() {
        let out = render_screen(&Screen::Login);
        assert!(out.contains("Login"));
        assert!(!out.contains("Logout"));
    }

    #[test]
    fn test_render_file_table() {
        let mut state = ConsoleState::new(ClientVariant::FileSubscriptions, true);
        state.replace_files(vec![
            FileRecord {
                id: "1".into(),
                name: "a.txt".into(),
                size: Some(10),
                download_url: Some("https://dl/a".into()),
            },
            FileRecord {
                id: "2".into(),
                name: "folder".into(),
                size: Some(0),
                download_url: None,
            },
        ]);

        let out = render_screen(&screen(&state, &Route::Main));
        assert!(out.contains("Logout"));
        assert!(out.contains("a.txt"));
        assert!(out.contains("https://dl/a"));
        assert!(out.contains(EMPTY_LABEL));
        assert!(out.contains("User Details"));
    }

    #[test]
    fn test_render_users_name_before_id() {
        let mut state = ConsoleState::new(ClientVariant::FileSubscriptions, true);
        state.replace_users(vec![UserRecord {
            id: "u1".into(),
            display_name: "Alice".into(),
        }]);
        state.select_tab(1).unwrap();

        let out = render_screen(&screen(&state, &Route::Main));
        let header = out.lines().find(|l| l.contains("User ID")).unwrap();
        assert!(header.find("User Name").unwrap() < header.find("User ID").unwrap());
        let row = out.lines().find(|l| l.contains("Alice")).unwrap();
        assert!(row.find("Alice").unwrap() < row.find("u1").unwrap());
    }

    #[test]
    fn test_render_notification_keeps_text() {
        let out = render_notification(&Notification::error("Error creating subscription"));
        assert!(out.contains("Error creating subscription"));
    }
}
