//! Application driver.
//!
//! [`App`] wraps a [`Console`] with the current route and turns commands
//! into console operations.  [`run`] wires it to a real backend and either
//! executes a single subcommand or runs the interactive loop, which
//! multiplexes terminal input, OAuth redirects and push notifications on
//! one task.

use crate::callback_server::CallbackServer;
use crate::cli;
use crate::error::{AppError, AppResult};
use crate::render::{render_notification, render_screen};
use crate::router::Route;
use crate::view::{self, Screen};
use log::{debug, info, warn};
use odc_onedrive::{
    auth, delta::latest_change, Backend, Console, ConsoleConfig, FileSessionStore, HttpBackend,
    MemorySessionStore, PushNotification, SessionStore, Tab,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  login                  open the identity-provider login page
  callback <url|code>    complete login by hand
  logout                 drop the session
  files                  list files
  users [id]             list users with access to the selected (or given) identifier
  select <id>            set the selected identifier
  subscribe [id]         subscribe to change notifications for a file
  delta <resource>       show the most recent change for a resource
  download [id] <path>   download a file to <path>
  tab <n>                switch to tab n
  show                   redraw the current screen
  help                   this text
  quit                   exit";

// ═══════════════════════════════════════════════════════════════════════
//  Commands
// ═══════════════════════════════════════════════════════════════════════

/// A line typed into the interactive console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Callback(String),
    Logout,
    Files,
    Users(Option<String>),
    Select(String),
    Subscribe(Option<String>),
    Delta(String),
    Download { id: Option<String>, out: PathBuf },
    Tab(usize),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err("empty command".into());
        };
        let args: Vec<&str> = words.collect();
        let first = args.first().map(|s| s.to_string());

        let command = match (head.to_ascii_lowercase().as_str(), args.len()) {
            ("login", 0) => Self::Login,
            ("callback", 1) => Self::Callback(args[0].to_string()),
            ("logout", 0) => Self::Logout,
            ("files" | "ls", 0) => Self::Files,
            ("users", 0 | 1) => Self::Users(first),
            ("select", 1) => Self::Select(args[0].to_string()),
            ("subscribe", 0 | 1) => Self::Subscribe(first),
            ("delta", 1) => Self::Delta(args[0].to_string()),
            ("download", 1) => Self::Download {
                id: None,
                out: PathBuf::from(args[0]),
            },
            ("download", 2) => Self::Download {
                id: Some(args[0].to_string()),
                out: PathBuf::from(args[1]),
            },
            ("tab", 1) => {
                let n: usize = args[0]
                    .parse()
                    .map_err(|_| format!("not a tab number: {}", args[0]))?;
                Self::Tab(n)
            }
            ("show", 0) => Self::Show,
            ("help" | "?", 0) => Self::Help,
            ("quit" | "exit" | "q", 0) => Self::Quit,
            (other, _) => return Err(format!("unknown command or wrong arguments: {}", other)),
        };
        Ok(command)
    }
}

/// What the caller should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Redraw the current screen.
    Render,
    Print(String),
    /// Nothing beyond pending notifications.
    Silent,
    Quit,
}

// ═══════════════════════════════════════════════════════════════════════
//  App
// ═══════════════════════════════════════════════════════════════════════

pub struct App<B: Backend, S: SessionStore> {
    console: Console<B, S>,
    route: Route,
    open_browser: bool,
}

impl<B: Backend, S: SessionStore> App<B, S> {
    pub fn new(console: Console<B, S>, open_browser: bool) -> Self {
        Self {
            console,
            route: Route::Main,
            open_browser,
        }
    }

    pub fn console(&self) -> &Console<B, S> {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console<B, S> {
        &mut self.console
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> Screen {
        view::screen(self.console.state(), &self.route)
    }

    /// Pending notifications, rendered for the terminal.
    pub fn take_notifications(&mut self) -> Vec<String> {
        self.console
            .take_notifications()
            .iter()
            .map(render_notification)
            .collect()
    }

    pub async fn execute(&mut self, command: Command) -> AppResult<Reply> {
        match command {
            Command::Login => {
                let url = self.console.login().await?;
                if self.open_browser {
                    if let Err(e) = open::that(&url) {
                        warn!("Could not open a browser: {}", e);
                    }
                }
                Ok(Reply::Print(format!("Open this URL to log in:\n{}", url)))
            }
            Command::Callback(input) => {
                let code = auth::extract_code(&input)
                    .ok_or_else(|| AppError::Config("no authorization code in input".into()))?;
                self.on_callback(&code).await?;
                Ok(Reply::Render)
            }
            Command::Logout => {
                self.console.logout();
                self.route = Route::Main;
                Ok(Reply::Render)
            }
            Command::Files => {
                self.console.list_files().await?;
                self.show_tab(Tab::Files)?;
                Ok(Reply::Render)
            }
            Command::Users(id) => {
                if let Some(id) = id {
                    self.console.set_selected_id(id);
                }
                self.console.list_users().await?;
                self.show_tab(Tab::Users)?;
                Ok(Reply::Render)
            }
            Command::Select(id) => {
                self.console.set_selected_id(id);
                Ok(Reply::Render)
            }
            Command::Subscribe(id) => {
                if let Some(id) = id {
                    self.console.set_selected_id(id);
                }
                self.console.create_subscription().await?;
                Ok(Reply::Silent)
            }
            Command::Delta(resource) => {
                let records = self.console.delta(&resource).await?;
                Ok(Reply::Print(match latest_change(&records) {
                    Some(file) => format!("File updated: {}", file.name),
                    None => format!("No changes for {}", resource),
                }))
            }
            Command::Download { id, out } => {
                let file = self.console.download_file(id.as_deref()).await?;
                tokio::fs::write(&out, &file.bytes).await?;
                info!("Saved {} to {}", file.file_id, out.display());
                Ok(Reply::Print(format!(
                    "Saved {} bytes of {} to {}",
                    file.bytes.len(),
                    file.file_id,
                    out.display()
                )))
            }
            Command::Tab(n) => {
                let index = n
                    .checked_sub(1)
                    .ok_or_else(|| AppError::Config("tabs are numbered from 1".into()))?;
                self.console.select_tab(index)?;
                Ok(Reply::Render)
            }
            Command::Show => Ok(Reply::Render),
            Command::Help => Ok(Reply::Print(HELP.to_string())),
            Command::Quit => Ok(Reply::Quit),
        }
    }

    /// The browser came back with an authorization code.  On failure the
    /// route stays on the callback view.
    pub async fn on_callback(&mut self, code: &str) -> AppResult<()> {
        self.route = Route::Callback {
            code: Some(code.to_string()),
        };
        self.console.complete_login(code).await?;
        self.route = Route::Main;
        Ok(())
    }

    pub async fn on_push(&mut self, notification: PushNotification) {
        self.console.handle_push(notification).await;
    }

    fn show_tab(&mut self, tab: Tab) -> AppResult<()> {
        if let Some(index) = self.console.state().tabs().iter().position(|t| *t == tab) {
            self.console.select_tab(index)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Runners
// ═══════════════════════════════════════════════════════════════════════

/// Build the console against the configured backend and run `command`.
pub async fn run(config: ConsoleConfig, command: cli::Command) -> AppResult<()> {
    let backend = HttpBackend::new(&config)?;
    let store: Box<dyn SessionStore> = match &config.session_file {
        Some(path) => {
            let store = FileSessionStore::new(path);
            info!("Session token kept in {}", store.path().display());
            Box::new(store)
        }
        None => Box::new(MemorySessionStore::new()),
    };
    let console = Console::new(backend, store, config.variant)?;
    let mut app = App::new(console, config.open_browser);
    info!("Using backend {} ({})", config.base_url, config.variant);

    let command = match command {
        cli::Command::Interactive => return run_interactive(app, config.callback_addr).await,
        cli::Command::Watch => return run_watch(app).await,
        cli::Command::Login => Command::Login,
        cli::Command::Callback { input } => {
            if config.session_file.is_none() {
                warn!("No session file configured; the token will not outlive this process");
            }
            Command::Callback(input)
        }
        cli::Command::Logout => Command::Logout,
        cli::Command::Files => Command::Files,
        cli::Command::Users { id } => Command::Users(Some(id)),
        cli::Command::Subscribe { id } => Command::Subscribe(Some(id)),
        cli::Command::Delta { resource } => Command::Delta(resource),
        cli::Command::Download { file_id, out } => Command::Download {
            id: Some(file_id),
            out,
        },
    };

    let result = app.execute(command).await;
    print_notifications(&mut app);
    emit(&app, result?);
    Ok(())
}

enum Event {
    Input(String),
    Callback(String),
    Push(PushNotification),
    Closed,
}

async fn run_interactive<B: Backend, S: SessionStore>(
    mut app: App<B, S>,
    callback_addr: SocketAddr,
) -> AppResult<()> {
    let mut server = match CallbackServer::bind(callback_addr).await {
        Ok(server) => Some(server),
        Err(e) => {
            warn!(
                "Callback listener unavailable on {}: {}; use `callback <url>` instead",
                callback_addr, e
            );
            None
        }
    };

    app.console_mut().start();
    print!("{}", render_screen(&app.screen()));
    println!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let event = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => Event::Input(line),
                None => Event::Closed,
            },
            code = next_code(&mut server) => Event::Callback(code),
            notification = app.console_mut().next_push() => Event::Push(notification),
            _ = tokio::signal::ctrl_c() => Event::Closed,
        };

        match event {
            Event::Input(line) if line.trim().is_empty() => {}
            Event::Input(line) => {
                let result = match line.parse::<Command>() {
                    Ok(command) => app.execute(command).await,
                    Err(e) => Ok(Reply::Print(e)),
                };
                print_notifications(&mut app);
                match result {
                    Ok(Reply::Quit) => break,
                    Ok(reply) => emit(&app, reply),
                    // Already logged by the console.
                    Err(AppError::Console(e)) => debug!("Command failed: {}", e),
                    Err(e) => eprintln!("{}", render_error(&e)),
                }
            }
            Event::Callback(code) => {
                print!("{}", render_screen(&app.screen_for_callback(&code)));
                let result = app.on_callback(&code).await;
                print_notifications(&mut app);
                match result {
                    Ok(()) => print!("{}", render_screen(&app.screen())),
                    Err(AppError::Console(e)) => debug!("Login not completed: {}", e),
                    Err(e) => eprintln!("{}", render_error(&e)),
                }
            }
            Event::Push(notification) => {
                app.on_push(notification).await;
                print_notifications(&mut app);
            }
            Event::Closed => break,
        }
    }

    info!("Console closed");
    Ok(())
}

async fn run_watch<B: Backend, S: SessionStore>(mut app: App<B, S>) -> AppResult<()> {
    app.console().auth().require()?;
    app.console_mut().start();
    println!("Watching for changes, press Ctrl-C to stop");

    loop {
        let event = tokio::select! {
            notification = app.console_mut().next_push() => Event::Push(notification),
            _ = tokio::signal::ctrl_c() => Event::Closed,
        };
        match event {
            Event::Push(notification) => {
                app.on_push(notification).await;
                print_notifications(&mut app);
            }
            _ => break,
        }
    }
    Ok(())
}

impl<B: Backend, S: SessionStore> App<B, S> {
    /// Screen shown while `code` is being exchanged.
    fn screen_for_callback(&self, code: &str) -> Screen {
        let route = Route::Callback {
            code: Some(code.to_string()),
        };
        view::screen(self.console.state(), &route)
    }
}

/// Next code from the redirect listener; pending forever without one.
async fn next_code(server: &mut Option<CallbackServer>) -> String {
    if let Some(server) = server.as_mut() {
        if let Some(code) = server.next_code().await {
            return code;
        }
    }
    std::future::pending().await
}

fn emit<B: Backend, S: SessionStore>(app: &App<B, S>, reply: Reply) {
    match reply {
        Reply::Render => print!("{}", render_screen(&app.screen())),
        Reply::Print(text) => println!("{}", text),
        Reply::Silent | Reply::Quit => {}
    }
}

fn print_notifications<B: Backend, S: SessionStore>(app: &mut App<B, S>) {
    for line in app.take_notifications() {
        println!("{}", line);
    }
}

fn render_error(err: &AppError) -> String {
    use colored::Colorize;
    format!("error: {}", err).red().to_string()
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
