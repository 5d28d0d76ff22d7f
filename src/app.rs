use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{MouseEvent, MouseEventKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::session::SessionService;
use crate::error::FetchError;
use crate::event::Event;
use crate::graphql::client::GraphQlTransport;
use crate::graphql::query::ProfileNodeConnection;
use crate::handler;
use crate::theme::ThemeColors;
use crate::tree::actions::FolderActions;
use crate::tree::node::{FolderKey, VisibleRow};
use crate::tree::store::TreeStore;

/// How long a status message stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// Which screen is showing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    #[default]
    SignIn,
    Browse,
}

/// Single-line text input with a byte-offset cursor.
#[derive(Debug, Default, Clone)]
pub struct TextInput {
    pub value: String,
    pub cursor_position: usize,
}

impl TextInput {
    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        self.value.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if let Some(prev) = self.value[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
            self.value.remove(self.cursor_position);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.value[..self.cursor_position].chars().next_back() {
            self.cursor_position -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.value[self.cursor_position..].chars().next() {
            self.cursor_position += next.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn end(&mut self) {
        self.cursor_position = self.value.len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor_position = 0;
    }
}

/// Field with keyboard focus on the sign-in screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SignInField {
    #[default]
    Username,
    Password,
}

/// Sign-in form state.
#[derive(Debug, Default)]
pub struct SignInForm {
    pub username: TextInput,
    pub password: TextInput,
    pub focus: SignInField,
    /// A sign-in request is in flight.
    pub submitting: bool,
}

impl SignInForm {
    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            SignInField::Username => &mut self.username,
            SignInField::Password => &mut self.password,
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            SignInField::Username => SignInField::Password,
            SignInField::Password => SignInField::Username,
        };
    }
}

/// A transient message for the status bar.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub created: Instant,
}

/// Main application state.
pub struct App {
    pub screen: Screen,
    pub sign_in: SignInForm,
    pub store: TreeStore,
    pub actions: FolderActions,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub status_message: Option<StatusMessage>,
    pub should_quit: bool,
    pub theme: ThemeColors,
    pub use_icons: bool,
    session: Arc<SessionService>,
    transport: Arc<GraphQlTransport>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl App {
    /// Create the app. A restored session goes straight to the tree.
    pub fn new(
        session: Arc<SessionService>,
        transport: Arc<GraphQlTransport>,
        event_tx: mpsc::UnboundedSender<Event>,
        page_size: usize,
    ) -> Self {
        let actions = FolderActions::new(Arc::clone(&transport), event_tx.clone(), page_size);
        let mut app = Self {
            screen: Screen::SignIn,
            sign_in: SignInForm::default(),
            store: TreeStore::new(),
            actions,
            selected_index: 0,
            scroll_offset: 0,
            status_message: None,
            should_quit: false,
            theme: ThemeColors::default(),
            use_icons: true,
            session,
            transport,
            event_tx,
        };
        if app.session.is_logged_in() {
            app.enter_browse();
        }
        app
    }

    /// Dispatch one event from the loop.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => handler::handle_key_event(self, key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Tick => self.clear_expired_status(),
            Event::Resize(_, _) => {}
            Event::CacheUpdate { key, page } => self.handle_cache_update(key, page),
            Event::FetchComplete { key, result } => self.handle_fetch_complete(key, result),
            Event::SignInComplete(result) => self.handle_sign_in_complete(result),
            Event::SessionChanged { logged_in } => self.handle_session_changed(logged_in),
        }
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status_message(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            created: Instant::now(),
        });
    }

    pub fn set_error_message(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
            created: Instant::now(),
        });
    }

    /// Clear the status message once it has been displayed long enough.
    pub fn clear_expired_status(&mut self) {
        if let Some(msg) = &self.status_message {
            if msg.created.elapsed() > STATUS_TTL {
                self.status_message = None;
            }
        }
    }

    pub fn rows(&self) -> &[VisibleRow] {
        self.store.visible_rows()
    }

    pub fn selected_row(&self) -> Option<&VisibleRow> {
        self.rows().get(self.selected_index)
    }

    // ── Sign-in ─────────────────────────────────────────────────────────────

    /// Submit the sign-in form in the background.
    pub fn submit_sign_in(&mut self) {
        if self.sign_in.submitting {
            return;
        }
        let username = self.sign_in.username.value.trim().to_string();
        let password = self.sign_in.password.value.clone();
        if username.is_empty() || password.is_empty() {
            self.set_error_message("Username and password are required");
            return;
        }

        self.sign_in.submitting = true;
        let session = Arc::clone(&self.session);
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = session.sign_in(&username, &password).await;
            let _ = tx.send(Event::SignInComplete(result));
        });
    }

    fn handle_sign_in_complete(&mut self, result: Result<(), FetchError>) {
        self.sign_in.submitting = false;
        match result {
            Ok(()) => {
                self.sign_in.password.clear();
                self.enter_browse();
            }
            Err(e) => {
                warn!(error = %e, "sign-in failed");
                self.set_error_message(format!("Sign-in failed: {e}"));
            }
        }
    }

    fn handle_session_changed(&mut self, logged_in: bool) {
        if logged_in {
            self.enter_browse();
        } else if self.screen == Screen::Browse {
            self.end_session();
            self.set_error_message("Session expired, please sign in again");
        }
    }

    /// Show the tree and open the root the first time through.
    fn enter_browse(&mut self) {
        if self.screen == Screen::Browse {
            return;
        }
        self.screen = Screen::Browse;
        self.selected_index = 0;
        self.scroll_offset = 0;
        if !self.store.is_expanded(&FolderKey::Root) {
            self.actions.toggle_folder(&mut self.store, FolderKey::Root);
        }
    }

    /// Drop everything tied to the current session.
    fn end_session(&mut self) {
        self.actions.cleanup();
        self.store.reset();
        self.transport.clear_cache();
        self.selected_index = 0;
        self.scroll_offset = 0;
        self.screen = Screen::SignIn;
        self.sign_in.focus = SignInField::Username;
    }

    pub fn sign_out(&mut self) {
        info!("user requested sign-out");
        self.end_session();
        self.session.sign_out();
        self.set_status_message("Signed out");
    }

    // ── Tree results ────────────────────────────────────────────────────────

    fn handle_cache_update(&mut self, key: FolderKey, page: ProfileNodeConnection) {
        if self.screen != Screen::Browse {
            return;
        }
        self.keep_selection(|app| app.actions.handle_cache_update(&mut app.store, key, page));
    }

    fn handle_fetch_complete(&mut self, key: FolderKey, result: Result<(), FetchError>) {
        if let Err(e) = &result {
            if self.screen == Screen::Browse {
                self.set_error_message(format!("Failed to load {key}: {e}"));
            }
        }
        self.actions
            .handle_fetch_complete(&mut self.store, key, &result);
    }

    /// Run `f` and keep the same row selected if it is still visible.
    fn keep_selection(&mut self, f: impl FnOnce(&mut Self)) {
        let anchor = self
            .selected_row()
            .map(|row| (row.node.id.clone(), row.depth));
        f(self);
        if let Some((id, depth)) = anchor {
            let still_here = self
                .selected_row()
                .is_some_and(|row| row.node.id == id && row.depth == depth);
            if !still_here {
                if let Some(pos) = self
                    .rows()
                    .iter()
                    .position(|row| row.node.id == id && row.depth == depth)
                {
                    self.selected_index = pos;
                }
            }
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.rows().len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Move selection down by one row.
    pub fn select_next(&mut self) {
        let len = self.rows().len();
        if len > 0 && self.selected_index < len - 1 {
            self.selected_index += 1;
            self.on_row_reached();
        }
    }

    /// Move selection up by one row.
    pub fn select_previous(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Jump to the first row.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last row.
    pub fn select_last(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected_index = len - 1;
            self.on_row_reached();
        }
    }

    /// Reaching the bottom of the list asks for the next page of that
    /// row's folder.
    fn on_row_reached(&mut self) {
        let len = self.rows().len();
        if len == 0 || self.selected_index != len - 1 {
            return;
        }
        if let Some(key) = self.selected_row().map(|row| row.node.parent_key()) {
            self.actions.fetch_more_for_folder(&mut self.store, key);
        }
    }

    /// Expand or collapse the selected folder. Leaves are ignored.
    pub fn toggle_selected(&mut self) {
        let Some(key) = self
            .selected_row()
            .filter(|row| row.node.is_folder())
            .map(|row| row.node.folder_key())
        else {
            return;
        };
        self.keep_selection(|app| app.actions.toggle_folder(&mut app.store, key));
    }

    /// Collapse the selected folder, or jump to the parent row.
    pub fn collapse_selected(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if row.node.is_folder() && self.store.is_expanded(&row.node.folder_key()) {
            self.toggle_selected();
            return;
        }
        if row.depth == 0 {
            return;
        }
        let parent_depth = row.depth - 1;
        if let Some(pos) = self.rows()[..self.selected_index]
            .iter()
            .rposition(|r| r.depth == parent_depth)
        {
            self.selected_index = pos;
        }
    }

    /// The folder whose next page `m` would load: the selected folder when
    /// open, else the folder holding the selected row.
    pub fn load_more_target(&self) -> FolderKey {
        match self.selected_row() {
            Some(row) if row.node.is_folder() && self.store.is_expanded(&row.node.folder_key()) => {
                row.node.folder_key()
            }
            Some(row) => row.node.parent_key(),
            None => FolderKey::Root,
        }
    }

    pub fn load_more_selected(&mut self) {
        let key = self.load_more_target();
        let has_more = self
            .store
            .page_info(&key)
            .and_then(|info| info.next_cursor())
            .is_some();
        if !has_more {
            self.set_status_message("No more children to load");
            return;
        }
        self.actions.fetch_more_for_folder(&mut self.store, key);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Browse {
            return;
        }
        match mouse.kind {
            MouseEventKind::ScrollDown => self.select_next(),
            MouseEventKind::ScrollUp => self.select_previous(),
            _ => {}
        }
    }

    /// Adjust scroll offset so the selection is inside a window of `height` rows.
    pub fn update_scroll(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + height {
            self.scroll_offset = self.selected_index + 1 - height;
        }
    }
}
