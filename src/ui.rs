use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::{App, Screen};
use crate::components::sign_in::SignInWidget;
use crate::components::status_bar::{StatusBarWidget, SIGN_IN_HINTS};
use crate::components::tree::TreeWidget;
use crate::tree::node::FolderKey;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    match app.screen {
        Screen::SignIn => render_sign_in(app, frame, chunks[0], chunks[1]),
        Screen::Browse => render_browse(app, frame, chunks[0], chunks[1]),
    }
}

fn render_sign_in(app: &App, frame: &mut Frame, main: Rect, status: Rect) {
    frame.render_widget(SignInWidget::new(&app.sign_in, &app.theme), main);

    let mut bar = StatusBarWidget::new("Sign in", &app.theme).hints(SIGN_IN_HINTS);
    if let Some(msg) = &app.status_message {
        bar = bar.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(bar, status);
}

fn render_browse(app: &mut App, frame: &mut Frame, main: Rect, status: Rect) {
    // Keep the selection inside the bordered viewport.
    let visible_height = main.height.saturating_sub(2) as usize;
    app.update_scroll(visible_height);

    let block = Block::default()
        .title(" Profiles ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    let tree = TreeWidget::new(&app.store, &app.theme, app.use_icons)
        .selection(app.selected_index, app.scroll_offset)
        .block(block);
    frame.render_widget(tree, main);

    let location = app
        .selected_row()
        .map(|row| row.node.name.clone())
        .unwrap_or_default();
    let more_key = app.load_more_target();
    let more_available = app
        .store
        .page_info(&more_key)
        .and_then(|info| info.next_cursor())
        .is_some();

    let mut bar = StatusBarWidget::new(&location, &app.theme)
        .loading(app.store.is_loading(&FolderKey::Root))
        .more_available(more_available);
    if let Some(msg) = &app.status_message {
        bar = bar.status_message(&msg.text, msg.is_error);
    }
    frame.render_widget(bar, status);
}
