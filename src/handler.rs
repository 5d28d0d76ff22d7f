use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Screen};

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.screen {
        Screen::SignIn => handle_sign_in_key(app, key),
        Screen::Browse => handle_browse_key(app, key),
    }
}

fn handle_sign_in_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.sign_in.switch_focus()
        }
        KeyCode::Enter => app.submit_sign_in(),
        KeyCode::Backspace => app.sign_in.focused_mut().backspace(),
        KeyCode::Left => app.sign_in.focused_mut().move_left(),
        KeyCode::Right => app.sign_in.focused_mut().move_right(),
        KeyCode::Home => app.sign_in.focused_mut().home(),
        KeyCode::End => app.sign_in.focused_mut().end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.sign_in.focused_mut().insert(c)
        }
        _ => {}
    }
}

fn handle_browse_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
            app.toggle_selected()
        }
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('m') => app.load_more_selected(),
        KeyCode::Char('s') => app.sign_out(),
        _ => {}
    }
}
