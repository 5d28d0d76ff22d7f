use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

/// Hints shown on the browse screen.
pub const BROWSE_HINTS: &str = " ↵:toggle  h:up  m:more  s:sign out  q:quit ";
/// Hints shown on the sign-in screen.
pub const SIGN_IN_HINTS: &str = " Tab:switch  ↵:sign in  Esc:quit ";

/// Status bar widget: a transient message, or the current location, state
/// flags, and key hints.
pub struct StatusBarWidget<'a> {
    location: &'a str,
    theme: &'a ThemeColors,
    hints: &'a str,
    status_message: Option<&'a str>,
    is_error: bool,
    loading: bool,
    more_available: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(location: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            location,
            theme,
            hints: BROWSE_HINTS,
            status_message: None,
            is_error: false,
            loading: false,
            more_available: false,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn hints(mut self, hints: &'a str) -> Self {
        self.hints = hints;
        self
    }

    /// The root listing is being fetched.
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    /// The selected row's folder has another page.
    pub fn more_available(mut self, more: bool) -> Self {
        self.more_available = more;
        self
    }
}

/// Truncate to at most `width` characters.
fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;
        let base = Style::default()
            .bg(self.theme.status_bg)
            .fg(self.theme.status_fg);

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                base.fg(self.theme.success_fg)
            };

            let display = format!("{:<width$}", fit(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        let hints_len = self.hints.chars().count();
        let remaining = width.saturating_sub(hints_len);

        let mut spans = vec![Span::styled(
            fit(self.location, remaining),
            base.add_modifier(Modifier::BOLD),
        )];
        if self.loading {
            spans.push(Span::styled(
                " loading…",
                base.fg(self.theme.info_fg),
            ));
        }
        if self.more_available {
            spans.push(Span::styled(
                " +more (m)",
                base.fg(self.theme.accent_fg),
            ));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        spans.push(Span::styled(" ".repeat(pad), base));
        spans.push(Span::styled(
            self.hints,
            base.fg(self.theme.dim_fg).add_modifier(Modifier::DIM),
        ));

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}
