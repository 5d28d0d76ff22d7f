use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{SignInField, SignInForm, TextInput};
use crate::theme::ThemeColors;

const DIALOG_WIDTH: u16 = 50;
const DIALOG_HEIGHT: u16 = 9;

/// Centered sign-in form.
pub struct SignInWidget<'a> {
    form: &'a SignInForm,
    theme: &'a ThemeColors,
}

impl<'a> SignInWidget<'a> {
    pub fn new(form: &'a SignInForm, theme: &'a ThemeColors) -> Self {
        Self { form, theme }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let w = width.min(area.width);
        let h = height.min(area.height);
        let x = area.x + area.width.saturating_sub(w) / 2;
        let y = area.y + area.height.saturating_sub(h) / 2;
        Rect::new(x, y, w, h)
    }
}

/// Split the input around the cursor, masking every character when `masked`.
fn input_segments(input: &TextInput, masked: bool) -> (String, String, String) {
    let shown: String = if masked {
        input.value.chars().map(|_| '•').collect()
    } else {
        input.value.clone()
    };
    let cursor_char_index = input.value[..input.cursor_position].chars().count();

    let mut chars = shown.chars();
    let before: String = chars.by_ref().take(cursor_char_index).collect();
    let at = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
    let after: String = chars.collect();
    (before, at, after)
}

fn render_input_line(
    input: &TextInput,
    masked: bool,
    focused: bool,
    theme: &ThemeColors,
    line_area: Rect,
    buf: &mut Buffer,
) {
    let (before, at, after) = input_segments(input, masked);
    let max_width = line_area.width as usize;

    // Keep the cursor in view by dropping characters from the left.
    let before_len = before.chars().count();
    let before = if before_len + 1 > max_width {
        before
            .chars()
            .skip(before_len + 1 - max_width)
            .collect::<String>()
    } else {
        before
    };

    let input_style = Style::default().fg(theme.tree_fg);
    let mut spans = vec![Span::styled(before, input_style)];
    if focused {
        spans.push(Span::styled(
            at,
            Style::default()
                .bg(theme.tree_fg)
                .fg(theme.dialog_bg)
                .add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::styled(at, input_style));
    }
    spans.push(Span::styled(after, input_style));

    buf.set_line(line_area.x, line_area.y, &Line::from(spans), line_area.width);
}

impl<'a> Widget for SignInWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = DIALOG_WIDTH.min(area.width.saturating_sub(4));
        let rect = Self::centered_rect(width, DIALOG_HEIGHT, area);

        Clear.render(rect, buf);

        let block = Block::default()
            .title(" Sign in ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.dialog_border_fg))
            .padding(Padding::horizontal(1));

        let inner = block.inner(rect);
        block.render(rect, buf);

        if inner.height < 5 || inner.width == 0 {
            return;
        }

        let label = |text: &'static str, focused: bool| {
            let style = if focused {
                Style::default()
                    .fg(self.theme.accent_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.dim_fg)
            };
            Line::from(Span::styled(text, style))
        };

        let on_user = self.form.focus == SignInField::Username;
        buf.set_line(inner.x, inner.y, &label("Username", on_user), inner.width);
        render_input_line(
            &self.form.username,
            false,
            on_user && !self.form.submitting,
            self.theme,
            Rect::new(inner.x, inner.y + 1, inner.width, 1),
            buf,
        );
        buf.set_line(inner.x, inner.y + 2, &label("Password", !on_user), inner.width);
        render_input_line(
            &self.form.password,
            true,
            !on_user && !self.form.submitting,
            self.theme,
            Rect::new(inner.x, inner.y + 3, inner.width, 1),
            buf,
        );

        let hint = if self.form.submitting {
            "Signing in…"
        } else {
            "[Enter] Sign in  [Tab] Switch  [Esc] Quit"
        };
        let hint_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);
        let hint_line = Line::from(Span::styled(hint, hint_style));
        buf.set_line(inner.x, inner.y + inner.height - 1, &hint_line, inner.width);
    }
}
