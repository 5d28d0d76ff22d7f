use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::theme::ThemeColors;
use crate::tree::node::VisibleRow;
use crate::tree::store::TreeStore;

/// Tree widget that renders the visible rows with box-drawing characters.
pub struct TreeWidget<'a> {
    store: &'a TreeStore,
    selected: usize,
    scroll_offset: usize,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(store: &'a TreeStore, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            store,
            selected: 0,
            scroll_offset: 0,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn selection(mut self, selected: usize, scroll_offset: usize) -> Self {
        self.selected = selected;
        self.scroll_offset = scroll_offset;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// Each ancestor level contributes a continuation line unless that
    /// ancestor was the last of its siblings.
    fn build_prefix(rows: &[VisibleRow], last: &[bool], index: usize) -> String {
        let depth = rows[index].depth;
        let mut parts: Vec<&str> = Vec::with_capacity(depth + 1);

        for d in 0..depth {
            let mut ancestor_is_last = false;
            for j in (0..index).rev() {
                if rows[j].depth == d {
                    ancestor_is_last = last[j];
                    break;
                }
                if rows[j].depth < d {
                    break;
                }
            }
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }

        parts.push(if last[index] { "└──" } else { "├──" });
        parts.concat()
    }

    /// Get the folder/leaf indicator.
    fn item_indicator(&self, row: &VisibleRow) -> &'static str {
        let is_folder = row.node.is_folder();
        let is_expanded = is_folder && self.store.is_expanded(&row.node.folder_key());
        if self.use_icons {
            match (is_folder, is_expanded) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                (false, _) => "• ",
            }
        } else {
            match (is_folder, is_expanded) {
                (true, true) => "[-] ",
                (true, false) => "[+] ",
                (false, _) => " -  ",
            }
        }
    }

    /// Trailing marker for folder state: loading or empty.
    fn folder_suffix(&self, row: &VisibleRow) -> Option<&'static str> {
        if !row.node.is_folder() {
            return None;
        }
        let key = row.node.folder_key();
        if self.store.is_loading(&key) {
            Some(" loading…")
        } else if self.store.is_expanded(&key)
            && self.store.children(&key).is_some_and(|c| c.is_empty())
        {
            Some(" (empty)")
        } else {
            None
        }
    }
}

/// Whether each row is the last among its siblings.
pub fn last_sibling_flags(rows: &[VisibleRow]) -> Vec<bool> {
    let mut last = vec![false; rows.len()];
    // seen[d]: a later row at depth d shares the current parent
    let mut seen: Vec<bool> = Vec::new();
    for (i, row) in rows.iter().enumerate().rev() {
        let d = row.depth;
        if seen.len() <= d {
            seen.resize(d + 1, false);
        }
        last[i] = !seen[d];
        seen[d] = true;
        seen.truncate(d + 1);
    }
    last
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows = self.store.visible_rows();
        let visible_height = inner_area.height as usize;

        if rows.is_empty() || visible_height == 0 {
            return;
        }

        let last = last_sibling_flags(rows);
        let window = rows
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(visible_height);

        for (i, (idx, row)) in window.enumerate() {
            let y = inner_area.y + i as u16;

            let prefix = Self::build_prefix(rows, &last, idx);
            let indicator = self.item_indicator(row);

            let style = if idx == self.selected {
                Style::default()
                    .bg(self.theme.tree_selected_bg)
                    .fg(self.theme.tree_selected_fg)
                    .add_modifier(Modifier::BOLD)
            } else if row.node.is_folder() {
                Style::default()
                    .fg(self.theme.tree_folder_fg)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.tree_leaf_fg)
            };

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(self.theme.dim_fg)),
                Span::styled(format!("{}{}", indicator, row.node.name), style),
            ];
            if let Some(suffix) = self.folder_suffix(row) {
                spans.push(Span::styled(
                    suffix,
                    Style::default()
                        .fg(self.theme.info_fg)
                        .add_modifier(Modifier::ITALIC),
                ));
            }

            let line = Line::from(spans);
            buf.set_line(inner_area.x, y, &line, inner_area.width);
        }
    }
}
