use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

use crate::prefs::Language;
use crate::tui::strings::tr;
use crate::tui::theme::Theme;

/// Key bindings shown in the guide, paired with their description keys
const KEYS: &[(&str, &str)] = &[
    ("q", "KEY_ACTION_Q"),
    ("p", "KEY_ACTION_P"),
    ("r", "KEY_ACTION_R"),
    ("t", "KEY_ACTION_T"),
    ("s", "KEY_ACTION_S"),
    ("f", "KEY_ACTION_F"),
    ("h", "KEY_ACTION_H"),
    ("k/?", "KEY_ACTION_K"),
    ("l", "KEY_ACTION_L"),
    ("+/-", "KEY_ACTION_WINDOW"),
    ("x", "KEY_ACTION_X"),
    ("e", "KEY_ACTION_E"),
    ("c", "KEY_ACTION_C"),
    ("Up/Down", "KEY_ACTION_SCROLL"),
];

/// Keys guide overlay
pub struct HelpView<'a> {
    theme: &'a Theme,
    lang: Language,
}

impl<'a> HelpView<'a> {
    pub fn new(theme: &'a Theme, lang: Language) -> Self {
        Self { theme, lang }
    }
}

impl Widget for HelpView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup_width = 52.min(area.width.saturating_sub(4));
        let popup_height = (KEYS.len() as u16 + 5).min(area.height.saturating_sub(2));
        let popup_x = area.width.saturating_sub(popup_width) / 2 + area.x;
        let popup_y = area.height.saturating_sub(popup_height) / 2 + area.y;
        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

        Clear.render(popup_area, buf);

        let block = Block::default()
            .title(format!("{}- gms {} ", tr(self.lang, "KEYS_TITLE"), env!("CARGO_PKG_VERSION")))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border));

        let inner = block.inner(popup_area);
        block.render(popup_area, buf);

        let mut lines = vec![Line::from("")];
        lines.extend(KEYS.iter().map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("  {:<9}", key), Style::default().fg(self.theme.shortcut)),
                Span::raw(tr(self.lang, action).to_string()),
            ])
        }));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", tr(self.lang, "KEYS_CLOSE")),
            Style::default().fg(self.theme.text_dim),
        )));

        Paragraph::new(lines).render(inner, buf);
    }
}
