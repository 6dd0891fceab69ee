use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use textwrap::wrap;
use unicode_width::UnicodeWidthStr;

use crate::dummyjson::Post;
use crate::ui::{
    COLOR_ACCENT, COLOR_PANEL_BG, COLOR_PANEL_SELECTED_BG, COLOR_SUCCESS, COLOR_TEXT_PRIMARY,
    COLOR_TEXT_SECONDARY,
};

pub const EXCERPT_CHARS: usize = 150;
pub const READ_MORE_LABEL: &str = "[ Read More ]";

/// First [`EXCERPT_CHARS`] characters of the body followed by an ellipsis.
pub fn excerpt(body: &str) -> String {
    let head: String = body.chars().take(EXCERPT_CHARS).collect();
    format!("{head}...")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardTarget {
    Body,
    ReadMore,
}

/// A rendered card: its lines plus where the button sits within them.
pub struct CardView {
    pub lines: Vec<Line<'static>>,
    pub button_row: u16,
    pub button_col: u16,
}

impl CardView {
    pub fn height(&self) -> u16 {
        self.lines.len() as u16
    }
}

pub fn render(post: &Post, width: u16, highlighted: bool) -> CardView {
    let width = width.max(READ_MORE_LABEL.len() as u16 + 2);
    let background = if highlighted {
        COLOR_PANEL_SELECTED_BG
    } else {
        COLOR_PANEL_BG
    };
    let title_style = Style::default()
        .fg(if highlighted { COLOR_ACCENT } else { COLOR_TEXT_PRIMARY })
        .bg(background)
        .add_modifier(Modifier::BOLD);
    let body_style = Style::default().fg(COLOR_TEXT_SECONDARY).bg(background);
    let tag_style = Style::default().fg(COLOR_ACCENT).bg(background);

    let mut lines: Vec<Line<'static>> = Vec::new();
    for row in wrap(&post.title, width as usize) {
        lines.push(Line::from(Span::styled(row.into_owned(), title_style)));
    }
    for row in wrap(&excerpt(&post.body), width as usize) {
        lines.push(Line::from(Span::styled(row.into_owned(), body_style)));
    }
    if !post.tags.is_empty() {
        let tags = post
            .tags
            .iter()
            .map(|tag| format!("#{tag}"))
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(Line::from(Span::styled(tags, tag_style)));
    }

    let likes = format!("♥ {}", post.reactions.likes);
    let likes_width = UnicodeWidthStr::width(likes.as_str());
    let button_width = READ_MORE_LABEL.len();
    let gap = (width as usize)
        .saturating_sub(likes_width)
        .saturating_sub(button_width)
        .max(1);
    let button_col = (likes_width + gap) as u16;
    let button_row = lines.len() as u16;
    lines.push(Line::from(vec![
        Span::styled(likes, Style::default().fg(COLOR_SUCCESS).bg(background)),
        Span::styled(" ".repeat(gap), Style::default().bg(background)),
        Span::styled(
            READ_MORE_LABEL.to_string(),
            Style::default()
                .fg(COLOR_PANEL_BG)
                .bg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    CardView {
        lines,
        button_row,
        button_col,
    }
}

/// Screen placement of one card, recorded while drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardRegion {
    pub index: usize,
    pub area: Rect,
    pub button: Rect,
}

impl CardRegion {
    pub fn new(index: usize, area: Rect, view: &CardView) -> Self {
        let button = Rect {
            x: area.x.saturating_add(view.button_col),
            y: area.y.saturating_add(view.button_row),
            width: READ_MORE_LABEL.len() as u16,
            height: 1,
        };
        Self {
            index,
            area,
            button: button.intersection(area),
        }
    }

    pub fn hit(&self, column: u16, row: u16) -> Option<CardTarget> {
        hit_test(self.area, self.button, column, row)
    }
}

/// The innermost target under the pointer. The button lies inside the card,
/// so it wins and the card itself is not reported.
pub fn hit_test(card: Rect, button: Rect, column: u16, row: u16) -> Option<CardTarget> {
    if contains(button, column, row) {
        Some(CardTarget::ReadMore)
    } else if contains(card, column, row) {
        Some(CardTarget::Body)
    } else {
        None
    }
}

/// Finds the card under the pointer and invokes `on_click` once for it.
pub fn dispatch_click<F>(regions: &[CardRegion], column: u16, row: u16, mut on_click: F) -> bool
where
    F: FnMut(usize, CardTarget),
{
    for region in regions {
        if let Some(target) = region.hit(column, row) {
            on_click(region.index, target);
            return true;
        }
    }
    false
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    rect.width > 0
        && rect.height > 0
        && column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_post;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn excerpt_truncates_to_limit() {
        let body = "x".repeat(400);
        let short = excerpt(&body);
        assert_eq!(short.chars().count(), EXCERPT_CHARS + 3);
        assert!(short.ends_with("..."));
        assert_eq!(excerpt("tiny"), "tiny...");
    }

    #[test]
    fn render_places_button_on_last_row() {
        let post = sample_post(4);
        let view = render(&post, 60, false);
        let footer = line_text(view.lines.last().unwrap());
        assert!(footer.starts_with("♥ "));
        assert!(footer.ends_with(READ_MORE_LABEL));
        assert_eq!(view.button_row as usize, view.lines.len() - 1);
        assert_eq!(view.button_col as usize + READ_MORE_LABEL.len(), 60);
        assert!(view.lines.iter().any(|l| line_text(l) == "#sample #demo"));
    }

    #[test]
    fn click_on_button_fires_once() {
        let post = sample_post(1);
        let view = render(&post, 40, false);
        let area = Rect::new(2, 5, 40, view.height());
        let region = CardRegion::new(0, area, &view);

        let mut fired = Vec::new();
        let handled = dispatch_click(&[region], region.button.x + 1, region.button.y, |idx, target| {
            fired.push((idx, target));
        });
        assert!(handled);
        assert_eq!(fired, vec![(0, CardTarget::ReadMore)]);
    }

    #[test]
    fn click_on_body_and_outside() {
        let post = sample_post(1);
        let view = render(&post, 40, true);
        let first = CardRegion::new(0, Rect::new(0, 0, 40, view.height()), &view);
        let second = CardRegion::new(
            1,
            Rect::new(0, view.height() + 1, 40, view.height()),
            &view,
        );
        assert_eq!(first.hit(0, 0), Some(CardTarget::Body));
        assert_eq!(
            hit_test(first.area, first.button, first.button.x, first.button.y),
            Some(CardTarget::ReadMore)
        );
        assert_eq!(second.hit(0, view.height()), None);

        let mut fired = Vec::new();
        dispatch_click(&[first, second], 1, view.height() + 1, |idx, target| {
            fired.push((idx, target));
        });
        assert_eq!(fired, vec![(1, CardTarget::Body)]);

        assert!(!dispatch_click(&[first, second], 100, 100, |_, _| {
            panic!("no card under pointer")
        }));
    }
}
