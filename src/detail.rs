use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use textwrap::wrap;
use tracing::warn;

use crate::dummyjson::{self, Comment, Post};
use crate::ui::{COLOR_ACCENT, COLOR_SUCCESS, COLOR_TEXT_PRIMARY, COLOR_TEXT_SECONDARY};

/// Detail view for one selected post and its comments.
#[derive(Debug, Clone)]
pub struct DetailState {
    post: Post,
    comments: Vec<Comment>,
    loading: bool,
    request_id: u64,
    pub scroll: u16,
}

impl DetailState {
    /// Opens the view with the comment request `request_id` in flight.
    pub fn open(post: Post, request_id: u64) -> Self {
        Self {
            post,
            comments: Vec::new(),
            loading: true,
            request_id,
            scroll: 0,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Stores the comment outcome. Failures are logged and shown as an
    /// empty list. Returns `false` for a response meant for another request.
    pub fn apply_comments(
        &mut self,
        request_id: u64,
        result: dummyjson::Result<Vec<Comment>>,
    ) -> bool {
        if request_id != self.request_id || !self.loading {
            return false;
        }
        self.loading = false;
        match result {
            Ok(comments) => self.comments = comments,
            Err(err) => {
                warn!(post_id = self.post.id, error = %err, "error fetching comments");
                self.comments.clear();
            }
        }
        true
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = self.scroll as i32 + delta;
        self.scroll = next.clamp(0, u16::MAX as i32) as u16;
    }

    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let width = width.max(10);
        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(Line::from(Span::styled(
            "← Back to Posts (Esc)".to_string(),
            Style::default().fg(COLOR_ACCENT),
        )));
        lines.push(Line::default());

        let title_style = Style::default()
            .fg(COLOR_TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD);
        for row in wrap(&self.post.title, width) {
            lines.push(Line::from(Span::styled(row.into_owned(), title_style)));
        }
        lines.push(Line::default());

        if !self.post.tags.is_empty() {
            let tags = self
                .post
                .tags
                .iter()
                .map(|tag| format!("#{tag}"))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(Line::from(Span::styled(
                tags,
                Style::default().fg(COLOR_ACCENT),
            )));
            lines.push(Line::default());
        }

        let body_style = Style::default().fg(COLOR_TEXT_SECONDARY);
        for row in wrap(&self.post.body, width) {
            lines.push(Line::from(Span::styled(row.into_owned(), body_style)));
        }
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("{} likes", self.post.reactions.likes),
            Style::default().fg(COLOR_SUCCESS),
        )));
        lines.push(Line::default());

        lines.push(Line::from(Span::styled(
            "Comments".to_string(),
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());

        if self.loading {
            lines.push(Line::from(Span::styled(
                "Loading comments...".to_string(),
                body_style,
            )));
        } else if self.comments.is_empty() {
            lines.push(Line::from(Span::styled(
                "No comments yet.".to_string(),
                body_style,
            )));
        } else {
            for comment in &self.comments {
                lines.push(Line::from(Span::styled(
                    comment.author().to_string(),
                    Style::default()
                        .fg(COLOR_TEXT_PRIMARY)
                        .add_modifier(Modifier::BOLD),
                )));
                for row in wrap(&comment.body, width.saturating_sub(2).max(1)) {
                    lines.push(Line::from(Span::styled(format!("  {row}"), body_style)));
                }
                lines.push(Line::default());
            }
        }
        lines
    }
}
