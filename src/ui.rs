use std::io::{self, Stdout};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, Sender};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use tracing::{debug, info, warn};

use crate::card::{self, CardRegion};
use crate::data::{AuthService, CommentService, FeedService};
use crate::detail::DetailState;
use crate::dummyjson::{self, Comment, Post};
use crate::feed::{FeedState, FetchKind, FetchRequest, SortMode};
use crate::login::{self, LoginError, LoginField, LoginForm, LoginSuccess};
use crate::session;

pub(crate) const COLOR_BG: Color = Color::Rgb(30, 30, 46);
pub(crate) const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
pub(crate) const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
pub(crate) const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
pub(crate) const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
pub(crate) const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
pub(crate) const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
pub(crate) const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
pub(crate) const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
pub(crate) const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
pub(crate) const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const CARD_SPACING: u16 = 1;

struct Spinner {
    index: usize,
    last_tick: Instant,
}

impl Spinner {
    fn new() -> Self {
        Self {
            index: 0,
            last_tick: Instant::now(),
        }
    }

    fn frame(&self) -> &'static str {
        SPINNER_FRAMES[self.index % SPINNER_FRAMES.len()]
    }

    fn advance(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_tick) >= Duration::from_millis(120) {
            self.index = (self.index + 1) % SPINNER_FRAMES.len();
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.last_tick = Instant::now();
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Login,
    Feed,
}

enum AsyncResponse {
    Posts {
        request_id: u64,
        result: Result<Vec<Post>, String>,
    },
    Comments {
        request_id: u64,
        result: dummyjson::Result<Vec<Comment>>,
    },
    Login {
        request_id: u64,
        result: Result<LoginSuccess, LoginError>,
    },
}

#[derive(Clone)]
pub struct Options {
    pub status_message: String,
    pub session: Arc<session::Manager>,
    pub auth_service: Arc<dyn AuthService + Send + Sync>,
    pub feed_service: Arc<dyn FeedService + Send + Sync>,
    pub comment_service: Arc<dyn CommentService + Send + Sync>,
}

pub struct Model {
    screen: Screen,
    status_message: String,
    session: Arc<session::Manager>,
    auth_service: Arc<dyn AuthService + Send + Sync>,
    feed_service: Arc<dyn FeedService + Send + Sync>,
    comment_service: Arc<dyn CommentService + Send + Sync>,
    login_form: LoginForm,
    feed: FeedState,
    detail: Option<DetailState>,
    search_focused: bool,
    list_offset: usize,
    card_regions: Vec<CardRegion>,
    pending_login: Option<u64>,
    next_request_id: u64,
    response_tx: Sender<AsyncResponse>,
    response_rx: Receiver<AsyncResponse>,
    spinner: Spinner,
    needs_redraw: bool,
}

impl Model {
    pub fn new(opts: Options) -> Self {
        let (response_tx, response_rx) = unbounded();
        let screen = if opts.session.is_authenticated() {
            Screen::Feed
        } else {
            Screen::Login
        };
        let mut model = Self {
            screen,
            status_message: opts.status_message,
            session: opts.session,
            auth_service: opts.auth_service,
            feed_service: opts.feed_service,
            comment_service: opts.comment_service,
            login_form: LoginForm::default(),
            feed: FeedState::new(),
            detail: None,
            search_focused: false,
            list_offset: 0,
            card_regions: Vec::new(),
            pending_login: None,
            next_request_id: 1,
            response_tx,
            response_rx,
            spinner: Spinner::new(),
            needs_redraw: true,
        };
        if model.screen == Screen::Feed {
            let req = model.feed.start();
            model.dispatch_fetch(req);
        }
        model
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        stdout.execute(EnterAlternateScreen)?;
        stdout.execute(EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(DisableMouseCapture)?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        let tick_rate = Duration::from_millis(120);

        loop {
            if self.poll_async() {
                self.mark_dirty();
            }

            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(16));

            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            Ok(true) => break,
                            Ok(false) => {}
                            Err(err) => {
                                self.status_message = format!("Error: {}", err);
                                self.mark_dirty();
                            }
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(_, _) => self.mark_dirty(),
                    _ => {}
                }
            }

            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                if self.is_loading() {
                    if self.spinner.advance() {
                        self.mark_dirty();
                    }
                } else {
                    self.spinner.reset();
                }
            }
        }

        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn is_loading(&self) -> bool {
        self.pending_login.is_some()
            || self.feed.is_loading()
            || self.detail.as_ref().is_some_and(DetailState::is_loading)
    }

    /// Returns `true` when the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        let quit = match self.screen {
            Screen::Login => self.handle_login_key(key.code),
            Screen::Feed if self.detail.is_some() => self.handle_detail_key(key.code)?,
            Screen::Feed if self.search_focused => {
                self.handle_search_key(key.code);
                false
            }
            Screen::Feed => self.handle_feed_key(key.code)?,
        };
        self.mark_dirty();
        Ok(quit)
    }

    fn handle_login_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Down => self.login_form.next(),
            KeyCode::BackTab | KeyCode::Up => self.login_form.previous(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => self.login_form.backspace(),
            KeyCode::Delete => self.login_form.clear_active(),
            KeyCode::Char(ch) if !ch.is_control() => self.login_form.insert_char(ch),
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.search_focused = false,
            KeyCode::Enter => {
                self.search_focused = false;
                let req = self.feed.submit_search();
                self.status_message = match &req.kind {
                    FetchKind::Search(term) => format!("Searching for \"{term}\"..."),
                    FetchKind::Page(_) => "Search cleared. Loading page 1...".to_string(),
                };
                self.dispatch_fetch(req);
            }
            KeyCode::Backspace => self.feed.pop_search_char(),
            KeyCode::Char(ch) if !ch.is_control() => self.feed.push_search_char(ch),
            _ => {}
        }
    }

    fn handle_feed_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('j') | KeyCode::Down => self.feed.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.feed.move_cursor(-1),
            KeyCode::Enter => {
                if self.feed.select_highlighted().is_some() {
                    self.open_detail();
                }
            }
            KeyCode::Char('/') => self.search_focused = true,
            KeyCode::Char('s') => {
                self.feed.cycle_sort();
                self.list_offset = 0;
                self.status_message = format!("Sorted by {}.", self.feed.sort().label());
            }
            KeyCode::Char(digit @ '1'..='3') => {
                let index = digit as usize - '1' as usize;
                self.feed.apply_sort(SortMode::ALL[index]);
                self.list_offset = 0;
                self.status_message = format!("Sorted by {}.", self.feed.sort().label());
            }
            KeyCode::Char('h') | KeyCode::Left => self.previous_page(),
            KeyCode::Char('l') | KeyCode::Right => self.next_page(),
            KeyCode::Char('r') => {
                let req = self.feed.refresh();
                self.dispatch_fetch(req);
            }
            KeyCode::Char('L') => self.logout()?,
            _ => {}
        }
        Ok(false)
    }

    fn handle_detail_key(&mut self, code: KeyCode) -> Result<bool> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => self.back_to_list(),
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.scroll_by(1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.scroll_by(-1);
                }
            }
            KeyCode::PageDown | KeyCode::Char(' ') => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.scroll_by(10);
                }
            }
            KeyCode::PageUp => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.scroll_by(-10);
                }
            }
            KeyCode::Char('L') => self.logout()?,
            _ => {}
        }
        Ok(false)
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if self.screen != Screen::Feed || self.detail.is_some() {
            return;
        }
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let mut clicked = None;
                card::dispatch_click(&self.card_regions, event.column, event.row, |index, _| {
                    clicked = Some(index);
                });
                if let Some(index) = clicked {
                    self.feed.set_cursor(index);
                    if self.feed.select_highlighted().is_some() {
                        self.open_detail();
                    }
                    self.mark_dirty();
                }
            }
            MouseEventKind::ScrollDown => {
                self.feed.move_cursor(1);
                self.mark_dirty();
            }
            MouseEventKind::ScrollUp => {
                self.feed.move_cursor(-1);
                self.mark_dirty();
            }
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.login_form.username.is_empty() || self.login_form.password.is_empty() {
            self.login_form.finish_submit(&Err(LoginError::MissingFields));
            return;
        }
        let Some((username, password)) = self.login_form.begin_submit() else {
            return;
        };
        let request_id = self.take_request_id();
        self.pending_login = Some(request_id);
        self.spinner.reset();

        let tx = self.response_tx.clone();
        let service = self.auth_service.clone();
        thread::spawn(move || {
            let result = login::submit_login(service.as_ref(), &username, &password);
            let _ = tx.send(AsyncResponse::Login { request_id, result });
        });
    }

    fn handle_login_success(&mut self, success: LoginSuccess) {
        if let Err(err) = self.session.login(&success.token) {
            warn!(error = %err, "persisting session token failed");
            self.login_form
                .set_message(format!("Could not save session: {err}"));
            return;
        }
        self.screen = Screen::Feed;
        self.feed.reset();
        self.detail = None;
        self.search_focused = false;
        self.list_offset = 0;
        self.status_message = format!("Welcome, {}.", success.display_name);
        let req = self.feed.start();
        self.dispatch_fetch(req);
    }

    /// Ends the session. In-flight responses are discarded once they land.
    pub fn logout(&mut self) -> Result<()> {
        self.session.logout()?;
        self.feed.cancel_pending();
        self.feed.reset();
        self.detail = None;
        self.search_focused = false;
        self.list_offset = 0;
        self.card_regions.clear();
        self.pending_login = None;
        self.login_form.reset();
        self.screen = Screen::Login;
        self.status_message = "Signed out.".to_string();
        info!("logged out");
        Ok(())
    }

    fn previous_page(&mut self) {
        if let Some(req) = self.feed.previous_page() {
            self.list_offset = 0;
            self.dispatch_fetch(req);
        }
    }

    fn next_page(&mut self) {
        if let Some(req) = self.feed.next_page() {
            self.list_offset = 0;
            self.dispatch_fetch(req);
        }
    }

    fn back_to_list(&mut self) {
        self.feed.back();
        self.detail = None;
    }

    fn open_detail(&mut self) {
        let Some(post) = self.feed.selected().cloned() else {
            return;
        };
        let request_id = self.take_request_id();
        let post_id = post.id;
        self.search_focused = false;
        self.detail = Some(DetailState::open(post, request_id));
        self.spinner.reset();

        let tx = self.response_tx.clone();
        let service = self.comment_service.clone();
        thread::spawn(move || {
            let result = service.load_comments(post_id);
            let _ = tx.send(AsyncResponse::Comments { request_id, result });
        });
    }

    fn dispatch_fetch(&mut self, req: FetchRequest) {
        let FetchRequest { id, kind } = req;
        self.spinner.reset();
        let tx = self.response_tx.clone();
        let service = self.feed_service.clone();
        thread::spawn(move || {
            let result = match &kind {
                FetchKind::Page(page) => service.load_page(*page),
                FetchKind::Search(query) => service.search(query),
            }
            .map_err(|err| {
                warn!(?kind, error = %err, "post fetch failed");
                err.to_string()
            });
            let _ = tx.send(AsyncResponse::Posts {
                request_id: id,
                result,
            });
        });
    }

    fn take_request_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }

    pub fn poll_async(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.response_rx.try_recv() {
            self.handle_async_response(message);
            changed = true;
        }
        changed
    }

    fn handle_async_response(&mut self, message: AsyncResponse) {
        match message {
            AsyncResponse::Posts { request_id, result } => {
                let failed = result.is_err();
                if !self.feed.apply_fetch(request_id, result) {
                    debug!(request_id, "dropping superseded posts response");
                    return;
                }
                self.list_offset = 0;
                if !failed {
                    self.status_message = format!(
                        "Page {} · {} posts",
                        self.feed.current_page(),
                        self.feed.posts().len()
                    );
                }
            }
            AsyncResponse::Comments { request_id, result } => {
                let Some(detail) = self.detail.as_mut() else {
                    return;
                };
                if !detail.apply_comments(request_id, result) {
                    debug!(request_id, "dropping comments for a closed post");
                }
            }
            AsyncResponse::Login { request_id, result } => {
                if self.pending_login != Some(request_id) {
                    return;
                }
                self.pending_login = None;
                self.login_form.finish_submit(&result);
                if let Ok(success) = result {
                    self.handle_login_success(success);
                }
            }
        }
        self.mark_dirty();
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_text = if self.is_loading() {
            format!("{} {}", self.spinner.frame(), self.status_message)
                .trim()
                .to_string()
        } else {
            self.status_message.clone()
        };
        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        match self.screen {
            Screen::Login => {
                self.card_regions.clear();
                self.draw_login(frame, layout[1]);
            }
            Screen::Feed => {
                if self.detail.is_some() {
                    self.card_regions.clear();
                    self.draw_detail(frame, layout[1]);
                } else {
                    self.draw_feed(frame, layout[1]);
                }
            }
        }

        let footer = Paragraph::new(self.footer_text())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(footer, layout[2]);
    }

    fn pane_block(title: &str, focused: bool) -> Block<'static> {
        let border_style = if focused {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };
        let title_style = if focused {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        Block::default()
            .title(Span::styled(title.to_string(), title_style))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::horizontal(1))
    }

    fn draw_login(&self, frame: &mut Frame<'_>, area: Rect) {
        let popup_area = centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);
        let form = Paragraph::new(self.login_body())
            .block(Self::pane_block("Login", true))
            .wrap(Wrap { trim: false });
        frame.render_widget(form, popup_area);
    }

    fn login_body(&self) -> Text<'static> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        lines.push(Line::default());
        for field in [LoginField::Username, LoginField::Password, LoginField::Submit] {
            lines.push(self.login_field_line(field));
        }
        if let Some(message) = &self.login_form.message {
            lines.push(Line::default());
            let lowered = message.to_lowercase();
            let style = if lowered.contains("fail") || lowered.contains("error") {
                Style::default().fg(COLOR_ERROR)
            } else if self.login_form.in_progress {
                Style::default().fg(COLOR_TEXT_SECONDARY)
            } else {
                Style::default().fg(COLOR_SUCCESS)
            };
            lines.push(Line::from(Span::styled(message.clone(), style)));
        }
        lines.push(Line::default());
        let hint = Style::default().fg(COLOR_TEXT_SECONDARY);
        lines.push(Line::from(Span::styled("Demo credentials:".to_string(), hint)));
        lines.push(Line::from(Span::styled(
            format!("Username: {}", login::DEMO_USERNAME),
            hint,
        )));
        lines.push(Line::from(Span::styled(
            format!("Password: {}", login::DEMO_PASSWORD),
            hint,
        )));
        Text::from(lines)
    }

    fn login_field_line(&self, field: LoginField) -> Line<'static> {
        let active = self.login_form.active == field;
        let label_style = if active {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        if field == LoginField::Submit {
            let label = if active { "[ Login ]" } else { "  Login  " };
            return Line::from(Span::styled(label.to_string(), label_style));
        }
        let mut value = self.login_form.display_value(field);
        if active {
            value.push('▏');
        }
        Line::from(vec![
            Span::styled(format!("{:<10}", field.title()), label_style),
            Span::styled(value, Style::default().fg(COLOR_TEXT_PRIMARY)),
        ])
    }

    fn draw_feed(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let block = Self::pane_block("Post Feed", !self.search_focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(self.controls_line()), chunks[0]);
        self.draw_cards(frame, chunks[1]);
        frame.render_widget(
            Paragraph::new(self.pagination_line()).alignment(Alignment::Center),
            chunks[2],
        );
    }

    fn controls_line(&self) -> Line<'static> {
        let search_style = if self.search_focused {
            Style::default()
                .fg(COLOR_TEXT_PRIMARY)
                .bg(COLOR_PANEL_SELECTED_BG)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        let mut term = self.feed.search_term().to_string();
        if self.search_focused {
            term.push('▏');
        } else if term.is_empty() {
            term = "Search posts...".to_string();
        }
        Line::from(vec![
            Span::styled("Search: ".to_string(), Style::default().fg(COLOR_ACCENT)),
            Span::styled(format!("{term:<30}"), search_style),
            Span::raw("   "),
            Span::styled("Sort by: ".to_string(), Style::default().fg(COLOR_ACCENT)),
            Span::styled(
                self.feed.sort().label().to_string(),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            ),
        ])
    }

    fn pagination_line(&self) -> Line<'static> {
        let enabled = Style::default().fg(COLOR_ACCENT);
        let disabled = Style::default()
            .fg(COLOR_BORDER_IDLE)
            .add_modifier(Modifier::DIM);
        Line::from(vec![
            Span::styled(
                "◀ Previous".to_string(),
                if self.feed.can_go_previous() {
                    enabled
                } else {
                    disabled
                },
            ),
            Span::styled(
                format!("   Page {}   ", self.feed.current_page()),
                Style::default().fg(COLOR_TEXT_PRIMARY),
            ),
            Span::styled(
                "Next ▶".to_string(),
                if self.feed.can_go_next() {
                    enabled
                } else {
                    disabled
                },
            ),
        ])
    }

    fn draw_cards(&mut self, frame: &mut Frame<'_>, area: Rect) {
        self.card_regions.clear();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let message = if self.feed.is_loading() {
            Some(("Loading posts...".to_string(), COLOR_TEXT_SECONDARY))
        } else if let Some(error) = self.feed.error() {
            Some((error.to_string(), COLOR_ERROR))
        } else if self.feed.filtered().is_empty() {
            Some(("No posts found.".to_string(), COLOR_TEXT_SECONDARY))
        } else {
            None
        };
        if let Some((text, color)) = message {
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(color))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let cursor = self.feed.cursor();
        let views: Vec<card::CardView> = self
            .feed
            .filtered()
            .iter()
            .enumerate()
            .map(|(idx, post)| card::render(post, area.width, idx == cursor))
            .collect();

        self.list_offset = scroll_offset(&views, self.list_offset, cursor, area.height);

        let mut y = area.y;
        let bottom = area.y.saturating_add(area.height);
        for (idx, view) in views.into_iter().enumerate().skip(self.list_offset) {
            if y >= bottom {
                break;
            }
            let height = view.height().min(bottom - y);
            let rect = Rect {
                x: area.x,
                y,
                width: area.width,
                height,
            };
            self.card_regions.push(CardRegion::new(idx, rect, &view));
            frame.render_widget(Paragraph::new(Text::from(view.lines)), rect);
            y = y.saturating_add(height).saturating_add(CARD_SPACING);
        }
    }

    fn draw_detail(&mut self, frame: &mut Frame<'_>, area: Rect) {
        let Some(detail) = self.detail.as_ref() else {
            return;
        };
        let block = Self::pane_block("Post", true);
        let inner = block.inner(area);
        let lines = detail.lines(inner.width as usize);
        let max_scroll = (lines.len() as u16).saturating_sub(inner.height);
        let scroll = detail.scroll.min(max_scroll);
        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .scroll((scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn footer_text(&self) -> String {
        let parts: Vec<&str> = match self.screen {
            Screen::Login => vec![
                "Tab/Shift-Tab change field",
                "Enter submit",
                "Esc quit",
            ],
            Screen::Feed if self.detail.is_some() => vec![
                "Esc/b back to posts",
                "j/k scroll",
                "L logout",
                "q quit",
            ],
            Screen::Feed if self.search_focused => vec![
                "Type to filter",
                "Enter search",
                "Esc leave search",
            ],
            Screen::Feed => vec![
                "j/k move",
                "Enter read more",
                "/ search",
                "s or 1-3 sort",
                "h/l page",
                "r refresh",
                "L logout",
                "q quit",
            ],
        };
        parts.join(" · ")
    }

    /// Rendered once without a real terminal, for tests.
    pub fn render_to<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    pub fn feed(&self) -> &FeedState {
        &self.feed
    }

    pub fn detail(&self) -> Option<&DetailState> {
        self.detail.as_ref()
    }

    pub fn card_regions(&self) -> &[CardRegion] {
        &self.card_regions
    }
}

/// First card to draw so that the card under the cursor is fully visible.
fn scroll_offset(views: &[card::CardView], offset: usize, cursor: usize, height: u16) -> usize {
    if views.is_empty() {
        return 0;
    }
    let cursor = cursor.min(views.len() - 1);
    let mut offset = offset.min(cursor);
    loop {
        let used: u32 = views[offset..=cursor]
            .iter()
            .map(|view| view.height() as u32 + CARD_SPACING as u32)
            .sum();
        if used <= height as u32 + CARD_SPACING as u32 || offset == cursor {
            return offset;
        }
        offset += 1;
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
