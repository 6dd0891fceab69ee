//! Post list state: pagination, remote search, local filter, sort and
//! selection.
//!
//! The state never performs I/O itself. Operations that need data return a
//! [`FetchRequest`]; the caller runs it and hands the outcome back through
//! [`FeedState::apply_fetch`]. Each request carries an id and only the most
//! recent one is accepted, so a slow response can never overwrite newer
//! state.

use std::cmp::Ordering;

use crate::dummyjson::{Post, PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Default,
    Likes,
    Title,
}

impl SortMode {
    pub const ALL: [SortMode; 3] = [SortMode::Default, SortMode::Likes, SortMode::Title];

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Default => "Default",
            SortMode::Likes => "Most Liked",
            SortMode::Title => "Title",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortMode::Default => SortMode::Likes,
            SortMode::Likes => SortMode::Title,
            SortMode::Title => SortMode::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Page(usize),
    Search(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: u64,
    pub kind: FetchKind,
}

#[derive(Debug)]
pub struct FeedState {
    posts: Vec<Post>,
    current_page: usize,
    loading: bool,
    error: Option<String>,
    search_term: String,
    sort: SortMode,
    selected: Option<Post>,
    cursor: usize,
    next_request_id: u64,
    pending: Option<u64>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            current_page: 1,
            loading: false,
            error: None,
            search_term: String::new(),
            sort: SortMode::Default,
            selected: None,
            cursor: 0,
            next_request_id: 1,
            pending: None,
        }
    }

    /// Clears everything for a new session. Request ids keep counting so a
    /// reply issued before the reset can never match a later request.
    pub fn reset(&mut self) {
        let next_request_id = self.next_request_id;
        *self = Self::new();
        self.next_request_id = next_request_id;
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn selected(&self) -> Option<&Post> {
        self.selected.as_ref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Fetch for the first page shown after sign-in.
    pub fn start(&mut self) -> FetchRequest {
        self.current_page = 1;
        self.begin(FetchKind::Page(1))
    }

    /// Re-fetches the current page.
    pub fn refresh(&mut self) -> FetchRequest {
        self.begin(FetchKind::Page(self.current_page))
    }

    pub fn can_go_previous(&self) -> bool {
        self.current_page > 1 && !self.loading
    }

    /// Fewer than [`PAGE_SIZE`] held posts is taken as the end of the
    /// collection. After a remote search the held set is the search result,
    /// so the check applies to that instead of a page.
    pub fn can_go_next(&self) -> bool {
        self.posts.len() >= PAGE_SIZE && !self.loading
    }

    pub fn previous_page(&mut self) -> Option<FetchRequest> {
        if !self.can_go_previous() {
            return None;
        }
        self.current_page = self.current_page.saturating_sub(1).max(1);
        Some(self.begin(FetchKind::Page(self.current_page)))
    }

    pub fn next_page(&mut self) -> Option<FetchRequest> {
        if !self.can_go_next() {
            return None;
        }
        self.current_page += 1;
        Some(self.begin(FetchKind::Page(self.current_page)))
    }

    /// Updates the local filter term. No request is issued.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.clamp_cursor();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search_term.push(ch);
        self.clamp_cursor();
    }

    pub fn pop_search_char(&mut self) {
        self.search_term.pop();
        self.clamp_cursor();
    }

    /// Submits the search box. Blank input resets to the first page of the
    /// unfiltered feed.
    pub fn submit_search(&mut self) -> FetchRequest {
        if self.search_term.trim().is_empty() {
            self.current_page = 1;
            return self.begin(FetchKind::Page(1));
        }
        let term = self.search_term.clone();
        self.begin(FetchKind::Search(term))
    }

    /// Applies the outcome of a request. Returns `false` when the response
    /// belongs to a superseded request and was dropped.
    pub fn apply_fetch(&mut self, id: u64, result: Result<Vec<Post>, String>) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        self.pending = None;
        self.loading = false;
        match result {
            Ok(posts) => {
                self.posts = posts;
                self.error = None;
                self.cursor = 0;
            }
            Err(message) => {
                self.error = Some(message);
            }
        }
        true
    }

    /// Drops any in-flight request so its response is ignored.
    pub fn cancel_pending(&mut self) {
        self.pending = None;
        self.loading = false;
    }

    pub fn pending_request(&self) -> Option<u64> {
        self.pending
    }

    /// Re-orders the held posts in place. `Default` leaves the current order
    /// untouched.
    pub fn apply_sort(&mut self, mode: SortMode) {
        self.sort = mode;
        sort_posts(&mut self.posts, mode);
        self.cursor = 0;
    }

    pub fn cycle_sort(&mut self) {
        self.apply_sort(self.sort.next());
    }

    /// Held posts whose title or body contains the search term,
    /// case-insensitively.
    pub fn filtered(&self) -> Vec<&Post> {
        filter_posts(&self.posts, &self.search_term)
    }

    pub fn move_cursor(&mut self, delta: i32) {
        let len = self.filtered().len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as i64 + delta as i64;
        self.cursor = next.clamp(0, len as i64 - 1) as usize;
    }

    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
        self.clamp_cursor();
    }

    pub fn select(&mut self, post: Post) {
        self.selected = Some(post);
    }

    /// Selects the post under the cursor in the filtered view.
    pub fn select_highlighted(&mut self) -> Option<&Post> {
        let post = self.filtered().get(self.cursor).map(|post| (*post).clone())?;
        self.selected = Some(post);
        self.selected.as_ref()
    }

    /// Leaves the detail view. List state is kept as it was.
    pub fn back(&mut self) {
        self.selected = None;
    }

    fn begin(&mut self, kind: FetchKind) -> FetchRequest {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending = Some(id);
        self.loading = true;
        self.error = None;
        FetchRequest { id, kind }
    }

    fn clamp_cursor(&mut self) {
        let len = self.filtered().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }
}

pub fn filter_posts<'a>(posts: &'a [Post], term: &str) -> Vec<&'a Post> {
    let needle = term.to_lowercase();
    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.body.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn sort_posts(posts: &mut [Post], mode: SortMode) {
    match mode {
        SortMode::Default => {}
        SortMode::Likes => posts.sort_by(|a, b| b.reactions.likes.cmp(&a.reactions.likes)),
        SortMode::Title => posts.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
}

/// Case-insensitive ordering; on a case-only tie lowercase sorts first.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    fold(a).cmp(&fold(b)).then_with(|| b.cmp(a))
}
