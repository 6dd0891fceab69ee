use std::sync::Arc;

use parking_lot::Mutex;

use crate::dummyjson::{self, ApiError, Comment, LoginResponse, Post, PAGE_SIZE};

pub trait AuthService: Send + Sync {
    fn login(&self, username: &str, password: &str) -> dummyjson::Result<LoginResponse>;
}

pub trait FeedService: Send + Sync {
    /// Loads one 1-based page of [`PAGE_SIZE`] posts.
    fn load_page(&self, page: usize) -> dummyjson::Result<Vec<Post>>;
    fn search(&self, query: &str) -> dummyjson::Result<Vec<Post>>;
}

pub trait CommentService: Send + Sync {
    fn load_comments(&self, post_id: i64) -> dummyjson::Result<Vec<Comment>>;
}

pub struct DummyJsonAuthService {
    client: Arc<dummyjson::Client>,
}

impl DummyJsonAuthService {
    pub fn new(client: Arc<dummyjson::Client>) -> Self {
        Self { client }
    }
}

impl AuthService for DummyJsonAuthService {
    fn login(&self, username: &str, password: &str) -> dummyjson::Result<LoginResponse> {
        self.client.login(username, password)
    }
}

pub struct DummyJsonFeedService {
    client: Arc<dummyjson::Client>,
}

impl DummyJsonFeedService {
    pub fn new(client: Arc<dummyjson::Client>) -> Self {
        Self { client }
    }
}

impl FeedService for DummyJsonFeedService {
    fn load_page(&self, page: usize) -> dummyjson::Result<Vec<Post>> {
        self.client
            .list_posts(PAGE_SIZE, dummyjson::page_offset(page))
            .map(|page| page.posts)
    }

    fn search(&self, query: &str) -> dummyjson::Result<Vec<Post>> {
        self.client.search_posts(query).map(|page| page.posts)
    }
}

pub struct DummyJsonCommentService {
    client: Arc<dummyjson::Client>,
}

impl DummyJsonCommentService {
    pub fn new(client: Arc<dummyjson::Client>) -> Self {
        Self { client }
    }
}

impl CommentService for DummyJsonCommentService {
    fn load_comments(&self, post_id: i64) -> dummyjson::Result<Vec<Comment>> {
        self.client.post_comments(post_id)
    }
}

/// Accepts one fixed username/password pair.
pub struct MockAuthService {
    pub username: String,
    pub password: String,
}

impl Default for MockAuthService {
    fn default() -> Self {
        Self {
            username: "emilys".into(),
            password: "emilyspass".into(),
        }
    }
}

impl AuthService for MockAuthService {
    fn login(&self, username: &str, password: &str) -> dummyjson::Result<LoginResponse> {
        if username == self.username && password == self.password {
            Ok(LoginResponse {
                token: format!("mock-token-{username}"),
                username: username.into(),
                first_name: "Emily".into(),
                last_name: "Johnson".into(),
            })
        } else {
            Err(ApiError::Status {
                status: reqwest::StatusCode::BAD_REQUEST,
                message: "Invalid credentials".into(),
            })
        }
    }
}

/// Serves pages out of a fixed in-memory collection and records which
/// pages were requested.
#[derive(Default)]
pub struct MockFeedService {
    posts: Vec<Post>,
    requested_pages: Mutex<Vec<usize>>,
}

impl MockFeedService {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            requested_pages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sample_posts(count: usize) -> Self {
        Self::new((1..=count as i64).map(sample_post).collect())
    }

    pub fn requested_pages(&self) -> Vec<usize> {
        self.requested_pages.lock().clone()
    }
}

impl FeedService for MockFeedService {
    fn load_page(&self, page: usize) -> dummyjson::Result<Vec<Post>> {
        self.requested_pages.lock().push(page);
        Ok(self
            .posts
            .iter()
            .skip(dummyjson::page_offset(page))
            .take(PAGE_SIZE)
            .cloned()
            .collect())
    }

    fn search(&self, query: &str) -> dummyjson::Result<Vec<Post>> {
        let needle = query.to_lowercase();
        Ok(self
            .posts
            .iter()
            .filter(|post| {
                post.title.to_lowercase().contains(&needle)
                    || post.body.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockCommentService {
    pub fail: bool,
}

impl CommentService for MockCommentService {
    fn load_comments(&self, post_id: i64) -> dummyjson::Result<Vec<Comment>> {
        if self.fail {
            return Err(ApiError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to fetch comments".into(),
            });
        }
        Ok(vec![
            Comment {
                id: post_id * 100 + 1,
                body: "Great read.".into(),
                user: Some(dummyjson::CommentUser {
                    username: "michaelw".into(),
                }),
                likes: 2,
            },
            Comment {
                id: post_id * 100 + 2,
                body: "Posted without an account.".into(),
                user: None,
                likes: 0,
            },
        ])
    }
}

pub fn sample_post(id: i64) -> Post {
    Post {
        id,
        title: format!("Sample post {id}"),
        body: format!("Body text for sample post number {id}."),
        tags: vec!["sample".into(), "demo".into()],
        reactions: dummyjson::Reactions {
            likes: (id * 7) % 13,
            dislikes: id % 3,
        },
        views: id * 10,
        user_id: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_feed_pages_by_offset() {
        let service = MockFeedService::with_sample_posts(25);
        let first = service.load_page(1).unwrap();
        let third = service.load_page(3).unwrap();
        assert_eq!(first.len(), PAGE_SIZE);
        assert_eq!(first[0].id, 1);
        assert_eq!(third.len(), 5);
        assert_eq!(third[0].id, 21);
        assert_eq!(service.requested_pages(), vec![1, 3]);
    }

    #[test]
    fn mock_auth_checks_credentials() {
        let service = MockAuthService::default();
        assert!(service.login("emilys", "emilyspass").is_ok());
        let err = service.login("emilys", "nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
    }
}
