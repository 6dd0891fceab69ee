use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://dummyjson.com";

/// Posts per page; also the threshold for the "last page" heuristic.
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    #[error("decode response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Option<Duration>,
    pub http_client: Option<HttpClient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions {
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub dislikes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentUser {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub user: Option<CommentUser>,
    #[serde(default)]
    pub likes: i64,
}

impl Comment {
    pub fn author(&self) -> &str {
        self.user
            .as_ref()
            .map(|user| user.username.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Anonymous")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub skip: i64,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct CommentPage {
    #[serde(default)]
    comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default, alias = "accessToken")]
    pub token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: String,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
}

impl Client {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        if config.user_agent.trim().is_empty() {
            anyhow::bail!("dummyjson client user agent required");
        }
        let base = if config.base_url.trim().is_empty() {
            DEFAULT_API_BASE.to_string()
        } else {
            config.base_url.trim().trim_end_matches('/').to_string()
        };
        let base_url = Url::parse(&format!("{base}/"))?;

        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
        })
    }

    /// Exchanges credentials for a session token.
    ///
    /// A non-2xx reply becomes [`ApiError::Status`] carrying the payload's
    /// `message` field.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let url = self.endpoint("auth/login")?;
        debug!(%url, username, "POST login");
        let resp = self
            .http
            .post(url)
            .header(USER_AGENT, &self.user_agent)
            .json(&LoginRequest { username, password })
            .send()
            .map_err(ApiError::Transport)?;
        let resp = check_status(resp, None)?;
        resp.json().map_err(ApiError::Decode)
    }

    pub fn list_posts(&self, limit: usize, skip: usize) -> Result<PostPage> {
        let mut url = self.endpoint("posts")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("skip", &skip.to_string());
        debug!(%url, "GET posts");
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(ApiError::Transport)?;
        let resp = check_status(resp, Some("Failed to fetch posts"))?;
        resp.json().map_err(ApiError::Decode)
    }

    pub fn search_posts(&self, query: &str) -> Result<PostPage> {
        let mut url = self.endpoint("posts/search")?;
        url.query_pairs_mut().append_pair("q", query);
        debug!(%url, "GET search");
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(ApiError::Transport)?;
        let resp = check_status(resp, Some("Search failed"))?;
        resp.json().map_err(ApiError::Decode)
    }

    pub fn post_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        let url = self.endpoint(&format!("posts/{post_id}/comments"))?;
        debug!(%url, "GET comments");
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(ApiError::Transport)?;
        let resp = check_status(resp, Some("Failed to fetch comments"))?;
        let page: CommentPage = resp.json().map_err(ApiError::Decode)?;
        Ok(page.comments)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

/// Passes 2xx responses through. Otherwise builds [`ApiError::Status`] with
/// `fixed_message` when given, or the payload's `message` field.
fn check_status(resp: Response, fixed_message: Option<&str>) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = match fixed_message {
        Some(message) => message.to_string(),
        None => {
            let body = resp.text().unwrap_or_default();
            let payload: ErrorPayload = serde_json::from_str(&body).unwrap_or_default();
            if payload.message.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                payload.message
            }
        }
    };
    Err(ApiError::Status { status, message })
}

pub fn page_offset(page: usize) -> usize {
    page.saturating_sub(1) * PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_page_size() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 10);
        assert_eq!(page_offset(7), 60);
        assert_eq!(page_offset(0), 0);
    }

    #[test]
    fn comment_author_falls_back_to_anonymous() {
        let named: Comment = serde_json::from_str(
            r#"{"id":1,"body":"hi","user":{"id":3,"username":"emilys"}}"#,
        )
        .unwrap();
        assert_eq!(named.author(), "emilys");

        let missing: Comment = serde_json::from_str(r#"{"id":2,"body":"hi"}"#).unwrap();
        assert_eq!(missing.author(), "Anonymous");

        let blank: Comment =
            serde_json::from_str(r#"{"id":3,"body":"hi","user":{"username":""}}"#).unwrap();
        assert_eq!(blank.author(), "Anonymous");
    }

    #[test]
    fn login_response_accepts_both_token_names() {
        let legacy: LoginResponse =
            serde_json::from_str(r#"{"token":"t1","username":"emilys"}"#).unwrap();
        assert_eq!(legacy.token, "t1");

        let current: LoginResponse = serde_json::from_str(
            r#"{"accessToken":"t2","refreshToken":"r","firstName":"Emily"}"#,
        )
        .unwrap();
        assert_eq!(current.token, "t2");
        assert_eq!(current.first_name, "Emily");
    }

    #[test]
    fn post_ignores_unknown_fields() {
        let post: Post = serde_json::from_str(
            r#"{"id":5,"title":"T","body":"B","tags":["a"],"reactions":{"likes":3,"dislikes":1},"views":9,"userId":2,"extra":true}"#,
        )
        .unwrap();
        assert_eq!(post.reactions.likes, 3);
        assert_eq!(post.user_id, 2);
    }

    #[test]
    fn base_url_is_normalised() {
        let client = Client::new(ClientConfig {
            base_url: "http://127.0.0.1:9/api/".into(),
            user_agent: "test".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint("posts").unwrap().as_str(),
            "http://127.0.0.1:9/api/posts"
        );
    }
}
