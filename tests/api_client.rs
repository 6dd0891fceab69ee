use std::io::Read;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use postfeed_tui::data::{AuthService, DummyJsonAuthService, DummyJsonFeedService, FeedService};
use postfeed_tui::dummyjson::{ApiError, Client, ClientConfig};
use postfeed_tui::login::{self, LoginError};
use tiny_http::{Header, Response, Server};

struct Recorded {
    method: String,
    url: String,
    body: String,
}

struct Fixture {
    base_url: String,
    requests: Receiver<Recorded>,
    handle: JoinHandle<()>,
}

impl Fixture {
    /// Serves `replies` in order, one per incoming request, then stops.
    fn serve(replies: Vec<(u16, &'static str)>) -> Self {
        let server = Server::http("127.0.0.1:0").expect("bind fixture server");
        let addr = server.server_addr().to_ip().expect("ip listener");
        let (tx, rx) = unbounded();
        let handle = thread::spawn(move || {
            for (status, body) in replies {
                let mut request = match server.recv_timeout(Duration::from_secs(5)) {
                    Ok(Some(request)) => request,
                    _ => return,
                };
                let mut received = String::new();
                let _ = request.as_reader().read_to_string(&mut received);
                let _ = tx.send(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: received,
                });
                let header = Header::from_bytes("Content-Type", "application/json")
                    .expect("static header");
                let _ = request.respond(
                    Response::from_string(body)
                        .with_status_code(status)
                        .with_header(header),
                );
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
            handle,
        }
    }

    fn client(&self) -> Arc<Client> {
        Arc::new(
            Client::new(ClientConfig {
                base_url: self.base_url.clone(),
                user_agent: "postfeed-tui/test".into(),
                timeout: Some(Duration::from_secs(5)),
                http_client: None,
            })
            .expect("client"),
        )
    }

    fn next_request(&self) -> Recorded {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("request recorded")
    }

    fn finish(self) {
        self.handle.join().expect("fixture thread");
    }
}

const PAGE_BODY: &str = r#"{
  "posts": [
    {"id": 21, "title": "His mother had always taught him", "body": "His mother had always taught him not to ever think of himself as better than others.", "tags": ["history", "american"], "reactions": {"likes": 192, "dislikes": 25}, "views": 305, "userId": 121},
    {"id": 22, "title": "He was an expert but not in a discipline", "body": "He was an expert but not in a discipline that anyone could fully appreciate.", "tags": ["french"], "reactions": {"likes": 859, "dislikes": 32}, "views": 4884, "userId": 91}
  ],
  "total": 251,
  "skip": 20,
  "limit": 10
}"#;

#[test]
fn login_posts_credentials_and_reads_token() {
    let fixture = Fixture::serve(vec![(
        200,
        r#"{"id":1,"username":"emilys","firstName":"Emily","lastName":"Johnson","accessToken":"jwt-abc","refreshToken":"r-1"}"#,
    )]);
    let service = DummyJsonAuthService::new(fixture.client());

    let success = login::submit_login(&service, "emilys", "emilyspass").expect("login");
    assert_eq!(success.token, "jwt-abc");
    assert_eq!(success.display_name, "Emily Johnson");

    let request = fixture.next_request();
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/auth/login");
    let sent: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(
        sent,
        serde_json::json!({"username": "emilys", "password": "emilyspass"})
    );
    fixture.finish();
}

#[test]
fn legacy_token_field_is_accepted() {
    let fixture = Fixture::serve(vec![(200, r#"{"username":"emilys","token":"legacy"}"#)]);
    let service = DummyJsonAuthService::new(fixture.client());
    let response = service.login("emilys", "emilyspass").expect("login");
    assert_eq!(response.token, "legacy");
    fixture.finish();
}

#[test]
fn rejected_login_surfaces_server_message() {
    let fixture = Fixture::serve(vec![(400, r#"{"message":"Invalid credentials"}"#)]);
    let service = DummyJsonAuthService::new(fixture.client());

    let err = login::submit_login(&service, "emilys", "wrong").unwrap_err();
    assert_eq!(err.to_string(), "Login failed: Invalid credentials");
    fixture.finish();
}

#[test]
fn unreachable_server_is_a_network_error() {
    let port = {
        let server = Server::http("127.0.0.1:0").expect("bind");
        server.server_addr().to_ip().expect("ip").port()
    };
    let client = Client::new(ClientConfig {
        base_url: format!("http://127.0.0.1:{port}"),
        user_agent: "postfeed-tui/test".into(),
        timeout: Some(Duration::from_secs(2)),
        http_client: None,
    })
    .expect("client");
    let service = DummyJsonAuthService::new(Arc::new(client));

    let err = login::submit_login(&service, "emilys", "emilyspass").unwrap_err();
    assert!(matches!(err, LoginError::Network));
    assert_eq!(err.to_string(), "Network error. Try again.");
}

#[test]
fn page_request_uses_limit_and_skip() {
    let fixture = Fixture::serve(vec![(200, PAGE_BODY)]);
    let service = DummyJsonFeedService::new(fixture.client());

    let posts = service.load_page(3).expect("page");
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, 21);
    assert_eq!(posts[1].reactions.likes, 859);
    assert_eq!(posts[0].tags, vec!["history", "american"]);

    let request = fixture.next_request();
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "/posts?limit=10&skip=20");
    fixture.finish();
}

#[test]
fn search_encodes_query() {
    let fixture = Fixture::serve(vec![(200, PAGE_BODY)]);
    let client = fixture.client();

    let page = client.search_posts("love story").expect("search");
    assert_eq!(page.total, 251);

    let request = fixture.next_request();
    assert_eq!(request.url, "/posts/search?q=love+story");
    fixture.finish();
}

#[test]
fn failed_list_and_search_use_fixed_messages() {
    let fixture = Fixture::serve(vec![
        (500, r#"{"message":"boom"}"#),
        (503, r#"{"message":"down"}"#),
    ]);
    let client = fixture.client();

    let err = client.list_posts(10, 0).unwrap_err();
    assert!(matches!(err, ApiError::Status { .. }));
    assert_eq!(err.to_string(), "Failed to fetch posts");

    let err = client.search_posts("x").unwrap_err();
    assert_eq!(err.to_string(), "Search failed");
    fixture.finish();
}

#[test]
fn comments_fall_back_to_anonymous() {
    let fixture = Fixture::serve(vec![(
        200,
        r#"{"comments":[{"id":1,"body":"This is some awesome thinking!","postId":7,"likes":3,"user":{"id":63,"username":"eburras1q","fullName":"Emmett Burras"}},{"id":2,"body":"No name here","postId":7}],"total":2,"skip":0,"limit":2}"#,
    )]);
    let client = fixture.client();

    let comments = client.post_comments(7).expect("comments");
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author(), "eburras1q");
    assert_eq!(comments[1].author(), "Anonymous");

    let request = fixture.next_request();
    assert_eq!(request.url, "/posts/7/comments");
    fixture.finish();
}
