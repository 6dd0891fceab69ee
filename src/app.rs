use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config;
use crate::data::{self, AuthService, CommentService, FeedService};
use crate::dummyjson;
use crate::logging;
use crate::session;
use crate::storage::{self, KeyValue};
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    logging::init(&cfg.log).context("init logging")?;
    info!(version = crate::VERSION, base_url = %cfg.api.base_url, "starting");

    let store = Arc::new(
        storage::Store::open(storage::Options {
            path: cfg.storage.path.clone(),
        })
        .context("open storage")?,
    );
    let kv: Arc<dyn KeyValue> = store.clone();
    let session = Arc::new(session::Manager::new(kv).context("load session")?);

    let client = Arc::new(
        dummyjson::Client::new(dummyjson::ClientConfig {
            base_url: cfg.api.base_url.clone(),
            user_agent: cfg.api.user_agent.clone(),
            timeout: Some(cfg.api.timeout),
            http_client: None,
        })
        .context("create api client")?,
    );

    let auth_service: Arc<dyn AuthService + Send + Sync> =
        Arc::new(data::DummyJsonAuthService::new(client.clone()));
    let feed_service: Arc<dyn FeedService + Send + Sync> =
        Arc::new(data::DummyJsonFeedService::new(client.clone()));
    let comment_service: Arc<dyn CommentService + Send + Sync> =
        Arc::new(data::DummyJsonCommentService::new(client));

    let status_message = if session.is_authenticated() {
        "Welcome back. Loading posts...".to_string()
    } else {
        "Sign in to browse posts.".to_string()
    };

    let options = ui::Options {
        status_message,
        session: session.clone(),
        auth_service,
        feed_service,
        comment_service,
    };

    let mut model = ui::Model::new(options);
    model.run()?;
    drop(model);
    drop(session);

    match Arc::try_unwrap(store) {
        Ok(store) => store.close()?,
        Err(_) => warn!("storage still shared at exit; leaving connection open"),
    }
    info!("exiting");
    Ok(())
}

/// Clears any persisted session without starting the interface.
pub fn logout_once() -> Result<bool> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    logging::init(&cfg.log).context("init logging")?;
    let store: Arc<dyn KeyValue> = Arc::new(
        storage::Store::open(storage::Options {
            path: cfg.storage.path,
        })
        .context("open storage")?,
    );
    let session = session::Manager::new(store)?;
    let was_signed_in = session.is_authenticated();
    session.logout()?;
    Ok(was_signed_in)
}
