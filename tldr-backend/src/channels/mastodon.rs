//! Mastodon REST client and user-stream listener
//!
//! The listener holds one server-sent events connection to the user stream
//! and hands every decoded event to the dispatcher, one at a time. Dropped
//! connections are re-opened until shutdown.

use crate::channels::SocialClient;
use crate::channels::dispatcher::EventDispatcher;
use crate::channels::streaming::{SseFrame, SseParser};
use crate::channels::types::{Account, Event, Notification, OutgoingReply, Status};
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Error bodies longer than this are cut in log and error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Pause before re-opening a dropped user stream
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub struct MastodonClient {
    client: Client,
    base_url: String,
    access_token: String,
}

/// Only the id of a freshly posted status is needed
#[derive(Debug, Deserialize)]
struct PostedStatus {
    id: String,
}

impl MastodonClient {
    pub fn new(server: &str, access_token: &str) -> BotResult<Self> {
        let base = url::Url::parse(server.trim())
            .map_err(|e| BotError::Config(format!("Invalid Mastodon server URL '{}': {}", server, e)))?;
        if access_token.trim().is_empty() {
            return Err(BotError::Config("Mastodon access token is empty".to_string()));
        }

        Ok(Self {
            client: crate::http::shared_client().clone(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            access_token: access_token.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Look up the account the token belongs to
    pub async fn verify_credentials(&self) -> BotResult<Account> {
        let response = self
            .client
            .get(self.api_url("accounts/verify_credentials"))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BotError::Config(format!("Request failed: {}", e)))?;

        read_json(response, |msg| BotError::Config(format!("Invalid credentials: {}", msg))).await
    }

    /// Open the authenticated user stream (home timeline + notifications).
    ///
    /// The token also goes in the query string: instances with a separate
    /// streaming host answer with a cross-host redirect, and the
    /// `Authorization` header is dropped when following it.
    pub async fn open_user_stream(&self) -> BotResult<Response> {
        let response = self
            .client
            .get(self.api_url("streaming/user"))
            .query(&[("access_token", self.access_token.as_str())])
            .bearer_auth(&self.access_token)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| BotError::Stream(format!("Failed to connect: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Stream(format!(
                "API error ({}): {}",
                status,
                truncate(&body)
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl SocialClient for MastodonClient {
    async fn fetch_status(&self, id: &str) -> BotResult<Status> {
        let response = self
            .client
            .get(self.api_url(&format!("statuses/{}", id)))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BotError::Fetch(format!("Request failed: {}", e)))?;

        read_json(response, BotError::Fetch).await
    }

    async fn post_reply(&self, reply: &OutgoingReply) -> BotResult<String> {
        let response = self
            .client
            .post(self.api_url("statuses"))
            .bearer_auth(&self.access_token)
            .json(reply)
            .send()
            .await
            .map_err(|e| BotError::Post(format!("Request failed: {}", e)))?;

        let posted: PostedStatus = read_json(response, BotError::Post).await?;
        Ok(posted.id)
    }

    async fn follow_account(&self, account_id: &str) -> BotResult<()> {
        let response = self
            .client
            .post(self.api_url(&format!("accounts/{}/follow", account_id)))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| BotError::Post(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Post(format!(
                "API error ({}): {}",
                status,
                truncate(&body)
            )));
        }
        Ok(())
    }
}

/// Read a JSON body, mapping transport, status and parse failures through
/// `to_error`
async fn read_json<T: DeserializeOwned>(
    response: Response,
    to_error: impl Fn(String) -> BotError,
) -> BotResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| to_error(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        return Err(to_error(format!("API error ({}): {}", status, truncate(&body))));
    }

    serde_json::from_str(&body).map_err(|e| to_error(format!("Failed to parse response: {}", e)))
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        format!("{}...", body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>())
    } else {
        body.to_string()
    }
}

/// Turn a stream frame into an event. Unknown event types and payloads that
/// fail to decode yield `None`.
pub fn decode_frame(frame: &SseFrame) -> Option<Event> {
    match frame.event.as_deref() {
        Some("update") => match serde_json::from_str::<Status>(&frame.data) {
            Ok(status) => Some(Event::PostUpdate { status }),
            Err(e) => {
                log::warn!("Mastodon: Failed to decode update payload: {}", e);
                None
            }
        },
        Some("notification") => match serde_json::from_str::<Notification>(&frame.data) {
            Ok(notification) => {
                let kind = notification.notification_type.clone();
                let event = Event::from_notification(notification);
                if event.is_none() {
                    log::debug!("Mastodon: Skipping {} notification", kind);
                }
                event
            }
            Err(e) => {
                log::warn!("Mastodon: Failed to decode notification payload: {}", e);
                None
            }
        },
        other => {
            log::debug!("Mastodon: Skipping stream event {:?}", other);
            None
        }
    }
}

/// How a single stream connection ended
enum StreamEnd {
    Shutdown,
    Dropped(BotError),
}

/// Start the Mastodon user-stream listener.
///
/// Returns `Ok(())` on shutdown. Failing to open the first connection is
/// fatal; after that, read errors and server-side closes are logged and the
/// stream is re-opened.
pub async fn start_mastodon_listener(
    client: Arc<MastodonClient>,
    dispatcher: Arc<EventDispatcher>,
    shutdown_rx: oneshot::Receiver<()>,
) -> BotResult<()> {
    run_listener(client, dispatcher, shutdown_rx, RECONNECT_DELAY).await
}

async fn run_listener(
    client: Arc<MastodonClient>,
    dispatcher: Arc<EventDispatcher>,
    mut shutdown_rx: oneshot::Receiver<()>,
    reconnect_delay: Duration,
) -> BotResult<()> {
    log::info!("Mastodon: Connecting to user stream at {}", client.base_url());
    let mut response = client.open_user_stream().await?;

    loop {
        log::info!("Mastodon: Listening for events");
        match consume_stream(response, &dispatcher, &mut shutdown_rx).await {
            StreamEnd::Shutdown => {
                log::info!("Mastodon listener received shutdown signal");
                return Ok(());
            }
            StreamEnd::Dropped(e) => log::warn!("Mastodon: {}, reconnecting", e),
        }

        response = loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    log::info!("Mastodon listener received shutdown signal");
                    return Ok(());
                }
                _ = tokio::time::sleep(reconnect_delay) => {}
            }
            match client.open_user_stream().await {
                Ok(response) => break response,
                Err(e) => log::warn!("Mastodon: Reconnect failed: {}", e),
            }
        };
    }
}

/// Read one connection until it ends, dispatching events in order
async fn consume_stream(
    response: Response,
    dispatcher: &EventDispatcher,
    shutdown_rx: &mut oneshot::Receiver<()>,
) -> StreamEnd {
    let mut stream = response.bytes_stream();
    let mut parser = SseParser::new();

    loop {
        tokio::select! {
            _ = &mut *shutdown_rx => return StreamEnd::Shutdown,
            chunk = stream.next() => {
                let bytes = match chunk {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => {
                        return StreamEnd::Dropped(BotError::Stream(format!(
                            "Failed to read stream: {}",
                            e
                        )));
                    }
                    None => {
                        return StreamEnd::Dropped(BotError::Stream(
                            "Stream closed by server".to_string(),
                        ));
                    }
                };

                for frame in parser.push(&bytes) {
                    let Some(event) = decode_frame(&frame) else {
                        continue;
                    };
                    let kind = event.kind();
                    let result = dispatcher.dispatch(event).await;
                    log::debug!("Mastodon: {} event handled: {:?}", kind, result);
                }
            }
        }
    }
}
