//! Recording social client for tests

use super::SocialClient;
use super::types::{Account, OutgoingReply, Status, Visibility};
use crate::error::{BotError, BotResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves statuses from a map and records every outbound call
#[derive(Default)]
pub struct MockSocialClient {
    statuses: HashMap<String, Status>,
    fail_posts: bool,
    fail_follows: bool,
    fetched: Mutex<Vec<String>>,
    posted: Mutex<Vec<OutgoingReply>>,
    followed: Mutex<Vec<String>>,
}

impl MockSocialClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.statuses.insert(status.id.clone(), status);
        self
    }

    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn failing_follows(mut self) -> Self {
        self.fail_follows = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().unwrap().len()
    }

    pub fn posted(&self) -> Vec<OutgoingReply> {
        self.posted.lock().unwrap().clone()
    }

    pub fn followed(&self) -> Vec<String> {
        self.followed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SocialClient for MockSocialClient {
    async fn fetch_status(&self, id: &str) -> BotResult<Status> {
        self.fetched.lock().unwrap().push(id.to_string());
        self.statuses
            .get(id)
            .cloned()
            .ok_or_else(|| BotError::Fetch(format!("API error (404 Not Found): status {}", id)))
    }

    async fn post_reply(&self, reply: &OutgoingReply) -> BotResult<String> {
        // Failed attempts are recorded too, so tests can count them
        let mut posted = self.posted.lock().unwrap();
        posted.push(reply.clone());
        if self.fail_posts {
            return Err(BotError::Post("API error (500 Internal Server Error)".to_string()));
        }
        Ok(format!("reply-{}", posted.len()))
    }

    async fn follow_account(&self, account_id: &str) -> BotResult<()> {
        self.followed.lock().unwrap().push(account_id.to_string());
        if self.fail_follows {
            return Err(BotError::Post("API error (403 Forbidden)".to_string()));
        }
        Ok(())
    }
}

pub fn account(username: &str) -> Account {
    Account {
        id: format!("{}-id", username),
        username: username.to_string(),
        acct: username.to_string(),
        bot: false,
    }
}

/// Public, content-warning-free status by `username`
pub fn status(id: &str, username: &str, content: &str, parent: Option<&str>) -> Status {
    Status {
        id: id.to_string(),
        account: account(username),
        content: content.to_string(),
        visibility: Visibility::Public,
        in_reply_to_id: parent.map(str::to_string),
        spoiler_text: String::new(),
    }
}
