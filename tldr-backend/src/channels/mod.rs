pub mod dispatcher;
pub mod mastodon;
pub mod streaming;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use dispatcher::EventDispatcher;
pub use mastodon::MastodonClient;
use types::{OutgoingReply, Status};

use crate::error::BotResult;
use async_trait::async_trait;

/// Outbound calls the pipeline makes against the social network.
///
/// `MastodonClient` is the production implementation; tests use
/// `mock::MockSocialClient`.
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Fetch a single status by id
    async fn fetch_status(&self, id: &str) -> BotResult<Status>;

    /// Post a reply, returning the new status id
    async fn post_reply(&self, reply: &OutgoingReply) -> BotResult<String>;

    /// Follow an account
    async fn follow_account(&self, account_id: &str) -> BotResult<()>;
}
