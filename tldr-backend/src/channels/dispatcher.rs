//! Routes stream events to the follow-back, mention and long-post handlers.
//!
//! Each event is handled on its own; nothing carries over between events.
//! Failures are logged and reported through `DispatchResult`, never raised.

use crate::ai::LlmClient;
use crate::channels::SocialClient;
use crate::channels::types::{Account, DispatchResult, Event, OutgoingReply, Status, Visibility};
use crate::summarizer::{
    PromptMode, assemble_thread, build_request, extract_text_from_html, is_long_post,
    sanitize_response,
};
use std::sync::Arc;

/// Posted in place of a summary when a requested summary could not be generated
pub const APOLOGY_PREFIX: &str = "uh oh, something went wrong. can't summarize this thread.\n";

/// Prefix marking a content warning as belonging to a reply
const REPLY_CW_PREFIX: &str = "re:";

pub struct EventDispatcher {
    social: Arc<dyn SocialClient>,
    llm: LlmClient,
    /// The bot's own handle; mentions from it are never answered
    bot_handle: Option<String>,
}

impl EventDispatcher {
    pub fn new(social: Arc<dyn SocialClient>, llm: LlmClient, bot_handle: Option<String>) -> Self {
        Self {
            social,
            llm,
            bot_handle,
        }
    }

    pub async fn dispatch(&self, event: Event) -> DispatchResult {
        log::debug!("Dispatcher: Handling {} event", event.kind());
        match event {
            Event::Follow { account } => self.handle_follow(&account).await,
            Event::Mention { account, status } => self.handle_mention(&account, &status).await,
            Event::PostUpdate { status } => self.check_for_long_post(&status).await,
        }
    }

    fn is_self(&self, account: &Account) -> bool {
        self.bot_handle
            .as_deref()
            .map(|handle| account.acct.eq_ignore_ascii_case(handle))
            .unwrap_or(false)
    }

    async fn handle_follow(&self, account: &Account) -> DispatchResult {
        if account.bot {
            log::debug!("Dispatcher: Not following back automated account @{}", account.acct);
            return DispatchResult::Ignored;
        }

        match self.social.follow_account(&account.id).await {
            Ok(()) => {
                log::info!("Dispatcher: Followed back @{} ({})", account.acct, account.id);
                DispatchResult::Followed
            }
            Err(e) => {
                log::error!("Dispatcher: Error following back @{}: {}", account.acct, e);
                DispatchResult::Failed(e.to_string())
            }
        }
    }

    async fn handle_mention(&self, account: &Account, status: &Status) -> DispatchResult {
        if account.bot || status.account.bot {
            log::debug!("Dispatcher: Ignoring mention from automated account @{}", account.acct);
            return DispatchResult::Ignored;
        }
        if self.is_self(account) {
            log::debug!("Dispatcher: Ignoring own mention in status {}", status.id);
            return DispatchResult::Ignored;
        }

        log::info!(
            "Dispatcher: @{} asked for a summary of status {}",
            account.acct,
            status.id
        );

        let transcript = assemble_thread(self.social.as_ref(), status).await;
        let request = build_request(PromptMode::Thread, &transcript.render(), self.llm.provider());

        // A requested summary always gets an answer, even if it is an apology
        let summary = match self.llm.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Dispatcher: Error summarizing thread: {}", e);
                format!("{}{}", APOLOGY_PREFIX, e)
            }
        };

        let reply = compose_reply(
            &account.acct,
            &sanitize_response(&summary),
            status,
            status.visibility.downgrade_public(),
        );
        self.send_reply(&reply).await
    }

    async fn check_for_long_post(&self, status: &Status) -> DispatchResult {
        if status.account.bot || self.is_self(&status.account) {
            return DispatchResult::Ignored;
        }

        let content = extract_text_from_html(&status.content);
        if !is_long_post(&content) {
            return DispatchResult::NotLong;
        }

        log::info!(
            "Dispatcher: Status {} by @{} is long, generating TL;DR",
            status.id,
            status.account.acct
        );

        let request = build_request(PromptMode::SinglePost, &content, self.llm.provider());

        // Unsolicited summaries fail silently
        let summary = match self.llm.generate(&request).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Dispatcher: Error generating TL;DR: {}", e);
                return DispatchResult::Failed(e.to_string());
            }
        };

        let reply = compose_reply(
            &status.account.acct,
            &sanitize_response(&summary),
            status,
            status.visibility,
        );
        self.send_reply(&reply).await
    }

    async fn send_reply(&self, reply: &OutgoingReply) -> DispatchResult {
        match self.social.post_reply(reply).await {
            Ok(status_id) => {
                log::info!(
                    "Dispatcher: Posted reply {} to status {}: {}",
                    status_id,
                    reply.in_reply_to_id,
                    reply.body
                );
                DispatchResult::Replied { status_id }
            }
            Err(e) => {
                log::error!(
                    "Dispatcher: Error posting reply to status {}: {}",
                    reply.in_reply_to_id,
                    e
                );
                DispatchResult::Failed(e.to_string())
            }
        }
    }
}

/// Content warning for a reply: copied from the original and marked "re: "
/// unless it already is.
pub fn reply_spoiler_text(spoiler_text: &str) -> String {
    if spoiler_text.is_empty() || spoiler_text.starts_with(REPLY_CW_PREFIX) {
        spoiler_text.to_string()
    } else {
        format!("{} {}", REPLY_CW_PREFIX, spoiler_text)
    }
}

pub fn compose_reply(
    recipient_acct: &str,
    summary: &str,
    original: &Status,
    visibility: Visibility,
) -> OutgoingReply {
    OutgoingReply {
        body: format!("@{} TL;DR: {}", recipient_acct, summary),
        in_reply_to_id: original.id.clone(),
        visibility,
        spoiler_text: reply_spoiler_text(&original.spoiler_text),
    }
}
