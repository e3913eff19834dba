use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Audience scope of a status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    /// Followers-only
    Private,
    Direct,
}

impl Visibility {
    /// Replies the bot was asked for never go to the public timeline
    pub fn downgrade_public(self) -> Self {
        match self {
            Visibility::Public => Visibility::Unlisted,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    /// `user` for local accounts, `user@domain` for remote ones
    pub acct: String,
    /// Account is flagged as automated
    #[serde(default)]
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub account: Account,
    /// HTML body
    #[serde(default)]
    pub content: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    /// Content warning, empty when absent
    #[serde(default)]
    pub spoiler_text: String,
}

/// Notification payload from the streaming or REST API
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub account: Account,
    #[serde(default)]
    pub status: Option<Status>,
}

/// Incoming event from the user stream
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `account` mentioned the bot in `status`
    Mention { account: Account, status: Status },
    /// `account` followed the bot
    Follow { account: Account },
    /// A new status appeared on the home timeline
    PostUpdate { status: Status },
}

impl Event {
    /// Map a notification to an event. Notification types the bot does not
    /// react to (favourites, boosts, polls...) yield `None`.
    pub fn from_notification(notification: Notification) -> Option<Self> {
        match notification.notification_type.as_str() {
            "mention" => match notification.status {
                Some(status) => Some(Event::Mention {
                    account: notification.account,
                    status,
                }),
                None => {
                    log::warn!(
                        "Mention notification from @{} carried no status",
                        notification.account.acct
                    );
                    None
                }
            },
            "follow" => Some(Event::Follow {
                account: notification.account,
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Mention { .. } => "mention",
            Event::Follow { .. } => "follow",
            Event::PostUpdate { .. } => "update",
        }
    }
}

/// Reply ready to be posted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingReply {
    #[serde(rename = "status")]
    pub body: String,
    pub in_reply_to_id: String,
    pub visibility: Visibility,
    pub spoiler_text: String,
}

/// Outcome of dispatching a single event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    /// Event filtered out (automated account, self, ...)
    Ignored,
    /// New post below the long-post threshold
    NotLong,
    Followed,
    Replied { status_id: String },
    /// Handling failed; already logged
    Failed(String),
}
