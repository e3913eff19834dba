use crate::channels::SocialClient;
use crate::channels::types::Status;
use crate::summarizer::html::extract_text_from_html;
use std::collections::{HashSet, VecDeque};

/// Maximum number of ancestors fetched above the mentioned status
pub const MAX_THREAD_DEPTH: usize = 64;

/// One post of a thread as "author: text"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub author: String,
    pub text: String,
}

impl TranscriptLine {
    pub fn from_status(status: &Status) -> Self {
        Self {
            author: status.account.username.clone(),
            text: extract_text_from_html(&status.content),
        }
    }
}

impl std::fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}

/// Thread contents, root first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: VecDeque<TranscriptLine>,
}

impl Transcript {
    /// Insert an ancestor before everything collected so far
    pub fn prepend(&mut self, line: TranscriptLine) {
        self.lines.push_front(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &TranscriptLine> {
        self.lines.iter()
    }

    /// Lines joined by blank lines, as sent to the model
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Walk the reply chain from `leaf` up to the thread root.
///
/// Best effort: a failed fetch ends the walk and whatever was collected is
/// returned. The walk also stops after `MAX_THREAD_DEPTH` ancestors or when a
/// status id repeats.
pub async fn assemble_thread(client: &dyn SocialClient, leaf: &Status) -> Transcript {
    let mut transcript = Transcript::default();
    transcript.prepend(TranscriptLine::from_status(leaf));

    let mut visited = HashSet::from([leaf.id.clone()]);
    let mut parent_id = leaf.in_reply_to_id.clone();
    let mut depth = 0;

    while let Some(id) = parent_id.take() {
        if depth >= MAX_THREAD_DEPTH {
            log::warn!(
                "Thread: Reached max depth ({}) above status {}, truncating",
                MAX_THREAD_DEPTH,
                leaf.id
            );
            break;
        }
        if !visited.insert(id.clone()) {
            log::warn!("Thread: Status {} already visited (reply cycle), truncating", id);
            break;
        }

        match client.fetch_status(&id).await {
            Ok(parent) => {
                transcript.prepend(TranscriptLine::from_status(&parent));
                parent_id = parent.in_reply_to_id;
                depth += 1;
            }
            Err(e) => {
                log::warn!("Thread: Error fetching parent status {}: {}", id, e);
                break;
            }
        }
    }

    log::debug!(
        "Thread: Assembled {} post(s) ending at status {}",
        transcript.lines().count(),
        leaf.id
    );
    transcript
}
