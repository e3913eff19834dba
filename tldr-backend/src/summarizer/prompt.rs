use crate::config::LlmProvider;

const THREAD_INSTRUCTION: &str =
    "Write a TL;DR summary for this conversation. Reply with just the TL;DR and nothing else:";

const SINGLE_POST_INSTRUCTION: &str = "Write a TL;DR summary for this post. Refer to the Original poster as OP. Reply with just the TL;DR and nothing else:";

/// What is being summarized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// A reply chain, requested through a mention
    Thread,
    /// A single long post, summarized unprompted
    SinglePost,
}

/// Prompt ready to hand to a generation backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub provider: LlmProvider,
}

pub fn build_prompt(mode: PromptMode, body: &str) -> String {
    let instruction = match mode {
        PromptMode::Thread => THREAD_INSTRUCTION,
        PromptMode::SinglePost => SINGLE_POST_INSTRUCTION,
    };
    format!("{}\n{}", instruction, body)
}

pub fn build_request(mode: PromptMode, body: &str, provider: LlmProvider) -> GenerationRequest {
    GenerationRequest {
        prompt: build_prompt(mode, body),
        provider,
    }
}
