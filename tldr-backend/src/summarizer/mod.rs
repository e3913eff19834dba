//! Thread reconstruction and summarization pipeline pieces
//!
//! html -> detector gate / thread walk -> prompt -> (ai backend) -> sanitize

pub mod detector;
pub mod html;
pub mod prompt;
pub mod sanitize;
pub mod thread;

pub use detector::is_long_post;
pub use html::extract_text_from_html;
pub use prompt::{GenerationRequest, PromptMode, build_request};
pub use sanitize::sanitize_response;
pub use thread::assemble_thread;
