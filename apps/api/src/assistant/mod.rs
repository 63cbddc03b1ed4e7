// Q&A over the site log, with submission gated by AI rate limits.

pub mod handlers;
pub mod prompts;
pub mod qa;
pub mod rate_limit;
pub mod sessions;

pub use qa::{Answerer, LlmAnswerer};
pub use rate_limit::SubmitGate;
pub use sessions::SessionStore;
