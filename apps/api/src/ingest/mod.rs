// Transcription ingestion: free text and YouTube videos in, LogEntry records out.

pub mod extractor;
pub mod handlers;
pub mod prompts;
pub mod youtube;

pub use extractor::{LlmLogExtractor, LogExtractor};
pub use youtube::YoutubeClient;
