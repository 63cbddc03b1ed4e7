pub mod chat;
pub mod log_entry;

pub use log_entry::{LogEntry, LogStatus};
