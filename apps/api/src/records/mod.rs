pub mod filters;
pub mod handlers;
pub mod repository;
pub mod seed;
pub mod store;

pub use store::LogStore;
