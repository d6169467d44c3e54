pub mod config;
pub mod http;
pub mod listing;
pub mod notify;
pub mod terminal;
