//! Redrock - Redis-compatible server backed by an embedded ordered store

pub mod config;
pub mod dispatch;
pub mod server;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use server::RedisServer;
