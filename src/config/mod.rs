pub mod schema;

pub use schema::{AccountEntry, BrowserOptions, FarmConfig, Platform, WorkerSettings};
