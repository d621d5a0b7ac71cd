//! The gigalixir platform as seen through its CLI

mod client;
pub mod types;

pub use client::GigalixirCli;
pub use types::{
    find_available, find_by_id, App, AppStatus, Configs, Confirmation, Credentials, Database,
    DatabaseId, DatabaseState,
};
