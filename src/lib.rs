#![warn(
    rust_2024_compatibility,
    clippy::all,
    clippy::future_not_send,
    clippy::mod_module_files,
    clippy::needless_pass_by_ref_mut,
    clippy::unused_async
)]

//! Client for the GOPROXY module proxy protocol.
//!
//! Resolve a `GOPROXY`-style specification with [`resolver::resolve`], build a
//! [`GoproxyClient`] for the resulting endpoint, and list a module's published
//! versions with [`GoproxyClient::get_versions`].

pub mod client;
pub mod config;
pub mod error;
pub mod resolver;
pub mod retry;
pub mod versions;

pub use client::GoproxyClient;
pub use error::GoproxyError;
pub use resolver::{ProxyEndpoint, resolve};
pub use retry::RetryPolicy;
pub use versions::VersionList;
