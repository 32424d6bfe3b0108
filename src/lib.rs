/// Gist Exposed - GitHub gist mirror
///
/// Mirrors a user's gists into a local store and file cache and serves them
/// as static, embeddable pages. GitHub OAuth is the identity provider.
pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod github;
pub mod mirror;
pub mod models;
pub mod oauth;
pub mod path;
pub mod policy;
pub mod server;
pub mod session;
