pub mod auth;
pub mod client;
mod pulls;

pub use pulls::GitHubRemote;
