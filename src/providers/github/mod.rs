mod client;
mod provider;

pub use client::{ClientOptions, GitHubClient};
pub use provider::GitHubProvider;
