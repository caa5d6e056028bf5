mod core;
mod resources;

pub use self::core::{ClientOptions, GitHubClient};
