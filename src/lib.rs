pub mod auth;
pub mod config;
pub mod dora;
pub mod error;
pub mod insights;
pub mod providers;
pub mod signals;

pub use dora::{collect_dora_report, compute_dora_metrics};
