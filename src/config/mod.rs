//! Resolution of a [`ScheduleConfig`](crate::domain::schedule::ScheduleConfig)
//! from command line tokens or an interactive prompt.

pub mod interactive;
pub mod tokens;

pub use interactive::{PromptSettings, SettingsSource};
pub use tokens::{Resolution, resolve_tokens};
