//! CLI commands module.

mod audio;
mod context;
mod matching;
mod util;

pub use audio::AudioCommand;
pub use context::ContextCommand;
pub use matching::MatchCommand;

pub(crate) use util::*;
