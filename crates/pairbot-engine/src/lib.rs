//! `pairbot-engine`: scheduling and matching logic.
//!
//! The engine is platform-neutral: it reaches the chat platform only through
//! the [`messenger::Messenger`] trait and natural-language dates only through
//! [`dates::DateParser`]. Everything it needs is bundled in [`app::AppState`],
//! which the binary builds once and hands to both the command surface and the
//! daily trigger.

pub mod app;
pub mod commands;
pub mod dates;
pub mod exceptions;
pub mod grouping;
pub mod matching;
pub mod messenger;

pub use app::AppState;
pub use commands::{dispatch, CommandArgs, CommandContext, CommandSpec, OptionKind, COMMANDS};
pub use dates::{DateParser, HumanDateParser};
pub use exceptions::{ExceptionManager, Unskipped};
pub use matching::{MatchingEngine, MatchingResult};
pub use messenger::{Conversation, Member, Messenger, MessengerError};
