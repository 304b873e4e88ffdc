pub mod adapter;
pub mod commands;
pub mod error;
pub mod handler;
pub mod messenger;
pub mod send;

pub use adapter::DiscordAdapter;
pub use error::DiscordError;
pub use messenger::SerenityMessenger;
