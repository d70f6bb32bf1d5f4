//! Song bot - resolves songs, lyrics, and guesses for chat commands.

pub mod catalog;
pub mod commands;
pub mod engine;
pub mod guess;
pub mod lyrics;
pub mod memo;
pub mod reply;
pub mod session;
pub mod song;
pub mod store;
pub mod telegram;

#[cfg(test)]
mod test_server;

pub use catalog::ItunesCatalog;
pub use commands::{parse_command, Command};
pub use engine::{SongBot, SongBotConfig};
pub use guess::ClaudeGuesser;
pub use lyrics::GeniusLyrics;
pub use telegram::TelegramClient;
