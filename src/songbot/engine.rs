//! Command service: routes parsed commands through lookup, lyrics, and guessing.

use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::songbot::catalog::{Catalog, CatalogError};
use crate::songbot::commands::{Command, LyricsQuery, HELP_TEXT};
use crate::songbot::guess::{GuessOutcome, Guesser};
use crate::songbot::lyrics::{LyricsOutcome, LyricsSource};
use crate::songbot::memo::MemoTable;
use crate::songbot::reply::{build_card, escape_html, lyrics_reply, Reply};
use crate::songbot::session::SessionState;
use crate::songbot::song::SongDescriptor;

pub const NO_RESULTS: &str = "❌ No results found.";
pub const CATALOG_UNAVAILABLE: &str = "⚠️ The music catalog is unavailable right now, try again later.";
pub const LYRICS_NOT_FOUND: &str = "❌ Could not find lyrics.";
pub const LYRICS_NEED_SONG: &str = "❗ Please specify a song name or use !wutsong first.";
pub const LYRICS_DISABLED: &str = "📝 Lyrics aren't configured on this bot.";
pub const GUESS_EMPTY: &str = "🤔 I couldn't make a good guess from that.";
pub const GUESS_UNAVAILABLE: &str = "⚠️ Guessing is unavailable right now.";
pub const GUESS_DISABLED: &str = "🤔 Guessing isn't configured on this bot.";
pub const SONG_USAGE: &str = "❗ Usage: !wutsong <query>";
pub const GUESS_USAGE: &str = "❗ Usage: !wutguess <hint>";
pub const COMMAND_FAILED: &str = "⚠️ Something went wrong handling that command.";

/// Song bot configuration.
#[derive(Debug, Clone)]
pub struct SongBotConfig {
    pub memo_max_entries: usize,
    pub memo_ttl: Option<Duration>,
    pub session_max_users: usize,
    /// Budget for each outbound call.
    pub call_timeout: Duration,
}

impl Default for SongBotConfig {
    fn default() -> Self {
        Self {
            memo_max_entries: 1000,
            memo_ttl: Some(Duration::from_secs(24 * 60 * 60)),
            session_max_users: 10_000,
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// The song bot. Shared by every command task.
pub struct SongBot<C, L, G> {
    config: SongBotConfig,
    catalog: C,
    /// `None` disables lyrics.
    lyrics: Option<L>,
    /// `None` disables guessing.
    guesser: Option<G>,
    memo: MemoTable,
    sessions: SessionState,
}

impl<C, L, G> SongBot<C, L, G>
where
    C: Catalog,
    L: LyricsSource,
    G: Guesser,
{
    pub fn new(config: SongBotConfig, catalog: C, lyrics: Option<L>, guesser: Option<G>) -> Self {
        let memo = MemoTable::new(config.memo_max_entries, config.memo_ttl);
        let sessions = SessionState::new(config.session_max_users);
        Self {
            config,
            catalog,
            lyrics,
            guesser,
            memo,
            sessions,
        }
    }

    #[cfg(test)]
    pub(crate) fn memo(&self) -> &MemoTable {
        &self.memo
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &SessionState {
        &self.sessions
    }

    #[cfg(test)]
    pub(crate) fn catalog_ref(&self) -> &C {
        &self.catalog
    }

    #[cfg(test)]
    pub(crate) fn lyrics_ref(&self) -> Option<&L> {
        self.lyrics.as_ref()
    }

    pub async fn handle(&self, user_id: i64, command: Command) -> Reply {
        match command {
            Command::Song(query) => self.wutsong(user_id, &query).await,
            Command::Lyrics(query) => self.wutlyrics(user_id, query).await,
            Command::Guess(hint) => self.wutguess(&hint).await,
            Command::Help => Reply::plain(HELP_TEXT),
        }
    }

    /// Resolve a song, remember it for the user, and build its card.
    pub async fn wutsong(&self, user_id: i64, query: &str) -> Reply {
        let query = query.trim();
        if query.is_empty() {
            return Reply::plain(SONG_USAGE);
        }

        let song = match self.lookup(query).await {
            Ok(Some(song)) => song,
            Ok(None) => {
                info!("No catalog results for '{}'", query);
                return Reply::plain(NO_RESULTS);
            }
            Err(e) => {
                warn!("Catalog lookup failed for '{}': {}", query, e);
                return Reply::plain(CATALOG_UNAVAILABLE);
            }
        };

        self.sessions.record_last_song(user_id, song.clone());

        let snippet = match self.fetch_lyrics(&song.artist, &song.title).await {
            Some(LyricsOutcome::Found(text)) => Some(text),
            Some(other) => {
                debug!("No lyrics snippet for {}: {:?}", song.display(), other);
                None
            }
            None => None,
        };

        info!("🎵 Resolved '{}' to {}", query, song.display());
        Reply::Card(build_card(&song, snippet.as_deref()))
    }

    /// Lyrics for an explicit song, or the user's last `!wutsong` result.
    pub async fn wutlyrics(&self, user_id: i64, query: Option<LyricsQuery>) -> Reply {
        if self.lyrics.is_none() {
            return Reply::plain(LYRICS_DISABLED);
        }

        let query = match query {
            Some(query) if !query.title.is_empty() => query,
            Some(_) => return Reply::plain(LYRICS_NEED_SONG),
            None => match self.sessions.last_song(user_id) {
                Some(song) => LyricsQuery {
                    artist: song.artist,
                    title: song.title,
                },
                None => return Reply::plain(LYRICS_NEED_SONG),
            },
        };

        match self.fetch_lyrics(&query.artist, &query.title).await {
            Some(LyricsOutcome::Found(text)) => lyrics_reply(&query.title, &text),
            Some(LyricsOutcome::NotFound) | None => Reply::plain(LYRICS_NOT_FOUND),
            Some(LyricsOutcome::ProviderError(e)) => {
                warn!("Error in !wutlyrics: {}", e);
                Reply::plain(&format!("⚠️ Error getting lyrics: {e}"))
            }
        }
    }

    pub async fn wutguess(&self, hint: &str) -> Reply {
        let Some(ref guesser) = self.guesser else {
            return Reply::plain(GUESS_DISABLED);
        };
        let hint = hint.trim();
        if hint.is_empty() {
            return Reply::plain(GUESS_USAGE);
        }

        let outcome = tokio::time::timeout(self.config.call_timeout, guesser.guess(hint))
            .await
            .unwrap_or_else(|_| GuessOutcome::Failed("timed out".to_string()));

        match outcome {
            GuessOutcome::Guess(guess) => {
                Reply::Text(format!("🎶 My best guess: <b>{}</b>", escape_html(&guess)))
            }
            GuessOutcome::Empty => Reply::plain(GUESS_EMPTY),
            GuessOutcome::Failed(e) => {
                warn!("Guess failed: {}", e);
                Reply::plain(GUESS_UNAVAILABLE)
            }
        }
    }

    /// Memo first, catalog on a miss. Only hits are memoized.
    async fn lookup(&self, query: &str) -> Result<Option<SongDescriptor>, CatalogError> {
        if let Some(song) = self.memo.get(query) {
            debug!("Memo hit for '{}'", query);
            return Ok(Some(song));
        }

        let result = tokio::time::timeout(self.config.call_timeout, self.catalog.search(query))
            .await
            .map_err(|_| CatalogError::Timeout)??;

        if let Some(ref song) = result {
            self.memo.put(query, song.clone());
            trace!(queries = ?self.memo.queries(), "Memo holds {} entries", self.memo.len());
        }
        Ok(result)
    }

    /// `None` when lyrics are disabled.
    async fn fetch_lyrics(&self, artist: &str, title: &str) -> Option<LyricsOutcome> {
        let lyrics = self.lyrics.as_ref()?;
        // search + page fetch
        let budget = self.config.call_timeout * 2;
        let outcome = tokio::time::timeout(budget, lyrics.fetch(artist, title))
            .await
            .unwrap_or_else(|_| LyricsOutcome::ProviderError("lyrics lookup timed out".to_string()));
        Some(outcome)
    }
}
