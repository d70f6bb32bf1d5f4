//! Parsing of `!`-prefixed chat commands.

use std::sync::LazyLock;

use regex::Regex;

static COMMAND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*!(wutsong|wutlyrics|wutguess|wuthelp)(?:@\w+)?(?:\s+(.*))?$").unwrap()
});

/// Separates artist from title in a lyrics request.
const ARTIST_TITLE_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!wutsong <query>`. The query may be empty; the handler answers with usage.
    Song(String),
    /// `!wutlyrics [<artist> - <title> | <title>]`
    Lyrics(Option<LyricsQuery>),
    /// `!wutguess <hint>`
    Guess(String),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    pub artist: String,
    pub title: String,
}

impl LyricsQuery {
    /// "Artist - Title" splits on the first separator; anything else is a bare title.
    pub fn parse(arg: &str) -> Self {
        match arg.split_once(ARTIST_TITLE_SEPARATOR) {
            Some((artist, title)) => Self {
                artist: artist.trim().to_string(),
                title: title.trim().to_string(),
            },
            None => Self {
                artist: String::new(),
                title: arg.trim().to_string(),
            },
        }
    }
}

/// `None` for anything that isn't one of our commands.
pub fn parse_command(text: &str) -> Option<Command> {
    let caps = COMMAND_RE.captures(text)?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let arg = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let command = match name.as_str() {
        "wutsong" => Command::Song(arg.to_string()),
        "wutlyrics" if arg.is_empty() => Command::Lyrics(None),
        "wutlyrics" => Command::Lyrics(Some(LyricsQuery::parse(arg))),
        "wutguess" => Command::Guess(arg.to_string()),
        "wuthelp" => Command::Help,
        _ => return None,
    };
    Some(command)
}

pub const HELP_TEXT: &str = "🎵 Commands:
!wutsong <query> - look up a song
!wutlyrics [<artist> - <title> | <title>] - get lyrics (defaults to your last !wutsong)
!wutguess <hint> - guess a song from a vague description";
