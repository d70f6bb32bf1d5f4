//! Reply composition: song cards, lyrics replies, and their HTML rendering.

use crate::songbot::song::SongDescriptor;

/// Characters of lyrics shown on a song card.
pub const SNIPPET_CHARS: usize = 200;

/// Longest lyrics sent inline; anything longer goes out as a file.
pub const INLINE_LYRICS_LIMIT: usize = 1900;

/// Telegram's text message limit.
pub const MESSAGE_LIMIT: usize = 4096;

/// Telegram's photo caption limit.
pub const CAPTION_LIMIT: usize = 1024;

pub const LYRICS_FILE_NAME: &str = "lyrics.txt";
pub const LYRICS_TOO_LONG_NOTICE: &str = "📄 Lyrics are too long for chat. See attached file:";

const LOW_RES_ARTWORK: &str = "100x100bb";
const HIGH_RES_ARTWORK: &str = "512x512bb";

/// An outbound reply, ready for the chat client to deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// HTML-formatted text.
    Text(String),
    Card(SongCard),
    Document {
        caption: String,
        file_name: String,
        contents: Vec<u8>,
    },
}

impl Reply {
    /// Plain text reply; escapes for HTML.
    pub fn plain(text: &str) -> Self {
        Reply::Text(escape_html(text))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Link { label: String, url: String },
    Quote(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardField {
    pub name: String,
    pub value: FieldValue,
}

impl CardField {
    fn link(name: &str, label: &str, url: String) -> Self {
        Self {
            name: name.to_string(),
            value: FieldValue::Link {
                label: label.to_string(),
                url,
            },
        }
    }
}

/// Rich song reply: titled link, description, thumbnail, and fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SongCard {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
    pub thumbnail: Option<String>,
    pub fields: Vec<CardField>,
}

impl SongCard {
    pub fn to_html(&self) -> String {
        let title = escape_html(&self.title);
        let mut html = match &self.url {
            Some(url) => format!("<b><a href=\"{}\">{}</a></b>", escape_html(url), title),
            None => format!("<b>{}</b>", title),
        };
        html.push('\n');
        html.push_str(&escape_html(&self.description));
        html.push('\n');

        for field in &self.fields {
            html.push('\n');
            match &field.value {
                FieldValue::Link { label, url } => {
                    html.push_str(&format!(
                        "<b>{}</b>: <a href=\"{}\">{}</a>",
                        escape_html(&field.name),
                        escape_html(url),
                        escape_html(label)
                    ));
                }
                FieldValue::Quote(text) => {
                    html.push_str(&format!(
                        "<b>{}</b>\n<blockquote>{}</blockquote>",
                        escape_html(&field.name),
                        escape_html(text)
                    ));
                }
            }
        }

        html
    }

    /// Whether the card can go out as a photo caption.
    pub fn fits_caption(&self) -> bool {
        self.thumbnail.is_some() && self.to_html().chars().count() <= CAPTION_LIMIT
    }
}

/// Swap the catalog's 100px artwork for the 512px variant.
pub fn upgrade_artwork(url: &str) -> String {
    url.replace(LOW_RES_ARTWORK, HIGH_RES_ARTWORK)
}

/// Search links on other platforms, built from "title artist". No API calls.
pub fn search_links(song: &SongDescriptor) -> Vec<CardField> {
    let query = urlencoding::encode(&format!("{} {}", song.title, song.artist)).into_owned();
    vec![
        CardField::link(
            "🔗 YouTube",
            "Search",
            format!("https://www.youtube.com/results?search_query={query}"),
        ),
        CardField::link("🔗 Spotify", "Search", format!("https://open.spotify.com/search/{query}")),
    ]
}

/// First [`SNIPPET_CHARS`] characters, with "..." when cut.
pub fn lyrics_snippet(lyrics: &str) -> String {
    let mut chars = lyrics.chars();
    let snippet: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{snippet}...")
    } else {
        snippet
    }
}

pub fn build_card(song: &SongDescriptor, lyrics: Option<&str>) -> SongCard {
    let mut fields = Vec::new();

    if let Some(preview) = &song.preview_url {
        fields.push(CardField::link("▶️ Preview", "Listen", preview.clone()));
    }
    fields.extend(search_links(song));
    if let Some(lyrics) = lyrics.filter(|l| !l.trim().is_empty()) {
        fields.push(CardField {
            name: "📝 Lyrics (snippet)".to_string(),
            value: FieldValue::Quote(lyrics_snippet(lyrics)),
        });
    }

    SongCard {
        title: song.title.clone(),
        url: song.canonical_url.clone(),
        description: format!("🎤 {}\n💿 {}", song.artist, song.album),
        thumbnail: song.artwork_url.as_deref().map(upgrade_artwork),
        fields,
    }
}

/// Inline text up to [`INLINE_LYRICS_LIMIT`] characters, a file attachment beyond.
///
/// Escaping can grow markup-heavy lyrics past [`MESSAGE_LIMIT`]; those go out
/// as a file too.
pub fn lyrics_reply(title: &str, lyrics: &str) -> Reply {
    if lyrics.chars().count() <= INLINE_LYRICS_LIMIT {
        let text = format!(
            "📝 <b>Lyrics for:</b> <code>{}</code>\n\n{}",
            escape_html(title),
            escape_html(lyrics)
        );
        if text.chars().count() <= MESSAGE_LIMIT {
            return Reply::Text(text);
        }
    }

    Reply::Document {
        caption: LYRICS_TOO_LONG_NOTICE.to_string(),
        file_name: LYRICS_FILE_NAME.to_string(),
        contents: lyrics.as_bytes().to_vec(),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
