//! Song guessing from a vague hint via a text-generation model.

use std::future::Future;

use tracing::{info, warn};

use crate::claude::{Client, Model, Sampling};

const GUESS_SAMPLING: Sampling = Sampling {
    max_tokens: 60,
    temperature: 0.7,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    Guess(String),
    /// The model answered with nothing usable.
    Empty,
    Failed(String),
}

pub trait Guesser: Send + Sync {
    fn guess(&self, hint: &str) -> impl Future<Output = GuessOutcome> + Send;
}

pub fn guess_prompt(hint: &str) -> String {
    format!(
        r#"You are a music expert. Someone is trying to remember a song and gave this hint:

"{hint}"

Reply with your single best guess in exactly this format: Song Title by Artist Name
Do not add any other text."#
    )
}

/// Trim the completion down to the guess line.
pub fn clean_guess(raw: &str) -> Option<String> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?;
    let line = line.trim_matches(|c| c == '"' || c == '\'').trim();
    if line.is_empty() { None } else { Some(line.to_string()) }
}

pub struct ClaudeGuesser {
    client: Client,
    model: Model,
}

impl ClaudeGuesser {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            model: Model::Haiku,
        }
    }
}

impl Guesser for ClaudeGuesser {
    async fn guess(&self, hint: &str) -> GuessOutcome {
        info!("🤔 Guessing song from hint: {}", hint);

        match self.client.complete(self.model, &guess_prompt(hint), GUESS_SAMPLING).await {
            Ok(text) => match clean_guess(&text) {
                Some(guess) => GuessOutcome::Guess(guess),
                None => GuessOutcome::Empty,
            },
            Err(crate::claude::Error::Empty) => GuessOutcome::Empty,
            Err(e) => {
                warn!("Guess failed: {e}");
                GuessOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_hint_and_format() {
        let prompt = guess_prompt("that song that goes na na na hey hey");
        assert!(prompt.contains("\"that song that goes na na na hey hey\""));
        assert!(prompt.contains("Song Title by Artist Name"));
    }

    #[test]
    fn test_clean_guess() {
        assert_eq!(clean_guess("  Hey Jude by The Beatles \n").as_deref(), Some("Hey Jude by The Beatles"));
        assert_eq!(clean_guess("\n\n\"Yellow by Coldplay\"\nextra").as_deref(), Some("Yellow by Coldplay"));
        assert_eq!(clean_guess("   \n  "), None);
        assert_eq!(clean_guess("\"\""), None);
    }
}
