//! Telegram client using teloxide.

use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, MessageId, ParseMode, ReplyParameters};
use tracing::{info, warn};

use crate::songbot::reply::{Reply, SongCard};

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Deliver a composed reply, threading it under the triggering message.
    pub async fn deliver(&self, chat_id: i64, reply: Reply, reply_to_message_id: Option<i64>) -> Result<i64, String> {
        match reply {
            Reply::Text(text) => self.send_message(chat_id, &text, reply_to_message_id).await,
            Reply::Card(card) => self.send_card(chat_id, &card, reply_to_message_id).await,
            Reply::Document {
                caption,
                file_name,
                contents,
            } => {
                self.send_document(chat_id, contents, &file_name, &caption, reply_to_message_id)
                    .await
            }
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, String> {
        let chat_id = ChatId(chat_id);
        let mut request = self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Photo with HTML caption when the artwork fits, plain message otherwise.
    async fn send_card(&self, chat_id: i64, card: &SongCard, reply_to_message_id: Option<i64>) -> Result<i64, String> {
        let html = card.to_html();

        if card.fits_caption()
            && let Some(thumbnail) = card.thumbnail.as_deref()
        {
            match self.send_photo_url(chat_id, thumbnail, &html, reply_to_message_id).await {
                Ok(id) => return Ok(id),
                Err(e) => warn!("Falling back to text card: {e}"),
            }
        }

        self.send_message(chat_id, &html, reply_to_message_id).await
    }

    async fn send_photo_url(
        &self,
        chat_id: i64,
        url: &str,
        caption: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, String> {
        let url = reqwest::Url::parse(url).map_err(|e| format!("Invalid artwork URL '{url}': {e}"))?;

        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Html);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        request
            .await
            .map(|msg| msg.id.0 as i64)
            .map_err(|e| format!("Failed to send photo: {e}"))
    }

    /// Send a file from bytes.
    pub async fn send_document(
        &self,
        chat_id: i64,
        contents: Vec<u8>,
        file_name: &str,
        caption: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<i64, String> {
        info!("📄 Sending {} to chat {} ({} bytes)", file_name, chat_id, contents.len());

        let input_file = InputFile::memory(contents).file_name(file_name.to_string());
        let mut request = self
            .bot
            .send_document(ChatId(chat_id), input_file)
            .caption(caption);

        if let Some(msg_id) = reply_to_message_id {
            let reply_params = ReplyParameters::new(MessageId(msg_id as i32));
            request = request.reply_parameters(reply_params);
        }

        request.await.map(|msg| msg.id.0 as i64).map_err(|e| {
            let msg = format!("Failed to send document: {e}");
            warn!("{}", msg);
            msg
        })
    }

    /// Show "typing..." while a command runs.
    pub async fn send_typing(&self, chat_id: i64) {
        if let Err(e) = self.bot.send_chat_action(ChatId(chat_id), ChatAction::Typing).await {
            warn!("Failed to send typing action: {e}");
        }
    }
}
