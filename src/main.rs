mod claude;
mod config;
mod songbot;
mod telegram_log;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use config::Config;
use songbot::engine::COMMAND_FAILED;
use songbot::reply::Reply;
use songbot::{
    parse_command, ClaudeGuesser, Command, GeniusLyrics, ItunesCatalog, SongBot, SongBotConfig,
    TelegramClient,
};

type Engine = SongBot<ItunesCatalog, GeniusLyrics, ClaudeGuesser>;

struct BotState {
    engine: Engine,
    telegram: TelegramClient,
}

impl BotState {
    fn new(config: &Config, bot: &Bot) -> Result<Self, String> {
        let catalog = ItunesCatalog::new(config.http_timeout).map_err(|e| e.to_string())?;

        let lyrics = match config.genius_token {
            Some(ref token) => {
                info!("Lyrics enabled");
                Some(GeniusLyrics::new(token.clone(), config.http_timeout)?)
            }
            None => {
                info!("Lyrics disabled (no genius_token)");
                None
            }
        };

        let guesser = match config.anthropic_api_key {
            Some(ref key) => {
                info!("Guessing enabled");
                let client = claude::Client::new(key.clone(), config.http_timeout).map_err(|e| e.to_string())?;
                Some(ClaudeGuesser::new(client))
            }
            None => {
                info!("Guessing disabled (no anthropic_api_key)");
                None
            }
        };

        let engine_config = SongBotConfig {
            memo_max_entries: config.memo_max_entries,
            memo_ttl: config.memo_ttl,
            session_max_users: config.session_max_users,
            call_timeout: config.http_timeout,
        };

        Ok(Self {
            engine: SongBot::new(engine_config, catalog, lyrics, guesser),
            telegram: TelegramClient::new(bot.clone()),
        })
    }
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "wutsong.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let bot = Bot::new(&config.telegram_bot_token);

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("wutsong.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        );

    if let Some(log_chat_id) = config.log_chat_id {
        let tg_layer = telegram_log::TelegramLogLayer::new(bot.clone(), log_chat_id);
        registry.with(tg_layer).init();
    } else {
        registry.init();
    }

    info!("🚀 Starting wutsong bot");

    match bot.get_me().await {
        Ok(me) => info!("Bot user ID: {}, username: @{}", me.id, me.username()),
        Err(e) => warn!("Failed to get bot info: {e}"),
    }

    let state = match BotState::new(&config, &bot) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(command) = parse_command(text) else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let message_id = msg.id.0 as i64;
    let (user_id, username) = match msg.from {
        Some(ref u) => (u.id.0 as i64, u.username.clone().unwrap_or_else(|| u.first_name.clone())),
        None => (chat_id, "unknown".to_string()),
    };

    info!("📨 {:?} from {} ({})", command, username, user_id);

    // Each command runs on its own task so a slow upstream never stalls the dispatcher.
    tokio::spawn(run_command(state, chat_id, message_id, user_id, command));

    Ok(())
}

async fn run_command(state: Arc<BotState>, chat_id: i64, message_id: i64, user_id: i64, command: Command) {
    state.telegram.send_typing(chat_id).await;

    let worker = {
        let state = state.clone();
        tokio::spawn(async move { state.engine.handle(user_id, command).await })
    };

    let reply = match worker.await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Command handler crashed: {e}");
            Reply::plain(COMMAND_FAILED)
        }
    };

    if let Err(e) = state.telegram.deliver(chat_id, reply, Some(message_id)).await {
        warn!("Failed to deliver reply to chat {}: {}", chat_id, e);
    }
}
