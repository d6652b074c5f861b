//! `/start` and the reply-keyboard menu.

use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};
use tracing::{info, warn};

use tipline_shared::Sender;

use crate::config::BotConfig;
use crate::error::BotError;

pub const BUTTON_PUBLISH: &str = "📸 send photo / 🎥 video";
pub const BUTTON_ADVERTISING: &str = "💸 advertising";
pub const BUTTON_DELETE: &str = "❌ delete post";

/// A menu interaction recognized from a text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Start,
    Publish,
    Advertising,
    DeletePost,
}

impl MenuAction {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            BUTTON_PUBLISH => return Some(Self::Publish),
            BUTTON_ADVERTISING => return Some(Self::Advertising),
            BUTTON_DELETE => return Some(Self::DeletePost),
            _ => {}
        }

        // `/start`, `/start@bot_name` and `/start <payload>`.
        let command = text.split_whitespace().next()?;
        let command = command.split('@').next().unwrap_or(command);
        (command == "/start").then_some(Self::Start)
    }
}

pub fn keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![
        vec![KeyboardButton::new(BUTTON_PUBLISH)],
        vec![
            KeyboardButton::new(BUTTON_ADVERTISING),
            KeyboardButton::new(BUTTON_DELETE),
        ],
    ])
    .resize_keyboard()
}

pub fn greeting(config: &BotConfig) -> String {
    let channel = &config.channel_handle;
    format!(
        "👋 Hi! 👋\n\n\
         🤖 This bot collects posts for the channel:\n\
         ⬇️⬇️⬇️\n\
         {channel}\n\
         ⬆️⬆️⬆️\n\n\
         🎭 All photos and texts are published anonymously.\n\n\
         ✅ Every post is reviewed before publication.\n\n\
         ❌ You can have a post removed for stars.\n\n\
         💸 Advertising information is available here as well."
    )
}

pub fn publish_prompt() -> &'static str {
    "✅ You are about to submit a post!\n📩 Send photos/videos and, optionally, a text"
}

pub fn advertising_info(config: &BotConfig) -> String {
    format!(
        "{BUTTON_ADVERTISING}\n\n\
         We can publish your advertising post for a set period, \
         pin your advertising text in the comments for a set period, \
         or, if you run a channel on a related topic, \
         arrange a mutual promotion.\n\n\
         For details and prices, contact our moderator: {}",
        config.moderator_handle
    )
}

pub fn delete_info(config: &BotConfig) -> String {
    format!(
        "{BUTTON_DELETE}\n\n\
         Any post (except advertising) can be removed for a number of stars. \
         The amount depends on the post, ask our moderator.\n\n\
         Contact our moderator: {}",
        config.moderator_handle
    )
}

/// Notice posted to the review chat when someone starts the bot.
pub fn new_user_notice(sender: &Sender) -> String {
    let name = sender.first_name.as_deref().unwrap_or("—");
    let username = match sender.username.as_deref() {
        Some(handle) => format!("@{handle}"),
        None => "missing".to_string(),
    };
    format!(
        "🆕 New bot user\n\n👤 Name: {name}\n🔗 Username: {username}\n🆔 ID: {}",
        sender.user_id
    )
}

/// Reply to a menu interaction.
pub async fn respond(
    bot: &Bot,
    msg: &Message,
    action: MenuAction,
    sender: Option<&Sender>,
    config: &BotConfig,
) -> Result<(), BotError> {
    let chat = msg.chat.id;
    match action {
        MenuAction::Start => {
            bot.send_message(chat, greeting(config))
                .reply_markup(keyboard())
                .await?;

            if let Some(sender) = sender {
                info!(user = sender.user_id, "New user started the bot");
                let review = ChatId(config.review_chat.0);
                if let Err(e) = bot.send_message(review, new_user_notice(sender)).await {
                    warn!(error = %e, "Failed to announce new user to review chat");
                }
            }
        }
        MenuAction::Publish => {
            bot.send_message(chat, publish_prompt()).await?;
        }
        MenuAction::Advertising => {
            bot.send_message(chat, advertising_info(config)).await?;
        }
        MenuAction::DeletePost => {
            bot.send_message(chat, delete_info(config)).await?;
        }
    }
    Ok(())
}
