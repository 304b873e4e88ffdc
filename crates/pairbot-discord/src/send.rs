use std::borrow::Cow;

use serenity::http::Http;
use serenity::model::id::ChannelId;

/// Discord's per-message limit, counted in characters.
const MESSAGE_MAX: usize = 2000;

/// `text` cut to fit one Discord message, marked with a trailing ellipsis
/// when something was dropped.
pub fn fit_message(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MESSAGE_MAX - 1) {
        Some((cut, _)) if text[cut..].chars().nth(1).is_some() => {
            Cow::Owned(format!("{}…", &text[..cut]))
        }
        _ => Cow::Borrowed(text),
    }
}

/// Post `text` to `channel` as a single message.
pub async fn say(http: &Http, channel: ChannelId, text: &str) -> Result<(), serenity::Error> {
    channel.say(http, fit_message(text)).await?;
    Ok(())
}
