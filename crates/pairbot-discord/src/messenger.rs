//! [`Messenger`] backed by the Discord REST API.
//!
//! Only `Arc<Http>` is needed, so the messenger keeps working across gateway
//! reconnects and can be handed to the trigger before the gateway is up.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::CreateThread;
use serenity::http::{Http, HttpError};
use serenity::model::channel::{AutoArchiveDuration, ChannelType};
use serenity::model::id::{ChannelId, GuildId, UserId};
use tracing::{debug, warn};

use pairbot_core as pairbot;
use pairbot_engine::{Conversation, Member, Messenger, MessengerError};

use crate::send::say;

/// Discord caps thread names at 100 characters.
const THREAD_NAME_MAX: usize = 100;

pub struct SerenityMessenger {
    http: Arc<Http>,
}

impl SerenityMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn status_of(e: &serenity::Error) -> Option<u16> {
    match e {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
            Some(resp.status_code.as_u16())
        }
        _ => None,
    }
}

fn to_messenger_error(e: serenity::Error) -> MessengerError {
    match status_of(&e) {
        Some(403) => MessengerError::Forbidden(e.to_string()),
        _ => MessengerError::Platform(e.to_string()),
    }
}

#[async_trait]
impl Messenger for SerenityMessenger {
    async fn resolve_member(
        &self,
        guild: pairbot::GuildId,
        user: pairbot::UserId,
    ) -> Result<Option<Member>, MessengerError> {
        match GuildId::new(guild.get())
            .member(&self.http, UserId::new(user.get()))
            .await
        {
            Ok(member) => Ok(Some(Member {
                id: user,
                display_name: member.display_name().to_string(),
            })),
            Err(e) if status_of(&e) == Some(404) => {
                debug!(%guild, %user, "member not found");
                Ok(None)
            }
            Err(e) => Err(to_messenger_error(e)),
        }
    }

    async fn resolve_conversation(
        &self,
        id: pairbot::ConversationId,
    ) -> Result<Option<Conversation>, MessengerError> {
        match ChannelId::new(id.get()).to_channel(&self.http).await {
            Ok(channel) => Ok(Some(Conversation {
                id,
                name: channel.guild().map(|c| c.name).unwrap_or_default(),
            })),
            Err(e) if status_of(&e) == Some(404) => Ok(None),
            Err(e) => Err(to_messenger_error(e)),
        }
    }

    async fn create_group_conversation(
        &self,
        parent: pairbot::ChannelId,
        title: &str,
        members: &[pairbot::UserId],
    ) -> Result<pairbot::ConversationId, MessengerError> {
        let name: String = title.chars().take(THREAD_NAME_MAX).collect();
        let thread = ChannelId::new(parent.get())
            .create_thread(
                &self.http,
                CreateThread::new(name)
                    .kind(ChannelType::PrivateThread)
                    .auto_archive_duration(AutoArchiveDuration::OneWeek),
            )
            .await
            .map_err(to_messenger_error)?;

        // Mentions in the first post invite members as well.
        for member in members {
            if let Err(e) = thread
                .id
                .add_thread_member(&self.http, UserId::new(member.get()))
                .await
            {
                warn!(thread = %thread.id, user = %member, error = %e, "could not add thread member");
            }
        }
        Ok(pairbot::ConversationId(thread.id.get()))
    }

    async fn post_message(
        &self,
        to: pairbot::ConversationId,
        text: &str,
    ) -> Result<(), MessengerError> {
        say(&self.http, ChannelId::new(to.get()), text)
            .await
            .map_err(to_messenger_error)
    }

    async fn send_direct(&self, to: pairbot::UserId, text: &str) -> Result<(), MessengerError> {
        let dm = UserId::new(to.get())
            .create_dm_channel(&self.http)
            .await
            .map_err(to_messenger_error)?;
        say(&self.http, dm.id, text)
            .await
            .map_err(to_messenger_error)
    }
}
