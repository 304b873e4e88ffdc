#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use pairbot_core::{ChannelId, ConversationId, GuildId, UserId};
use pairbot_engine::{AppState, Conversation, HumanDateParser, Member, Messenger, MessengerError};
use pairbot_store::{ChannelRecord, Store};

pub const GUILD: GuildId = GuildId::new(1);
pub const CHANNEL: ChannelId = ChannelId::new(100);

/// In-memory stand-in for the chat platform that records every call.
#[derive(Default)]
pub struct FakeMessenger {
    inner: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    members: HashMap<UserId, String>,
    conversations: HashSet<ConversationId>,
    created: Vec<(ChannelId, String, Vec<UserId>)>,
    posts: Vec<(ConversationId, String)>,
    directs: Vec<(UserId, String)>,
    next_id: u64,
    fail_create: bool,
    fail_resolve: bool,
}

impl FakeMessenger {
    pub fn with_members(members: &[(u64, &str)]) -> Arc<Self> {
        let fake = Self::default();
        {
            let mut s = fake.inner.lock().unwrap();
            s.next_id = 10_000;
            for (id, name) in members {
                s.members.insert(UserId(*id), name.to_string());
            }
        }
        Arc::new(fake)
    }

    pub fn delete_conversation(&self, id: ConversationId) {
        self.inner.lock().unwrap().conversations.remove(&id);
    }

    pub fn fail_create(&self, fail: bool) {
        self.inner.lock().unwrap().fail_create = fail;
    }

    pub fn fail_resolve(&self, fail: bool) {
        self.inner.lock().unwrap().fail_resolve = fail;
    }

    pub fn created(&self) -> Vec<(ChannelId, String, Vec<UserId>)> {
        self.inner.lock().unwrap().created.clone()
    }

    pub fn posts_to(&self, id: ConversationId) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .posts
            .iter()
            .filter(|(to, _)| *to == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn directs(&self) -> Vec<(UserId, String)> {
        self.inner.lock().unwrap().directs.clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn resolve_member(
        &self,
        _guild: GuildId,
        user: UserId,
    ) -> Result<Option<Member>, MessengerError> {
        let s = self.inner.lock().unwrap();
        if s.fail_resolve {
            return Err(MessengerError::Platform("member lookup unavailable".into()));
        }
        Ok(s.members.get(&user).map(|name| Member {
            id: user,
            display_name: name.clone(),
        }))
    }

    async fn resolve_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Option<Conversation>, MessengerError> {
        let s = self.inner.lock().unwrap();
        Ok(s.conversations.contains(&id).then(|| Conversation {
            id,
            name: format!("thread-{id}"),
        }))
    }

    async fn create_group_conversation(
        &self,
        parent: ChannelId,
        title: &str,
        members: &[UserId],
    ) -> Result<ConversationId, MessengerError> {
        let fail = self.inner.lock().unwrap().fail_create;
        if fail {
            return Err(MessengerError::Forbidden("cannot create threads".into()));
        }
        // Let other tasks run while the thread is "being created".
        tokio::task::yield_now().await;
        let mut s = self.inner.lock().unwrap();
        s.next_id += 1;
        let id = ConversationId(s.next_id);
        s.conversations.insert(id);
        s.created.push((parent, title.to_string(), members.to_vec()));
        Ok(id)
    }

    async fn post_message(&self, to: ConversationId, text: &str) -> Result<(), MessengerError> {
        self.inner.lock().unwrap().posts.push((to, text.to_string()));
        Ok(())
    }

    async fn send_direct(&self, to: UserId, text: &str) -> Result<(), MessengerError> {
        self.inner.lock().unwrap().directs.push((to, text.to_string()));
        Ok(())
    }
}

pub fn app(messenger: Arc<FakeMessenger>) -> AppState {
    let store = Arc::new(Store::open_in_memory().unwrap());
    AppState::new(store, messenger, Arc::new(HumanDateParser))
}

/// Activate [`CHANNEL`] and return its record.
pub fn activate(app: &AppState) -> ChannelRecord {
    app.store.activate_channel(GUILD, CHANNEL).unwrap();
    app.store.channel(CHANNEL).unwrap().unwrap()
}

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}
