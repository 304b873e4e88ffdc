//! The matching run: candidates → groups → conversations → summary.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use pairbot_core::{ChannelId, ConversationId, Result, Timeblock, UserId};
use pairbot_store::{ChannelRecord, PairingKind, ParticipantKey, Store};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::grouping::shuffle_and_partition;
use crate::messenger::{Member, Messenger};

/// Outcome of one [`MatchingEngine::run_matching`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingResult {
    /// Fewer than two candidates; each one was told nobody else was available.
    Underfilled { candidates: usize },
    Matched {
        group_count: usize,
        user_count: usize,
        /// Groups whose conversation could not be opened or notified.
        failed_groups: usize,
    },
    /// The run was abandoned before any group was formed.
    Failed { reason: String },
}

pub struct MatchingEngine {
    store: Arc<Store>,
    messenger: Arc<dyn Messenger>,
    /// Held across the find / create / insert sequence in [`Self::open_group`].
    open_lock: Mutex<()>,
}

impl MatchingEngine {
    pub fn new(store: Arc<Store>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            store,
            messenger,
            open_lock: Mutex::new(()),
        }
    }

    /// Match everyone available for `block` on `date` in one channel.
    pub async fn run_matching(
        &self,
        channel: &ChannelRecord,
        block: Timeblock,
        date: NaiveDate,
    ) -> MatchingResult {
        let channel_id = channel.channel_id;
        info!(guild = %channel.guild_id, channel = %channel_id, %block, %date, "matching run started");

        let candidates = match self.candidates(channel, block, date).await {
            Ok(c) => c,
            Err(e) => {
                error!(channel = %channel_id, %block, error = %e, "matching run failed before grouping");
                return MatchingResult::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if candidates.len() < 2 {
            let text = format!(
                "Thanks for signing up for pairing this {block}. \
                 Unfortunately, there was nobody else available this time."
            );
            for member in &candidates {
                if let Err(e) = self.messenger.send_direct(member.id, &text).await {
                    warn!(channel = %channel_id, user = %member.id, error = %e, "underfill notice not delivered");
                }
            }
            info!(channel = %channel_id, %block, candidates = candidates.len(), "not enough members to match");
            return MatchingResult::Underfilled {
                candidates: candidates.len(),
            };
        }

        let user_count = candidates.len();
        let groups = shuffle_and_partition(candidates);
        let group_count = groups.len();
        let mut failed_groups = 0;

        for group in &groups {
            let text = format!(
                "{}: you've been matched together for this {block}. Happy pairing! :computer:",
                mentions(group)
            );
            if let Err(e) = self
                .open_group(channel_id, PairingKind::Scheduled(block), group, &text)
                .await
            {
                failed_groups += 1;
                let ids: Vec<u64> = group.iter().map(|m| m.id.get()).collect();
                error!(channel = %channel_id, %block, members = ?ids, error = %e, "group could not be opened");
            }
        }

        let summary = format!(
            "Pairings have been sent out for this {block}! \
             {user_count} members were matched into {group_count} groups."
        );
        if let Err(e) = self.messenger.post_message(channel_id.into(), &summary).await {
            warn!(channel = %channel_id, error = %e, "summary not posted");
        }

        info!(channel = %channel_id, %block, user_count, group_count, failed_groups, "matching run finished");
        MatchingResult::Matched {
            group_count,
            user_count,
            failed_groups,
        }
    }

    /// Run every block evaluated on `date`: its weekday, and WEEK on Mondays.
    pub async fn run_for_date(
        &self,
        channel: &ChannelRecord,
        date: NaiveDate,
    ) -> Vec<(Timeblock, MatchingResult)> {
        let mut blocks = vec![Timeblock::of_date(date)];
        if Timeblock::Week.covers(date) {
            blocks.push(Timeblock::Week);
        }
        let mut results = Vec::with_capacity(blocks.len());
        for block in blocks {
            results.push((block, self.run_matching(channel, block, date).await));
        }
        results
    }

    /// Open (or reuse) the conversation for one group and post `text` in it.
    ///
    /// A recorded conversation that still resolves is reused; one that was
    /// deleted has its record dropped and is recreated. Concurrent callers
    /// (a trigger run and `/rematch`, or two `/pairwith`s for the same pair)
    /// are serialized so each group ends up with one conversation.
    pub async fn open_group(
        &self,
        parent: ChannelId,
        kind: PairingKind,
        members: &[Member],
        text: &str,
    ) -> Result<ConversationId> {
        let key = ParticipantKey::new(members.iter().map(|m| m.id));
        let _guard = self.open_lock.lock().await;

        if let Some(record) = self.store.find_pairing(parent, kind, &key)? {
            if self
                .messenger
                .resolve_conversation(record.thread_id)
                .await?
                .is_some()
            {
                debug!(channel = %parent, %kind, thread = %record.thread_id, "reusing conversation");
                self.messenger.post_message(record.thread_id, text).await?;
                return Ok(record.thread_id);
            }
            info!(channel = %parent, %kind, thread = %record.thread_id, "recorded conversation is gone");
            self.store.delete_pairing(record.id)?;
        }

        let ids: Vec<UserId> = key.members().to_vec();
        let thread = self
            .messenger
            .create_group_conversation(parent, &group_title(members), &ids)
            .await?;
        self.store.insert_pairing(parent, kind, &key, thread)?;
        self.messenger.post_message(thread, text).await?;
        info!(channel = %parent, %kind, %thread, members = ids.len(), "conversation opened");
        Ok(thread)
    }

    /// Subscribers of `block`, minus those who skipped `date`, plus those
    /// forced available on `date` (daily blocks only), resolved to members.
    async fn candidates(
        &self,
        channel: &ChannelRecord,
        block: Timeblock,
        date: NaiveDate,
    ) -> Result<Vec<Member>> {
        let mut ids = self.store.list_by_timeblock(channel.channel_id, block)?;
        for exception in self.store.exceptions_on(channel.channel_id, date)? {
            if !exception.available {
                ids.retain(|id| *id != exception.user_id);
            } else if !block.is_week() && !ids.contains(&exception.user_id) {
                ids.push(exception.user_id);
            }
        }
        ids.sort();

        let mut members = Vec::with_capacity(ids.len());
        for id in ids {
            match self.messenger.resolve_member(channel.guild_id, id).await? {
                Some(member) => members.push(member),
                None => debug!(guild = %channel.guild_id, user = %id, "candidate left the guild"),
            }
        }
        Ok(members)
    }
}

/// The first date on or after `today` that `block` is evaluated on.
pub fn next_date_for(block: Timeblock, today: NaiveDate) -> Option<NaiveDate> {
    (0..7)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .find(|date| block.covers(*date))
}

/// Display names sorted and joined with " & ".
pub fn group_title(members: &[Member]) -> String {
    let mut names: Vec<&str> = members.iter().map(|m| m.display_name.as_str()).collect();
    names.sort_unstable();
    names.join(" & ")
}

fn mentions(members: &[Member]) -> String {
    members
        .iter()
        .map(|m| m.id.mention())
        .collect::<Vec<_>>()
        .join(" ")
}
