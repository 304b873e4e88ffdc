mod common;

use std::sync::Arc;

use common::*;
use pairbot_core::{Timeblock, UserId};
use pairbot_engine::{MatchingResult, Member};
use pairbot_store::{PairingKind, ParticipantKey};

const A: UserId = UserId::new(1);
const B: UserId = UserId::new(2);
const C: UserId = UserId::new(3);
const D: UserId = UserId::new(4);
const E: UserId = UserId::new(5);

fn everyone() -> Arc<FakeMessenger> {
    FakeMessenger::with_members(&[(1, "ada"), (2, "bob"), (3, "cy"), (4, "dee"), (5, "eve")])
}

#[tokio::test]
async fn monday_and_week_runs_follow_subscriptions() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    app.store.subscribe(CHANNEL, A, &[Timeblock::Monday, Timeblock::Week]).unwrap();
    app.store.subscribe(CHANNEL, B, &[Timeblock::Monday]).unwrap();
    app.store.subscribe(CHANNEL, C, &[Timeblock::Tuesday]).unwrap();

    let results = app.matching.run_for_date(&channel, monday()).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, Timeblock::Monday);
    assert_eq!(
        results[0].1,
        MatchingResult::Matched { group_count: 1, user_count: 2, failed_groups: 0 }
    );
    assert_eq!(results[1].0, Timeblock::Week);
    assert_eq!(results[1].1, MatchingResult::Underfilled { candidates: 1 });

    let created = fake.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].1, "ada & bob");
    assert_eq!(created[0].2, vec![A, B]);

    // A hears about the empty WEEK run; C is never contacted.
    let directs = fake.directs();
    assert_eq!(directs.len(), 1);
    assert_eq!(directs[0].0, A);
    assert!(directs[0].1.contains("this WEEK"));

    let summary = fake.posts_to(CHANNEL.into());
    assert_eq!(summary.len(), 1);
    assert!(summary[0].starts_with("Pairings have been sent out for this Monday!"));
}

#[tokio::test]
async fn repeated_runs_reuse_the_conversation() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    app.store.subscribe(CHANNEL, A, &[Timeblock::Monday]).unwrap();
    app.store.subscribe(CHANNEL, B, &[Timeblock::Monday]).unwrap();

    app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;

    assert_eq!(fake.created().len(), 1);
    let records = app.store.pairings_for_channel(CHANNEL).unwrap();
    assert_eq!(records.len(), 1);

    let thread_posts = fake.posts_to(records[0].thread_id);
    assert_eq!(thread_posts.len(), 2);
    assert!(thread_posts[0].starts_with("<@"));
    assert!(thread_posts[0].contains("you've been matched together for this Monday"));
}

#[tokio::test]
async fn deleted_conversation_is_recreated() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    app.store.subscribe(CHANNEL, A, &[Timeblock::Monday]).unwrap();
    app.store.subscribe(CHANNEL, B, &[Timeblock::Monday]).unwrap();

    app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    let first = app.store.pairings_for_channel(CHANNEL).unwrap()[0].thread_id;
    fake.delete_conversation(first);

    app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    let records = app.store.pairings_for_channel(CHANNEL).unwrap();
    assert_eq!(records.len(), 1);
    assert_ne!(records[0].thread_id, first);
    assert_eq!(fake.created().len(), 2);
}

#[tokio::test]
async fn nobody_subscribed_is_underfilled_and_silent() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);

    let result = app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    assert_eq!(result, MatchingResult::Underfilled { candidates: 0 });
    assert!(fake.directs().is_empty());
    assert!(fake.posts_to(CHANNEL.into()).is_empty());
    assert!(app.store.pairings_for_channel(CHANNEL).unwrap().is_empty());
}

#[tokio::test]
async fn odd_count_forms_one_triple() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B, C, D, E] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Tuesday]).unwrap();
    }

    let result = app.matching.run_matching(&channel, Timeblock::Tuesday, tuesday()).await;
    assert_eq!(
        result,
        MatchingResult::Matched { group_count: 2, user_count: 5, failed_groups: 0 }
    );

    let mut sizes: Vec<usize> = fake.created().iter().map(|(_, _, m)| m.len()).collect();
    sizes.sort();
    assert_eq!(sizes, vec![2, 3]);

    let mut all: Vec<UserId> = fake.created().into_iter().flat_map(|(_, _, m)| m).collect();
    all.sort();
    assert_eq!(all, vec![A, B, C, D, E]);
}

#[tokio::test]
async fn skips_and_overrides_shape_the_candidate_set() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B, C] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Monday]).unwrap();
    }
    app.store.set_exception(CHANNEL, C, monday(), false).unwrap();
    app.store.set_exception(CHANNEL, D, monday(), true).unwrap();

    let result = app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    assert_eq!(
        result,
        MatchingResult::Matched { group_count: 1, user_count: 3, failed_groups: 0 }
    );
    // C skipped Monday; D was forced available without a subscription.
    assert_eq!(fake.created()[0].2, vec![A, B, D]);
}

#[tokio::test]
async fn monday_skip_also_leaves_the_week_run() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B, C] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Week]).unwrap();
    }
    app.exceptions.skip(CHANNEL, C, monday(), monday()).unwrap();

    let result = app.matching.run_matching(&channel, Timeblock::Week, monday()).await;
    assert_eq!(
        result,
        MatchingResult::Matched { group_count: 1, user_count: 2, failed_groups: 0 }
    );
    assert_eq!(fake.created()[0].2, vec![A, B]);
    assert!(fake.directs().is_empty());
}

#[tokio::test]
async fn concurrent_opens_for_one_pair_share_a_thread() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    activate(&app);
    let ada = Member { id: A, display_name: "ada".into() };
    let bob = Member { id: B, display_name: "bob".into() };
    let forward = [ada.clone(), bob.clone()];
    let backward = [bob, ada];

    let (first, second) = tokio::join!(
        app.matching.open_group(CHANNEL, PairingKind::AdHoc, &forward, "hello"),
        app.matching.open_group(CHANNEL, PairingKind::AdHoc, &backward, "hello"),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first, second);
    assert_eq!(fake.created().len(), 1);
    let records = app.store.pairings_for_channel(CHANNEL).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].thread_id, first);
    assert_eq!(fake.posts_to(first).len(), 2);
}

#[tokio::test]
async fn departed_members_are_dropped() {
    let fake = FakeMessenger::with_members(&[(1, "ada"), (2, "bob")]);
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B, C] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Monday]).unwrap();
    }

    let result = app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    assert_eq!(
        result,
        MatchingResult::Matched { group_count: 1, user_count: 2, failed_groups: 0 }
    );
    assert_eq!(fake.created()[0].2, vec![A, B]);
}

#[tokio::test]
async fn monday_and_week_records_coexist() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B] {
        app.store
            .subscribe(CHANNEL, user, &[Timeblock::Monday, Timeblock::Week])
            .unwrap();
    }

    app.matching.run_for_date(&channel, monday()).await;

    let key = ParticipantKey::new([A, B]);
    let daily = app
        .store
        .find_pairing(CHANNEL, PairingKind::Scheduled(Timeblock::Monday), &key)
        .unwrap()
        .unwrap();
    let weekly = app
        .store
        .find_pairing(CHANNEL, PairingKind::Scheduled(Timeblock::Week), &key)
        .unwrap()
        .unwrap();
    assert_ne!(daily.thread_id, weekly.thread_id);
    assert_eq!(fake.created().len(), 2);
}

#[tokio::test]
async fn group_failures_do_not_stop_the_run() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B, C, D] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Monday]).unwrap();
    }
    fake.fail_create(true);

    let result = app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    assert_eq!(
        result,
        MatchingResult::Matched { group_count: 2, user_count: 4, failed_groups: 2 }
    );
    assert!(app.store.pairings_for_channel(CHANNEL).unwrap().is_empty());
    // The summary still goes out once every group was attempted.
    assert_eq!(fake.posts_to(CHANNEL.into()).len(), 1);
}

#[tokio::test]
async fn member_lookup_failure_fails_the_run() {
    let fake = everyone();
    let app = app(Arc::clone(&fake));
    let channel = activate(&app);
    for user in [A, B] {
        app.store.subscribe(CHANNEL, user, &[Timeblock::Monday]).unwrap();
    }
    fake.fail_resolve(true);

    let result = app.matching.run_matching(&channel, Timeblock::Monday, monday()).await;
    assert!(matches!(result, MatchingResult::Failed { .. }));
    assert!(fake.created().is_empty());
}
