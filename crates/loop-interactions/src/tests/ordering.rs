//! Ordering and parity of queued toggles.

use super::{fixture, FakeRemote};
use crate::{
    InteractionTarget, OptimisticMutator, NullNotices, TargetCollection, TargetKind,
    TargetState, ToggleOutcome,
};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn toggle_parity_with_successful_writes() {
    for n in 1..=6usize {
        let f = fixture(false, 10);
        let remote = FakeRemote::new(false);

        let pending: Vec<_> = (0..n)
            .map(|_| {
                f.mutator
                    .toggle(
                        &f.collection,
                        TargetKind::PostLike,
                        &f.id,
                        remote.writer(2, false),
                    )
                    .unwrap()
            })
            .collect();
        for p in pending {
            assert!(matches!(p.settled().await, ToggleOutcome::Committed { .. }));
        }

        let expected = n % 2 == 1;
        let target = f.target();
        assert_eq!(target.state(), TargetState::Settled { flag: expected });
        assert_eq!(target.counter(), 10 + i64::from(expected));
        assert_eq!(remote.state(), expected);
        assert_eq!(remote.log().len(), n);
    }
}

#[tokio::test]
async fn double_toggle_nets_to_noop_regardless_of_latency() {
    for (first_ms, second_ms) in [(40, 1), (1, 40), (10, 10), (0, 0)] {
        let f = fixture(true, 7);
        let remote = FakeRemote::new(true);

        let a = f
            .mutator
            .toggle(
                &f.collection,
                TargetKind::PostLike,
                &f.id,
                remote.writer(first_ms, false),
            )
            .unwrap();
        let b = f
            .mutator
            .toggle(
                &f.collection,
                TargetKind::PostLike,
                &f.id,
                remote.writer(second_ms, false),
            )
            .unwrap();

        assert_eq!(a.settled().await, ToggleOutcome::Committed { flag: false });
        assert_eq!(b.settled().await, ToggleOutcome::Committed { flag: true });

        let target = f.target();
        assert_eq!(target.state(), TargetState::Settled { flag: true });
        assert_eq!(target.counter(), 7);
        assert!(remote.state());
        assert_eq!(remote.log(), vec![false, true]);
    }
}

#[tokio::test]
async fn writes_run_in_issue_order_per_target() {
    let f = fixture(false, 0);
    let remote = FakeRemote::new(false);

    // Decreasing latency: an unordered runner would finish these backwards.
    let pending: Vec<_> = [30, 20, 10, 0]
        .into_iter()
        .map(|ms| {
            f.mutator
                .toggle(
                    &f.collection,
                    TargetKind::PostLike,
                    &f.id,
                    remote.writer(ms, false),
                )
                .unwrap()
        })
        .collect();
    for p in pending {
        p.settled().await;
    }

    assert_eq!(remote.log(), vec![true, false, true, false]);
}

#[tokio::test]
async fn targets_have_independent_lanes() {
    let mutator = OptimisticMutator::new(Arc::new(NullNotices));
    let collection = TargetCollection::from_targets([
        InteractionTarget::new("slow", TargetKind::GroupMembership, false, 1),
        InteractionTarget::new("fast", TargetKind::GroupMembership, false, 1),
    ]);
    let slow_remote = FakeRemote::new(false);
    let fast_remote = FakeRemote::new(false);
    let finished = Arc::new(Mutex::new(Vec::new()));

    let slow = mutator
        .toggle(
            &collection,
            TargetKind::GroupMembership,
            &"slow".into(),
            slow_remote.writer(200, false),
        )
        .unwrap();
    let fast = mutator
        .toggle(
            &collection,
            TargetKind::GroupMembership,
            &"fast".into(),
            fast_remote.writer(0, false),
        )
        .unwrap();

    let record = |name: &'static str, finished: Arc<Mutex<Vec<&'static str>>>| {
        move |_outcome: ToggleOutcome| finished.lock().unwrap().push(name)
    };
    let slow_done = tokio::spawn({
        let done = record("slow", finished.clone());
        async move { done(slow.settled().await) }
    });
    let fast_done = tokio::spawn({
        let done = record("fast", finished.clone());
        async move { done(fast.settled().await) }
    });
    slow_done.await.unwrap();
    fast_done.await.unwrap();

    assert_eq!(*finished.lock().unwrap(), vec!["fast", "slow"]);
    assert!(slow_remote.state());
    assert!(fast_remote.state());
}

#[tokio::test]
async fn toggles_after_idle_start_from_confirmed_state() {
    let f = fixture(false, 2);
    let remote = FakeRemote::new(false);

    let first = f
        .mutator
        .toggle(&f.collection, TargetKind::PostLike, &f.id, remote.writer(0, false))
        .unwrap();
    first.settled().await;

    let second = f
        .mutator
        .toggle(&f.collection, TargetKind::PostLike, &f.id, remote.writer(0, false))
        .unwrap();
    assert!(!second.optimistic_flag());
    assert_eq!(second.settled().await, ToggleOutcome::Committed { flag: false });
    assert_eq!(f.target().counter(), 2);
}

#[tokio::test]
async fn drained_lanes_are_removed() {
    let f = fixture(false, 0);
    let remote = FakeRemote::new(false);

    let pending: Vec<_> = [10, 0, 5]
        .into_iter()
        .map(|ms| {
            f.mutator
                .toggle(&f.collection, TargetKind::PostLike, &f.id, remote.writer(ms, false))
                .unwrap()
        })
        .collect();
    assert_eq!(f.mutator.lane_count(), 1);
    for p in pending {
        p.settled().await;
    }
    assert_eq!(f.mutator.lane_count(), 0);

    // A later toggle opens a fresh lane from the confirmed state.
    let next = f
        .mutator
        .toggle(&f.collection, TargetKind::PostLike, &f.id, remote.writer(0, false))
        .unwrap();
    assert_eq!(next.settled().await, ToggleOutcome::Committed { flag: false });
    assert_eq!(f.mutator.lane_count(), 0);
    assert_eq!(remote.log(), vec![true, false, true, false]);
    assert_eq!(f.target().state(), TargetState::Settled { flag: false });
}
