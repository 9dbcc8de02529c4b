//! Behavioural tests for optimistic toggles.
//!
//! - `ordering.rs` - lane ordering, parity and racing toggles
//! - `failures.rs` - rollback, notices and dropped collections

mod ordering;

use crate::{
    InteractionResult, InteractionTarget, OptimisticMutator, RecordingNotices,
    TargetCollection, TargetId, TargetKind,
};
use futures_util::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remote store for a single flag that records every write it accepts.
pub(crate) struct FakeRemote {
    state: Mutex<bool>,
    log: Mutex<Vec<bool>>,
}

impl FakeRemote {
    pub fn new(initial: bool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(initial),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn state(&self) -> bool {
        *self.state.lock().unwrap()
    }

    pub fn log(&self) -> Vec<bool> {
        self.log.lock().unwrap().clone()
    }

    /// A write that waits `delay_ms`, then stores the flag or fails.
    pub fn writer(
        self: &Arc<Self>,
        delay_ms: u64,
        fail: bool,
    ) -> impl FnOnce(bool) -> BoxFuture<'static, InteractionResult<()>> + Send + 'static {
        let remote = self.clone();
        move |flag| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                if fail {
                    return Err(crate::InteractionError::TransportFailure(
                        "connection reset".to_string(),
                    ));
                }
                *remote.state.lock().unwrap() = flag;
                remote.log.lock().unwrap().push(flag);
                Ok(())
            })
        }
    }
}

pub(crate) struct Fixture {
    pub mutator: OptimisticMutator,
    pub notices: Arc<RecordingNotices>,
    pub collection: TargetCollection,
    pub id: TargetId,
}

pub(crate) fn fixture(flag: bool, counter: i64) -> Fixture {
    let notices = Arc::new(RecordingNotices::new());
    let id = TargetId::from_string("post-1");
    let collection = TargetCollection::from_targets([InteractionTarget::new(
        id.clone(),
        TargetKind::PostLike,
        flag,
        counter,
    )]);
    Fixture {
        mutator: OptimisticMutator::new(notices.clone()),
        notices,
        collection,
        id,
    }
}

impl Fixture {
    pub fn target(&self) -> InteractionTarget {
        self.collection
            .get(TargetKind::PostLike, &self.id)
            .expect("target present")
    }
}

#[tokio::test]
async fn basic_toggle_is_visible_before_write_completes() {
    let f = fixture(false, 3);
    let remote = FakeRemote::new(false);

    let pending = f
        .mutator
        .toggle(
            &f.collection,
            TargetKind::PostLike,
            &f.id,
            remote.writer(20, false),
        )
        .unwrap();

    assert!(pending.optimistic_flag());
    assert_eq!(pending.optimistic_counter(), 4);
    assert!(f.target().flag());
    assert!(!remote.state());

    assert_eq!(
        pending.settled().await,
        crate::ToggleOutcome::Committed { flag: true }
    );
    assert!(remote.state());
    assert_eq!(f.target().confirmed_counter(), 4);
    assert!(f.notices.is_empty());
}
