//! Optimistic toggles.
//!
//! A toggle flips the target locally before anything touches the network,
//! then queues the remote write on a lane keyed by `(kind, id)`. Each lane is
//! a task that runs its writes strictly in issue order, one at a time, and
//! exits once its queue drains.
//!
//! A queued toggle means "flip whatever the remote store holds when this
//! write runs". The lane tracks the confirmed flag across the writes it has
//! queued, hands each write the absolute value to persist, and on failure
//! keeps the previous confirmed value. The net effect of a failed toggle is
//! therefore the same as if it had never been issued, both locally and in
//! the remote store.

use crate::target::{lock_targets, CollectionInner};
use crate::{
    InteractionError, InteractionResult, Notice, NoticeSink, TargetCollection, TargetId,
    TargetKind,
};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// A remote write. Receives the flag value to persist.
pub type RemoteWrite = Box<dyn FnOnce(bool) -> BoxFuture<'static, InteractionResult<()>> + Send>;

/// How a toggle's remote write ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote store now holds `flag`.
    Committed { flag: bool },
    /// The write failed; the toggle was taken back.
    Reverted { error: InteractionError },
    /// The owning collection was gone when the write finished.
    Discarded,
}

/// Handle to a toggle whose write may still be in flight.
#[derive(Debug)]
pub struct PendingToggle {
    flag: bool,
    counter: i64,
    settled: oneshot::Receiver<ToggleOutcome>,
}

impl PendingToggle {
    /// Flag shown immediately after the toggle.
    pub fn optimistic_flag(&self) -> bool {
        self.flag
    }

    /// Counter shown immediately after the toggle.
    pub fn optimistic_counter(&self) -> i64 {
        self.counter
    }

    /// Wait for the remote write to finish.
    pub async fn settled(self) -> ToggleOutcome {
        self.settled.await.unwrap_or(ToggleOutcome::Discarded)
    }
}

type LaneKey = (TargetKind, TargetId);

struct Job {
    collection: Weak<CollectionInner>,
    kind: TargetKind,
    id: TargetId,
    /// Confirmed flag when the toggle was issued.
    base_confirmed: bool,
    write: RemoteWrite,
    done: oneshot::Sender<ToggleOutcome>,
}

struct MutatorInner {
    lanes: Mutex<HashMap<LaneKey, mpsc::UnboundedSender<Job>>>,
    notices: Arc<dyn NoticeSink>,
}

/// Applies toggles locally and serializes their remote writes per target.
#[derive(Clone)]
pub struct OptimisticMutator {
    inner: Arc<MutatorInner>,
}

impl OptimisticMutator {
    pub fn new(notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            inner: Arc::new(MutatorInner {
                lanes: Mutex::new(HashMap::new()),
                notices,
            }),
        }
    }

    /// Flip the target's flag now and queue `write`.
    ///
    /// Returns after the local change is visible; the write runs on the
    /// target's lane. Must be called from within a tokio runtime.
    pub fn toggle<F, Fut>(
        &self,
        collection: &TargetCollection,
        kind: TargetKind,
        id: &TargetId,
        write: F,
    ) -> InteractionResult<PendingToggle>
    where
        F: FnOnce(bool) -> Fut + Send + 'static,
        Fut: Future<Output = InteractionResult<()>> + Send + 'static,
    {
        let handle = Handle::try_current().map_err(|_| {
            InteractionError::TransportFailure("no async runtime for remote write".to_string())
        })?;

        let (done, settled) = oneshot::channel();
        let write: RemoteWrite =
            Box::new(move |flag| -> BoxFuture<'static, InteractionResult<()>> {
                Box::pin(write(flag))
            });

        // The collection lock is held until the job is queued so the lane
        // sees toggles in the same order the actor made them.
        let mut targets = collection.lock();
        let target = targets
            .iter_mut()
            .find(|t| t.kind() == kind && t.id() == id)
            .ok_or_else(|| InteractionError::NotFound(id.to_string()))?;

        target.begin_toggle();
        let pending_flag = target.flag();
        let pending_counter = target.counter();
        let job = Job {
            collection: collection.downgrade(),
            kind,
            id: id.clone(),
            base_confirmed: target.confirmed_flag(),
            write,
            done,
        };

        debug!(
            kind = ?kind,
            target_id = %id,
            flag = pending_flag,
            counter = pending_counter,
            in_flight = target.in_flight(),
            "Toggle applied locally"
        );

        self.enqueue(&handle, job);
        drop(targets);

        Ok(PendingToggle {
            flag: pending_flag,
            counter: pending_counter,
            settled,
        })
    }

    /// Lanes with writes queued or running.
    pub(crate) fn lane_count(&self) -> usize {
        self.inner.lanes().len()
    }

    fn enqueue(&self, handle: &Handle, job: Job) {
        let key = (job.kind, job.id.clone());
        let mut lanes = self.inner.lanes();

        let job = match lanes.get(&key) {
            Some(sender) => match sender.send(job) {
                Ok(()) => return,
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(run_lane(
            receiver,
            Arc::downgrade(&self.inner),
            key.clone(),
            self.inner.notices.clone(),
        ));
        // A fresh receiver is alive, so this cannot fail.
        let _ = sender.send(job);
        lanes.insert(key, sender);
    }
}

impl MutatorInner {
    fn lanes(&self) -> MutexGuard<'_, HashMap<LaneKey, mpsc::UnboundedSender<Job>>> {
        self.lanes.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for OptimisticMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticMutator")
            .field("lanes", &self.lane_count())
            .finish()
    }
}

/// Drain one target's writes in order, then remove the lane.
async fn run_lane(
    mut jobs: mpsc::UnboundedReceiver<Job>,
    mutator: Weak<MutatorInner>,
    key: LaneKey,
    notices: Arc<dyn NoticeSink>,
) {
    // Confirmed flag as of the last write on this lane, while more are queued.
    let mut lane_confirmed: Option<bool> = None;

    while let Some(job) = jobs.recv().await {
        let base = lane_confirmed.unwrap_or(job.base_confirmed);
        let desired = !base;

        let result = (job.write)(desired).await;
        let confirmed = if result.is_ok() { desired } else { base };

        let outcome = settle(&job.collection, job.kind, &job.id, confirmed, result);
        if let ToggleOutcome::Reverted { error } = &outcome {
            notices.notify(Notice::for_error(job.kind.action(), error));
        }

        // Enqueue sends under the lanes lock, so an empty queue seen here
        // stays empty until the entry is gone.
        let drained = match mutator.upgrade() {
            Some(inner) => {
                let mut lanes = inner.lanes();
                let drained = jobs.is_empty();
                if drained {
                    lanes.remove(&key);
                }
                drained
            }
            None => jobs.is_empty(),
        };
        let _ = job.done.send(outcome);

        if drained {
            debug!(kind = ?key.0, target_id = %key.1, "Lane drained");
            break;
        }
        lane_confirmed = Some(confirmed);
    }
}

fn settle(
    collection: &Weak<CollectionInner>,
    kind: TargetKind,
    id: &TargetId,
    confirmed: bool,
    result: InteractionResult<()>,
) -> ToggleOutcome {
    let Some(collection) = collection.upgrade() else {
        debug!(
            kind = ?kind,
            target_id = %id,
            ok = result.is_ok(),
            "Collection dropped, discarding write result"
        );
        return ToggleOutcome::Discarded;
    };

    let mut targets = lock_targets(&collection);
    let Some(target) = targets
        .iter_mut()
        .find(|t| t.kind() == kind && t.id() == id)
    else {
        debug!(target_id = %id, "Target no longer shown, discarding write result");
        return ToggleOutcome::Discarded;
    };
    target.finish_toggle(confirmed);

    match result {
        Ok(()) => {
            debug!(
                kind = ?kind,
                target_id = %id,
                flag = confirmed,
                "Toggle committed"
            );
            ToggleOutcome::Committed { flag: confirmed }
        }
        Err(error) => {
            warn!(
                kind = ?kind,
                target_id = %id,
                error = %error,
                flag = target.flag(),
                "Remote write failed, toggle reverted"
            );
            ToggleOutcome::Reverted { error }
        }
    }
}
