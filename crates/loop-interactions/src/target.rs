//! Toggleable targets and the screen-owned collections that hold them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Identifier of a post or group.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a target's flag means.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Flag: the actor likes the post. Counter: like count.
    PostLike,
    /// Flag: the actor is a member. Counter: member count.
    GroupMembership,
}

impl TargetKind {
    /// Verb phrase used in notices.
    pub fn action(&self) -> &'static str {
        match self {
            TargetKind::PostLike => "update like",
            TargetKind::GroupMembership => "update group membership",
        }
    }
}

/// Where a target is in its write cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetState {
    /// Local flag matches the last confirmed remote value.
    Settled { flag: bool },
    /// At least one write is in flight.
    Pending { flag: bool, prior_flag: bool },
}

/// A post or group with an actor-relative flag and a count.
///
/// Holds both the displayed values and the last values confirmed by the
/// remote store. `counter - confirmed_counter` always equals
/// `flag - confirmed_flag` (as 0/1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionTarget {
    id: TargetId,
    kind: TargetKind,
    flag: bool,
    counter: i64,
    confirmed_flag: bool,
    confirmed_counter: i64,
    in_flight: u32,
}

impl InteractionTarget {
    pub fn new(id: impl Into<TargetId>, kind: TargetKind, flag: bool, counter: i64) -> Self {
        Self {
            id: id.into(),
            kind,
            flag,
            counter,
            confirmed_flag: flag,
            confirmed_counter: counter,
            in_flight: 0,
        }
    }

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn flag(&self) -> bool {
        self.flag
    }

    pub fn counter(&self) -> i64 {
        self.counter
    }

    pub fn confirmed_flag(&self) -> bool {
        self.confirmed_flag
    }

    pub fn confirmed_counter(&self) -> i64 {
        self.confirmed_counter
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    pub fn state(&self) -> TargetState {
        if self.in_flight == 0 {
            TargetState::Settled { flag: self.flag }
        } else {
            TargetState::Pending {
                flag: self.flag,
                prior_flag: self.confirmed_flag,
            }
        }
    }

    /// Local flip for a newly issued toggle.
    pub(crate) fn begin_toggle(&mut self) {
        self.flag = !self.flag;
        self.counter += if self.flag { 1 } else { -1 };
        self.in_flight += 1;
    }

    /// Record a settled write whose confirmed flag is now `confirmed`.
    pub(crate) fn finish_toggle(&mut self, confirmed: bool) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if confirmed != self.confirmed_flag {
            self.confirmed_counter += if confirmed { 1 } else { -1 };
            self.confirmed_flag = confirmed;
        }
        // Every outstanding toggle is a flip of whatever is confirmed when it runs.
        self.flag = self.confirmed_flag ^ (self.in_flight % 2 == 1);
        self.counter =
            self.confirmed_counter + i64::from(self.flag) - i64::from(self.confirmed_flag);
    }
}

pub(crate) type CollectionInner = Mutex<Vec<InteractionTarget>>;

/// The targets shown by one screen.
///
/// Cloning shares the same targets. Queued writes hold only a weak
/// reference, so once every clone is dropped their results are discarded.
#[derive(Clone, Debug, Default)]
pub struct TargetCollection {
    inner: Arc<CollectionInner>,
}

impl TargetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_targets(targets: impl IntoIterator<Item = InteractionTarget>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(targets.into_iter().collect())),
        }
    }

    /// Add a target, replacing any existing one with the same id and kind.
    pub fn insert(&self, target: InteractionTarget) {
        let mut targets = self.lock();
        match targets
            .iter_mut()
            .find(|t| t.id == target.id && t.kind == target.kind)
        {
            Some(existing) => *existing = target,
            None => targets.push(target),
        }
    }

    pub fn get(&self, kind: TargetKind, id: &TargetId) -> Option<InteractionTarget> {
        self.lock()
            .iter()
            .find(|t| t.kind == kind && &t.id == id)
            .cloned()
    }

    /// Every target in insertion order.
    pub fn snapshot(&self) -> Vec<InteractionTarget> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<InteractionTarget>> {
        lock_targets(&self.inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<CollectionInner> {
        Arc::downgrade(&self.inner)
    }
}

pub(crate) fn lock_targets(inner: &CollectionInner) -> MutexGuard<'_, Vec<InteractionTarget>> {
    inner.lock().unwrap_or_else(|p| p.into_inner())
}
