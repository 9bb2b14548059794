//! Per-unit lazy caches with an at-most-once claim protocol.
//!
//! Every compiled unit owns a handful of [`SymbolCache`] instances (types by token, constructed
//! shapes, member lists, attribute lists, forwarder results, canonical identities). An entry is
//! a [`LazySlot`] created on first request and moved through three states:
//!
//! ```text
//! VACANT --claim--> CLAIMED --publish--> PUBLISHED
//!    ^                 |
//!    +----panic--------+
//! ```
//!
//! Every caller first tries to claim a vacant slot. A thread that holds no claim anywhere and
//! finds the slot claimed yields until the value is published. A thread that already holds a
//! claim, in this unit or another one, never waits: waiting could close a cycle with another
//! claimant. It computes locally and offers its result instead. Only waiters hold no claims, so
//! no wait can be part of a cycle. Whoever publishes first wins and every caller returns the
//! published value, so identity is preserved even when a computation ran twice. Re-entry into a
//! slot the same thread has claimed also computes locally.

use std::{
    cell::RefCell,
    hash::Hash,
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Arc, OnceLock,
    },
};

use dashmap::DashMap;

const VACANT: u8 = 0;
const CLAIMED: u8 = 1;
const PUBLISHED: u8 = 2;

static NEXT_THREAD: AtomicU64 = AtomicU64::new(1);
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD.fetch_add(1, Ordering::Relaxed);
    static HELD_CLAIMS: RefCell<Vec<u64>> = const { RefCell::new(Vec::new()) };
}

fn thread_token() -> u64 {
    THREAD_TOKEN.with(|token| *token)
}

/// How the current thread may interact with a cache owned by `owner`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// No claim held anywhere: claim or wait
    Local,
    /// Claims held only in the same owner: claim vacant slots, never wait
    Nested,
    /// A claim is held in another owner: claim vacant slots, never wait
    Foreign,
}

fn mode_for(owner: u64) -> Mode {
    HELD_CLAIMS.with(|claims| {
        let claims = claims.borrow();
        if claims.is_empty() {
            Mode::Local
        } else if claims.iter().all(|held| *held == owner) {
            Mode::Nested
        } else {
            Mode::Foreign
        }
    })
}

/// A lazily computed cache entry
pub struct LazySlot<V> {
    state: AtomicU8,
    claimant: AtomicU64,
    value: OnceLock<V>,
}

impl<V> LazySlot<V> {
    fn new() -> Self {
        LazySlot {
            state: AtomicU8::new(VACANT),
            claimant: AtomicU64::new(0),
            value: OnceLock::new(),
        }
    }

    /// The published value, if any
    pub fn get(&self) -> Option<&V> {
        self.value.get()
    }
}

impl<V: Clone> LazySlot<V> {
    fn offer(&self, value: V) -> V {
        let fallback = value.clone();
        let _ = self.value.set(value);
        self.value.get().cloned().unwrap_or(fallback)
    }
}

/// Releases a claim when the computation ends, resetting the slot if nothing was published.
struct ClaimGuard<'a, V> {
    slot: &'a LazySlot<V>,
}

impl<'a, V> ClaimGuard<'a, V> {
    fn enter(slot: &'a LazySlot<V>, owner: u64) -> Self {
        slot.claimant.store(thread_token(), Ordering::Release);
        HELD_CLAIMS.with(|claims| claims.borrow_mut().push(owner));
        ClaimGuard { slot }
    }
}

impl<V> Drop for ClaimGuard<'_, V> {
    fn drop(&mut self) {
        HELD_CLAIMS.with(|claims| {
            claims.borrow_mut().pop();
        });

        if self.slot.value.get().is_some() {
            self.slot.state.store(PUBLISHED, Ordering::Release);
        } else {
            self.slot.claimant.store(0, Ordering::Release);
            self.slot.state.store(VACANT, Ordering::Release);
        }
    }
}

/// A concurrent map of lazily computed values owned by one compiled unit
pub struct SymbolCache<K, V> {
    owner: u64,
    slots: DashMap<K, Arc<LazySlot<V>>>,
}

impl<K, V> SymbolCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache for a fresh owner
    #[must_use]
    pub fn new() -> Self {
        Self::with_owner(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a cache that shares the claim domain `owner` with other caches of the same unit
    #[must_use]
    pub fn with_owner(owner: u64) -> Self {
        SymbolCache {
            owner,
            slots: DashMap::new(),
        }
    }

    /// Allocates a claim domain for the caches of one unit
    #[must_use]
    pub fn next_owner() -> u64 {
        NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
    }

    /// The published value for `key`, without computing
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of published entries
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Returns `true` if nothing was published yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value for `key`, computing it with `compute` if nobody published one yet.
    ///
    /// A vacant slot is always claimed before `compute` runs. Only callers that already hold a
    /// claim and find the slot claimed by someone else compute without a claim; callers holding
    /// no claim wait for the claimant instead. The first published value is returned to every
    /// caller.
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(LazySlot::new()))
            .value()
            .clone();

        if let Some(value) = slot.get() {
            return value.clone();
        }

        let mode = mode_for(self.owner);
        loop {
            match slot.state.compare_exchange(
                VACANT,
                CLAIMED,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    let guard = ClaimGuard::enter(&slot, self.owner);
                    let value = slot.offer(compute());
                    drop(guard);
                    return value;
                }
                Err(PUBLISHED) => {
                    if let Some(value) = slot.get() {
                        return value.clone();
                    }
                }
                Err(_) => {
                    if let Some(value) = slot.get() {
                        return value.clone();
                    }
                    let reentrant = slot.claimant.load(Ordering::Acquire) == thread_token();
                    if reentrant || mode != Mode::Local {
                        return slot.offer(compute());
                    }
                    std::thread::yield_now();
                }
            }
        }
    }
}

impl<K, V> Default for SymbolCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
