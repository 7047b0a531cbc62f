//! Scoped release pools.
//!
//! A release pool collects claims that should be given back later, when the
//! enclosing scope ends, instead of immediately. This lets a function hand
//! out a freshly created instance without the caller having to release it.
//!
//! # Design
//!
//! - **Thread-local stack**: each thread keeps its own stack of pools; the
//!   top one is *active* and receives [`autorelease`]d claims.
//! - **RAII scopes**: [`Scope`] pushes a pool when entered and drains it when
//!   exited or dropped. [`with_scope`] runs a closure inside a fresh scope.
//! - **Drain order**: a draining pool is popped first, so its parent is
//!   already active while the captured claims are given back (newest first).
//!   Anything autoreleased by the resulting `destroy` calls lands in the
//!   parent.
//! - **Strict nesting**: scopes must end in reverse order of entry. Exiting a
//!   scope that is not on top of the stack panics.
//!
//! # Example
//!
//! ```rust
//! use cobbler::foundation::PString;
//! use cobbler::runtime::{object, pool};
//!
//! let before = object::live_count();
//! pool::with_scope(|scope| {
//!     let greeting = scope.autorelease(PString::new("hello").unwrap());
//!     assert_eq!(PString::text(&greeting).as_deref(), Some("hello"));
//!     assert_eq!(pool::stats().pending, 1);
//! });
//! assert_eq!(object::live_count(), before);
//! ```

use crate::error::{Error, Result};
use crate::runtime::config::config;
use crate::runtime::misuse;
use crate::runtime::object::{Object, ObjectPtr};
use crate::runtime::shape::Shape;
use crate::runtime::dispatch::Arg;
use cobbler_log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;

/// Lifecycle state of a release pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// On the stack and accepting claims (the top pool receives them).
    Active,
    /// Popped; captured claims are being given back.
    Draining,
    /// All captured claims were given back.
    Destroyed,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoolState::Active => "active",
            PoolState::Draining => "draining",
            PoolState::Destroyed => "destroyed",
        })
    }
}

/// Snapshot of this thread's release pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Pools currently on the stack.
    pub depth: usize,
    /// Claims held by the active pool.
    pub pending: usize,
    /// Claims held by all pools on the stack.
    pub pending_total: usize,
    /// Pools drained so far on this thread.
    pub drained: u64,
    /// Claims given back by draining so far on this thread.
    pub released: u64,
}

struct Frame {
    id: u64,
    claims: Vec<Object>,
}

struct PoolStack {
    frames: Vec<Frame>,
    next_id: u64,
    drained: u64,
    released: u64,
}

impl PoolStack {
    const fn new() -> Self {
        PoolStack {
            frames: Vec::new(),
            next_id: 0,
            drained: 0,
            released: 0,
        }
    }
}

// Each thread gets its own pool stack; objects never cross threads.
thread_local! {
    static POOLS: RefCell<PoolStack> = const { RefCell::new(PoolStack::new()) };
}

/// A release pool scope.
///
/// Entering pushes a new active pool; exiting (explicitly or by dropping)
/// gives back every claim it captured. Scopes must be exited in reverse
/// order of entry.
#[must_use = "a scope drains as soon as it is dropped"]
pub struct Scope {
    id: u64,
    exited: Cell<bool>,
    // Pools are per thread.
    _not_send: PhantomData<*const ()>,
}

impl Scope {
    /// Pushes a new active pool.
    pub fn enter() -> Scope {
        let capacity = config().pool_capacity;
        let id = POOLS.with(|pools| {
            let mut pools = pools.borrow_mut();
            let id = pools.next_id;
            pools.next_id += 1;
            pools.frames.push(Frame {
                id,
                claims: Vec::with_capacity(capacity),
            });
            trace!("entered release pool {id} (depth {})", pools.frames.len());
            id
        });
        Scope {
            id,
            exited: Cell::new(false),
            _not_send: PhantomData,
        }
    }

    /// Transfers `object`'s claim to this scope's pool.
    ///
    /// The returned handle can be used until the scope ends, at which point
    /// the claim is given back. This targets this scope's pool even if inner
    /// scopes are active.
    ///
    /// # Panics
    ///
    /// Panics if this scope's pool is no longer on the stack, which only
    /// happens after out-of-order exits.
    pub fn autorelease(&self, object: Object) -> Autoreleased<'_> {
        let alias = object.alias();
        let refused = POOLS.with(|pools| {
            let mut pools = pools.borrow_mut();
            let frame = pools.frames.iter_mut().rev().find(|frame| frame.id == self.id);
            match frame {
                Some(frame) => {
                    frame.claims.push(object);
                    None
                }
                None => Some(object),
            }
        });
        if let Some(object) = refused {
            drop(object);
            misuse(&format!("release pool {} is no longer on the stack", self.id));
        }
        Autoreleased {
            object: alias,
            _scope: PhantomData,
        }
    }

    /// Creates an instance of `T` and autoreleases it into this scope.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Object::create`].
    pub fn create<T: Shape>(&self, args: &[Arg]) -> Result<Option<Autoreleased<'_>>> {
        Ok(T::create(args)?.map(|object| self.autorelease(object)))
    }

    /// Returns `true` if this scope's pool is the active one.
    #[must_use]
    pub fn is_active(&self) -> bool {
        POOLS.with(|pools| pools.borrow().frames.last().is_some_and(|top| top.id == self.id))
    }

    /// Returns the number of claims this scope's pool holds.
    #[must_use]
    pub fn pending(&self) -> usize {
        POOLS.with(|pools| {
            pools
                .borrow()
                .frames
                .iter()
                .find(|frame| frame.id == self.id)
                .map_or(0, |frame| frame.claims.len())
        })
    }

    /// Ends the scope, giving back every captured claim.
    ///
    /// # Panics
    ///
    /// Panics if an inner scope is still active.
    pub fn exit(self) {
        self.drain();
    }

    fn drain(&self) {
        if self.exited.replace(true) {
            return;
        }
        let popped = POOLS
            .try_with(|pools| {
                let mut pools = pools.borrow_mut();
                match pools.frames.last() {
                    Some(top) if top.id == self.id => pools.frames.pop(),
                    _ => None,
                }
            })
            .ok();
        let frame = match popped {
            Some(Some(frame)) => frame,
            Some(None) => misuse(&format!(
                "release pool {} exited while an inner pool is still active",
                self.id
            )),
            // Thread teardown already dropped the stack, and with it the claims.
            None => return,
        };

        let Frame { id, mut claims } = frame;
        debug!("release pool {id}: {} -> {} ({} claims)", PoolState::Active, PoolState::Draining, claims.len());
        let count = claims.len();
        while let Some(claim) = claims.pop() {
            drop(claim);
        }
        let _ = POOLS.try_with(|pools| {
            let mut pools = pools.borrow_mut();
            pools.drained += 1;
            pools.released += count as u64;
        });
        trace!("release pool {id}: {}", PoolState::Destroyed);
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.drain();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// An instance whose claim belongs to a release pool.
///
/// Dereferences to the [`Object`] and stays valid until its scope ends. Use
/// [`Object::retain`] on it to keep the instance beyond that.
pub struct Autoreleased<'scope> {
    object: ManuallyDrop<Object>,
    _scope: PhantomData<&'scope Scope>,
}

impl Deref for Autoreleased<'_> {
    type Target = Object;

    fn deref(&self) -> &Object {
        &self.object
    }
}

impl fmt::Debug for Autoreleased<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Autoreleased").field(&*self.object).finish()
    }
}

/// Runs `body` inside a fresh scope and drains it afterwards, also when
/// `body` panics.
///
/// ```rust
/// use cobbler::runtime::pool;
///
/// let depth = pool::with_scope(|_| pool::depth());
/// assert_eq!(depth, 1);
/// assert_eq!(pool::depth(), 0);
/// ```
pub fn with_scope<R>(body: impl FnOnce(&Scope) -> R) -> R {
    let scope = Scope::enter();
    let result = body(&scope);
    scope.exit();
    result
}

/// Transfers `object`'s claim to the active pool.
///
/// Returns the instance's identity; the claim is given back when the active
/// scope ends.
///
/// # Errors
///
/// Returns [`Error::NoActivePool`] if no scope is active on this thread. The
/// claim is given back immediately in that case.
pub fn autorelease(object: Object) -> Result<ObjectPtr> {
    let identity = object.as_ptr();
    let refused = POOLS
        .try_with(|pools| match pools.borrow_mut().frames.last_mut() {
            Some(top) => {
                top.claims.push(object);
                None
            }
            None => Some(object),
        })
        .map_err(|_| Error::NoActivePool)?;
    match refused {
        None => Ok(identity),
        Some(object) => {
            drop(object);
            Err(Error::NoActivePool)
        }
    }
}

impl Object {
    /// Transfers this claim to the active release pool.
    ///
    /// # Errors
    ///
    /// See [`autorelease`].
    pub fn autorelease(self) -> Result<ObjectPtr> {
        autorelease(self)
    }
}

/// Returns the number of pools on this thread's stack.
#[must_use]
pub fn depth() -> usize {
    POOLS.try_with(|pools| pools.borrow().frames.len()).unwrap_or(0)
}

/// Returns a snapshot of this thread's pools.
#[must_use]
pub fn stats() -> PoolStats {
    POOLS
        .try_with(|pools| {
            let pools = pools.borrow();
            PoolStats {
                depth: pools.frames.len(),
                pending: pools.frames.last().map_or(0, |top| top.claims.len()),
                pending_total: pools.frames.iter().map(|frame| frame.claims.len()).sum(),
                drained: pools.drained,
                released: pools.released,
            }
        })
        .unwrap_or_default()
}
