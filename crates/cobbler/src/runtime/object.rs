//! Instance allocation, lifecycle and reference counting.
//!
//! # Architecture
//!
//! Every instance is a single heap allocation:
//!
//! ```text
//! +---------------------------+------------------------------+
//! | Header                    | payload (instance_size bytes) |
//! | class, refcount, flags    | zero-filled at allocation     |
//! +---------------------------+------------------------------+
//! ```
//!
//! - The header records the instance's class and its outstanding claims
//!   (the reference count), starting at one.
//! - An [`Object`] handle *is* a claim: `Clone` (or [`Object::retain`]) adds
//!   one, `Drop` (or [`Object::release`]) gives one back.
//! - When the last claim is given back, the `destroy` method chain runs on the
//!   instance, then the payload's own Rust teardown, then the allocation is
//!   freed. This happens exactly once.
//!
//! # Thread Safety
//!
//! Counts are plain integers. `Object` is neither `Send` nor `Sync`, so an
//! instance never leaves the thread that created it.

use crate::error::{Error, Result};
use crate::runtime::class::Class;
use crate::runtime::dispatch::{Arg, Message, send_message};
use crate::runtime::misuse;
use crate::runtime::shape::Shape;
use cobbler_log::{error, trace, warn};
use std::alloc::{self, Layout};
use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

/// Set while the destroy chain and teardown of an instance run.
const FLAG_DEALLOCATING: u32 = 1 << 0;

/// Instance header; the payload follows at the class's payload offset.
#[repr(C)]
pub(crate) struct Header {
    class: Class,
    refcount: Cell<u32>,
    flags: Cell<u32>,
}

/// Layout of a whole instance allocation for the given payload layout,
/// and the offset of the payload within it.
///
/// Returns `None` if the combined layout exceeds `isize::MAX` bytes.
pub(crate) fn allocation_layout(payload: Layout) -> Option<(Layout, usize)> {
    let (layout, offset) = Layout::new::<Header>().extend(payload).ok()?;
    Some((layout.pad_to_align(), offset))
}

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
}

fn note_allocated() {
    let _ = LIVE.try_with(|live| live.set(live.get() + 1));
}

fn note_freed() {
    let _ = LIVE.try_with(|live| live.set(live.get().saturating_sub(1)));
}

/// Returns the number of instances currently alive on this thread.
///
/// ```
/// use cobbler::foundation::Value;
/// use cobbler::runtime::{object, Shape};
///
/// let before = object::live_count();
/// let value = Value::create(&[]).unwrap().unwrap();
/// assert_eq!(object::live_count(), before + 1);
/// drop(value);
/// assert_eq!(object::live_count(), before);
/// ```
#[must_use]
pub fn live_count() -> usize {
    LIVE.try_with(Cell::get).unwrap_or(0)
}

/// An instance's identity, without a claim on it.
///
/// Returned where ownership of the instance moved elsewhere, for example to a
/// release pool. It can be compared against live handles but not used to reach
/// the instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectPtr(NonNull<Header>);

impl ObjectPtr {
    /// Returns the instance address.
    #[must_use]
    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

impl fmt::Debug for ObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPtr({:p})", self.0)
    }
}

/// A claim on a runtime instance.
///
/// # Example
///
/// ```rust
/// use cobbler::foundation::Value;
/// use cobbler::runtime::Shape;
///
/// let first = Value::create(&[]).unwrap().unwrap();
/// assert_eq!(first.refcount(), 1);
///
/// let second = first.clone();
/// assert_eq!(first, second);
/// assert_eq!(first.refcount(), 2);
///
/// // Giving back a claim that is not the last leaves the instance alive.
/// assert!(second.release().is_some());
/// assert_eq!(first.refcount(), 1);
/// ```
#[repr(transparent)]
pub struct Object {
    ptr: NonNull<Header>,
}

impl Object {
    fn header(&self) -> &Header {
        // SAFETY: a handle holds a claim (or is the receiver of a running
        // destroy), so the allocation is live.
        unsafe { self.ptr.as_ref() }
    }

    /// Allocates a zero-filled instance of `class` with one claim.
    ///
    /// No `create` method runs; use [`Object::create`] to construct.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cobbler::runtime::{Object, Primitive, Shape};
    ///
    /// let raw = Object::new_instance(Primitive::class());
    /// assert_eq!(raw.refcount(), 1);
    /// assert_eq!(raw.class(), Primitive::class());
    /// ```
    #[must_use]
    pub fn new_instance(class: Class) -> Object {
        let layout = class.alloc_layout();
        // SAFETY: the layout includes the header, so its size is non-zero.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw.cast::<Header>()) else {
            alloc::handle_alloc_error(layout);
        };
        // SAFETY: freshly allocated with room and alignment for the header.
        unsafe {
            ptr.as_ptr().write(Header {
                class,
                refcount: Cell::new(1),
                flags: Cell::new(0),
            });
        }
        note_allocated();
        trace!("allocated {} instance at {:p}", class.name(), ptr);
        Object { ptr }
    }

    /// Allocates an instance of `class` and runs its `create` chain with `args`.
    ///
    /// Returns `Ok(None)` when a constructor declines by replying nil. The
    /// half-built instance is then discarded without running `destroy`
    /// (unless the constructor handed out further claims on it, in which case
    /// only its own claim is given back). A constructor may also reply with a
    /// different instance, which is returned in place of the allocated one.
    ///
    /// # Errors
    ///
    /// Propagates errors from the `create` implementations, and returns
    /// [`Error::UnexpectedReply`] if one replies with something other than an
    /// instance or nil.
    pub fn create(class: Class, args: &[Arg]) -> Result<Option<Object>> {
        let instance = Object::new_instance(class);
        let reply = match instance.send("create", args) {
            Ok(reply) => reply,
            Err(err) => {
                instance.discard();
                return Err(err);
            }
        };
        match reply {
            Arg::Object(object) => {
                if object == instance {
                    drop(instance);
                } else {
                    instance.discard();
                }
                Ok(Some(object))
            }
            Arg::Nil => {
                warn!("create for {} replied nil; instance discarded", class.name());
                instance.discard();
                Ok(None)
            }
            other => {
                instance.discard();
                Err(Error::UnexpectedReply {
                    method: "create".to_string(),
                    reply: other.kind(),
                })
            }
        }
    }

    /// Frees an instance whose construction failed.
    fn discard(self) {
        let this = ManuallyDrop::new(self);
        let header = this.header();
        if header.refcount.get() != 1 {
            drop(ManuallyDrop::into_inner(this));
            return;
        }
        header.refcount.set(0);
        header.flags.set(header.flags.get() | FLAG_DEALLOCATING);
        // SAFETY: ours was the only claim and it is consumed here.
        unsafe { free(this.ptr) };
    }

    /// Duplicates the instance through its `copy` method.
    ///
    /// # Errors
    ///
    /// Propagates errors from `copy`, and returns [`Error::UnexpectedReply`]
    /// if it replies with something other than an instance or nil.
    pub fn copy(&self) -> Result<Option<Object>> {
        match self.send("copy", &[])? {
            Arg::Object(object) => Ok(Some(object)),
            Arg::Nil => Ok(None),
            other => Err(Error::UnexpectedReply {
                method: "copy".to_string(),
                reply: other.kind(),
            }),
        }
    }

    /// Sends `selector` to this instance through virtual dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MethodNotFound`] if the class chain does not
    /// implement `selector`, or whatever the implementation returns.
    pub fn send(&self, selector: &str, args: &[Arg]) -> Result<Arg> {
        send_message(self, selector, args)
    }

    /// Returns `true` if this instance's class chain implements `selector`.
    #[must_use]
    pub fn responds_to(&self, selector: &str) -> bool {
        self.class().has_method(selector)
    }

    /// Returns the instance's class.
    #[must_use]
    pub fn class(&self) -> Class {
        self.header().class
    }

    /// Returns `true` if this is an instance of `class` or a subclass.
    #[must_use]
    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class().is_subclass_of(class)
    }

    /// Views the payload as shape `T`.
    ///
    /// Returns `None` unless this is an instance of `T`'s class or a subclass.
    #[must_use]
    pub fn fields<T: Shape>(&self) -> Option<&T> {
        if !self.is_instance_of(&T::class()) {
            return None;
        }
        // SAFETY: the payload of any subclass of T's class starts with a T,
        // is aligned for it, and lives as long as this handle.
        Some(unsafe { &*self.payload().as_ptr().cast::<T>() })
    }

    /// Returns a pointer to the zero-initialized payload.
    ///
    /// The payload is `class().instance_size()` bytes and stays valid while
    /// any claim on the instance remains. For classes defined with a raw
    /// layout this is the only way to reach the instance's storage.
    #[must_use]
    pub fn payload(&self) -> NonNull<u8> {
        // SAFETY: the payload offset is within the allocation.
        unsafe { payload_of(self.ptr, self.class()) }
    }

    /// Returns the number of outstanding claims.
    #[must_use]
    pub fn refcount(&self) -> u32 {
        self.header().refcount.get()
    }

    /// Returns this instance's identity.
    #[must_use]
    pub fn as_ptr(&self) -> ObjectPtr {
        ObjectPtr(self.ptr)
    }

    /// Adds a claim and returns it as a new handle.
    ///
    /// # Panics
    ///
    /// Panics if the count would overflow `u32::MAX`.
    #[must_use]
    pub fn retain(&self) -> Object {
        let header = self.header();
        let Some(count) = header.refcount.get().checked_add(1) else {
            misuse(&format!(
                "Reference count overflow in Object::retain ({} instance)",
                header.class.name()
            ));
        };
        header.refcount.set(count);
        Object { ptr: self.ptr }
    }

    /// Gives back this claim.
    ///
    /// Returns `None` if it was the last one and the instance was destroyed,
    /// otherwise the instance's identity.
    pub fn release(self) -> Option<ObjectPtr> {
        let this = ManuallyDrop::new(self);
        let identity = this.as_ptr();
        // SAFETY: the claim held by `this` is consumed here.
        if unsafe { release_claim(this.ptr) } {
            None
        } else {
            Some(identity)
        }
    }

    /// A second handle to this instance that owns no claim.
    pub(crate) fn alias(&self) -> ManuallyDrop<Object> {
        ManuallyDrop::new(Object { ptr: self.ptr })
    }
}

/// # Safety
///
/// `ptr` must be a live instance of `class`.
unsafe fn payload_of(ptr: NonNull<Header>, class: Class) -> NonNull<u8> {
    // SAFETY: upheld by the caller; the offset stays inside the allocation.
    unsafe { ptr.cast::<u8>().add(class.payload_offset()) }
}

/// Gives back one claim. Returns `true` if the instance was destroyed.
///
/// # Safety
///
/// The caller must own a claim on `ptr` and not use it afterwards.
pub(crate) unsafe fn release_claim(ptr: NonNull<Header>) -> bool {
    // SAFETY: the caller's claim keeps the header alive.
    let header = unsafe { ptr.as_ref() };
    let count = header.refcount.get();
    if count == 0 {
        misuse(&format!(
            "{} instance released with no outstanding claims",
            header.class.name()
        ));
    }
    header.refcount.set(count - 1);
    if count > 1 || header.flags.get() & FLAG_DEALLOCATING != 0 {
        return false;
    }
    // SAFETY: the last claim is gone.
    unsafe { destroy(ptr) };
    true
}

/// Runs the destroy chain, then tears down and frees the instance.
///
/// # Safety
///
/// No claims on `ptr` may remain.
unsafe fn destroy(ptr: NonNull<Header>) {
    // SAFETY: no one else frees the instance while we run.
    let header = unsafe { ptr.as_ref() };
    let class = header.class;
    header.flags.set(header.flags.get() | FLAG_DEALLOCATING);

    // The receiver owns no claim: the count is already zero.
    let receiver = ManuallyDrop::new(Object { ptr });
    if let Err(err) = receiver.send("destroy", &[]) {
        error!("destroy for {} instance failed: {err}", class.name());
    }
    let leftover = header.refcount.get();
    if leftover != 0 {
        misuse(&format!(
            "{} instance kept {leftover} claim(s) alive through destroy",
            class.name()
        ));
    }
    // SAFETY: the destroy chain is over and no claims remain.
    unsafe { free(ptr) };
}

/// Runs the payload's Rust teardown and frees the allocation.
///
/// # Safety
///
/// No claims on `ptr` may remain and it must not be used afterwards.
unsafe fn free(ptr: NonNull<Header>) {
    // SAFETY: the allocation is still live.
    let class = unsafe { ptr.as_ref() }.class;
    if let Some(drop_payload) = class.drop_payload() {
        // SAFETY: the payload was laid out for this class and is dropped once.
        unsafe { drop_payload(payload_of(ptr, class).as_ptr()) };
    }
    // SAFETY: allocated in `new_instance` with exactly this layout.
    unsafe { alloc::dealloc(ptr.as_ptr().cast::<u8>(), class.alloc_layout()) };
    note_freed();
    trace!("freed {} instance at {:p}", class.name(), ptr);
}

impl Clone for Object {
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl Drop for Object {
    fn drop(&mut self) {
        // SAFETY: this handle's claim is consumed here.
        unsafe { release_claim(self.ptr) };
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.class().name())
            .field("ptr", &self.ptr)
            .field("refcount", &self.refcount())
            .finish()
    }
}

// ============================================================================
// Root class methods
// ============================================================================

pub(crate) fn root_create(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Object(msg.receiver().retain()))
}

pub(crate) fn root_copy(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    let source = msg.receiver();
    let class = source.class();
    let duplicate = Object::new_instance(class);
    let prefix = class.bitwise_prefix();
    // SAFETY: both payloads belong to `class` and are at least `prefix` bytes;
    // the prefix holds no resources, so duplicating its bytes is a valid copy.
    unsafe {
        ptr::copy_nonoverlapping(
            source.payload().as_ptr(),
            duplicate.payload().as_ptr(),
            prefix,
        );
    }
    Ok(Arg::Object(duplicate))
}

pub(crate) fn root_destroy(_msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Nil)
}
