//! Typed instance layouts.
//!
//! A class's instance payload can be described by a Rust struct, its
//! *shape*. Shapes compose: each one is a `#[repr(C)]` struct whose first
//! field, `base`, is the superclass's shape, so a pointer to a derived payload
//! is also a valid pointer to every ancestor's payload.
//!
//! Instances are allocated zero-filled and only then handed to `create`, so
//! every field of a shape must be valid when all its bytes are zero. The
//! [`Zeroable`] trait marks such types. Owned data goes through [`Child`]
//! (a strong reference to another object) or [`Boxed`] (an owned Rust value),
//! both of which start out empty.
//!
//! Shapes are normally declared with [`primitive!`](crate::primitive):
//!
//! ```
//! use cobbler::primitive;
//! use cobbler::runtime::{Arg, Child, Message, Object, Primitive, Shape};
//! use std::cell::Cell;
//!
//! primitive! {
//!     /// A counter with an optional label object.
//!     pub struct DocCounter: Primitive {
//!         pub hits: Cell<u32>,
//!         pub label: Child,
//!     }
//!     methods {
//!         "hit" => hit,
//!     }
//! }
//!
//! fn hit(msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
//!     let this = msg.this::<DocCounter>();
//!     this.hits.set(this.hits.get() + 1);
//!     Ok(Arg::UInt(u64::from(this.hits.get())))
//! }
//!
//! let counter = DocCounter::create(&[]).unwrap().unwrap();
//! counter.send("hit", &[]).unwrap();
//! assert_eq!(counter.send("hit", &[]).unwrap(), Arg::UInt(2));
//! assert_eq!(DocCounter::class().super_class(), Some(Primitive::class()));
//! ```

use crate::error::Result;
use crate::runtime::class::{Class, ClassBuilder};
use crate::runtime::dispatch::Arg;
use crate::runtime::object::{Object, root_copy, root_create, root_destroy};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::OnceLock;

/// Types for which the all-zero bit pattern is a valid value.
///
/// # Safety
///
/// Implementors must guarantee that a value whose bytes are all zero is a
/// valid, initialized instance of the type, and that dropping it is sound.
pub unsafe trait Zeroable {}

macro_rules! impl_zeroable {
    ($($ty:ty),* $(,)?) => {
        $(
            // SAFETY: zero is a valid value of every primitive listed here.
            unsafe impl Zeroable for $ty {}
        )*
    };
}

impl_zeroable!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

// SAFETY: `Cell<T>` has the same in-memory representation as `T`.
unsafe impl<T: Zeroable> Zeroable for Cell<T> {}
// SAFETY: an array of zeroable elements is zeroable.
unsafe impl<T: Zeroable, const N: usize> Zeroable for [T; N] {}
// SAFETY: zero-sized.
unsafe impl<T: ?Sized> Zeroable for PhantomData<T> {}
// SAFETY: a null thin pointer is valid.
unsafe impl<T> Zeroable for *const T {}
// SAFETY: a null thin pointer is valid.
unsafe impl<T> Zeroable for *mut T {}
// SAFETY: `Option<NonNull<T>>` is guaranteed to represent `None` as null.
unsafe impl<T> Zeroable for Option<NonNull<T>> {}
// SAFETY: `Option<Box<T>>` for sized `T` is guaranteed to represent `None` as null.
unsafe impl<T> Zeroable for Option<Box<T>> {}
// SAFETY: `Object` is a transparent wrapper over `NonNull`, so `None` is null.
unsafe impl Zeroable for Option<Object> {}

/// A class instance layout described by a Rust type.
///
/// # Safety
///
/// Implementors must be `#[repr(C)]` with a field of type `Self::Base` at
/// offset zero, and `class()` must return a class registered with
/// [`ClassBuilder::for_shape::<Self>`](ClassBuilder::for_shape). The
/// [`primitive!`](crate::primitive) macro upholds both.
pub unsafe trait Shape: Zeroable + Sized + 'static {
    /// The superclass's shape. The root, [`Primitive`], is its own base.
    type Base: Shape;

    /// Returns the class, registering it on first use.
    ///
    /// Repeated calls return the same class.
    fn class() -> Class;

    /// Creates an instance of this class.
    ///
    /// See [`Object::create`].
    ///
    /// # Errors
    ///
    /// Propagates errors from the `create` implementations.
    fn create(args: &[Arg]) -> Result<Option<Object>> {
        Object::create(Self::class(), args)
    }
}

/// Drops a `T` in place, type-erased for the class descriptor.
///
/// # Safety
///
/// `payload` must point to a live, initialized `T` that is not used again.
pub(crate) unsafe fn drop_payload<T>(payload: *mut u8) {
    // SAFETY: upheld by the caller.
    unsafe { std::ptr::drop_in_place(payload.cast::<T>()) }
}

/// Shape of the root class.
///
/// `Primitive` has no fields. Its class provides the default `create`
/// (reply with the receiver), `copy` (bitwise duplicate of the longest
/// copyable prefix) and `destroy` (nothing to release).
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Primitive {}

// SAFETY: zero-sized.
unsafe impl Zeroable for Primitive {}

// SAFETY: `Primitive` is the root; it has no base field and is its own base.
unsafe impl Shape for Primitive {
    type Base = Primitive;

    fn class() -> Class {
        static CLASS: OnceLock<Class> = OnceLock::new();
        *CLASS.get_or_init(|| {
            ClassBuilder::for_shape::<Primitive>("Primitive")
                .method("create", root_create)
                .method("copy", root_copy)
                .method("destroy", root_destroy)
                .install()
        })
    }
}

/// A strong reference to another object, held in an instance field.
///
/// Starts out empty. Whatever it holds is released when it is replaced,
/// taken and dropped, or when the owning instance is torn down.
#[repr(transparent)]
#[derive(Default)]
pub struct Child(Cell<Option<Object>>);

// SAFETY: `Cell<Option<Object>>` is zeroable and `Child` is transparent over it.
unsafe impl Zeroable for Child {}

impl Child {
    /// Stores `object`, returning the previous occupant.
    pub fn set(&self, object: Object) -> Option<Object> {
        self.0.replace(Some(object))
    }

    /// Removes and returns the occupant.
    pub fn take(&self) -> Option<Object> {
        self.0.take()
    }

    /// Returns a new claim on the occupant.
    #[must_use]
    pub fn get(&self) -> Option<Object> {
        let current = self.0.take();
        let claim = current.as_ref().map(Object::retain);
        self.0.set(current);
        claim
    }

    /// Returns `true` if an object is stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        let current = self.0.take();
        let set = current.is_some();
        self.0.set(current);
        set
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Child").field(&self.get()).finish()
    }
}

/// An owned, heap-allocated Rust value held in an instance field.
///
/// Starts out empty and is dropped with the owning instance.
#[repr(transparent)]
pub struct Boxed<T>(Cell<Option<Box<T>>>);

// SAFETY: `Cell<Option<Box<T>>>` is zeroable and `Boxed` is transparent over it.
unsafe impl<T> Zeroable for Boxed<T> {}

impl<T> Default for Boxed<T> {
    fn default() -> Self {
        Boxed(Cell::new(None))
    }
}

impl<T> Boxed<T> {
    /// Stores `value`, returning the previous one.
    pub fn set(&self, value: T) -> Option<T> {
        self.0.replace(Some(Box::new(value))).map(|boxed| *boxed)
    }

    /// Removes and returns the value.
    pub fn take(&self) -> Option<T> {
        self.0.take().map(|boxed| *boxed)
    }

    /// Returns `true` if a value is stored.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.with(|value| value.is_some())
    }

    /// Calls `f` with a shared view of the value.
    ///
    /// The field reads as empty while `f` runs.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let current = self.0.take();
        let result = f(current.as_deref());
        self.0.set(current);
        result
    }

    /// Calls `f` with exclusive access to the value, if there is one.
    ///
    /// The field reads as empty while `f` runs.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut current = self.0.take();
        let result = current.as_deref_mut().map(f);
        self.0.set(current);
        result
    }
}

/// Declares a class shape and its definition site.
///
/// ```text
/// primitive! {
///     pub struct Name: BaseShape {
///         field: Type,
///         ...
///     }
///     methods {
///         "selector" => implementation,
///         ...
///     }
/// }
/// ```
///
/// The struct gets `#[repr(C)]` and a leading `pub base: BaseShape` field.
/// The class is named after the struct and registered the first time
/// `Name::class()` is called. Every field type must implement
/// [`Zeroable`](crate::runtime::Zeroable); this is checked at compile time.
///
/// # Panics
///
/// `Name::class()` panics if another definition already registered a class
/// under the same name.
#[macro_export]
macro_rules! primitive {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $base:ty {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
        $( methods { $( $selector:literal => $imp:expr ),* $(,)? } )?
    ) => {
        $(#[$meta])*
        #[repr(C)]
        $vis struct $name {
            /// Superclass layout.
            pub base: $base,
            $( $(#[$fmeta])* $fvis $field : $fty, )*
        }

        const _: () = {
            const fn assert_zeroable<T: $crate::runtime::Zeroable + ?Sized>() {}
            assert_zeroable::<$base>();
            $( assert_zeroable::<$fty>(); )*
        };

        // SAFETY: `repr(C)` struct whose fields are all `Zeroable` (checked above).
        unsafe impl $crate::runtime::Zeroable for $name {}

        // SAFETY: `base` is the first field of a `repr(C)` struct, and the class
        // is registered from this type's layout.
        unsafe impl $crate::runtime::Shape for $name {
            type Base = $base;

            fn class() -> $crate::runtime::Class {
                static CLASS: ::std::sync::OnceLock<$crate::runtime::Class> =
                    ::std::sync::OnceLock::new();
                *CLASS.get_or_init(|| {
                    $crate::runtime::ClassBuilder::for_shape::<$name>(stringify!($name))
                        $( $( .method($selector, $imp) )* )?
                        .install()
                })
            }
        }
    };
}
