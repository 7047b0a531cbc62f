//! Cobbler: a minimal class-based object runtime.
//!
//! Cobbler lets a program define classes at runtime and work with their
//! instances through message sends. It provides:
//!
//! - **Class Registry** keyed by name, with single inheritance and forward declarations
//! - **Virtual Dispatch** resolved from the receiver's runtime class, plus super and static calls
//! - **Instance Lifecycle** with constructor and destructor chains that run through the hierarchy
//! - **Reference Counting** with exactly-once destruction
//! - **Release Pools** that defer a release to the end of a lexical scope
//!
//! # Architecture
//!
//! - [`runtime`]: the object model itself
//! - [`foundation`]: string, list and scalar classes defined on top of it
//! - [`error`]: the error type shared by both
//!
//! Class metadata lives in a process-wide arena (`cobbler-mem`) and is never
//! freed. Instances, reference counts and release pools are per thread.
//!
//! # Example
//!
//! ```rust
//! use cobbler::foundation::{List, PString};
//! use cobbler::runtime::with_scope;
//!
//! with_scope(|scope| {
//!     let list = scope.autorelease(List::new().unwrap());
//!     List::push(&list, &PString::new("hello").unwrap()).unwrap();
//!     assert_eq!(List::len(&list), 1);
//! });
//! ```

pub mod error;
pub mod foundation;
pub mod runtime;

pub use error::{Error, Result};
use foundation::{List, Number, PString, Value};
pub use runtime::{
    Arg, Class, ClassBuilder, Message, Object, Primitive, Scope, Shape, with_scope,
};

/// Classes registered before the first lookup by name, so name-based
/// definitions and [`runtime::create_instance`] can always reach them.
pub(crate) const BUILTIN_CLASSES: &[fn() -> Class] = &[
    <Primitive as Shape>::class,
    <PString as Shape>::class,
    <List as Shape>::class,
    <Value as Shape>::class,
    <Number as Shape>::class,
];
