//! Cobbler runtime module.
//!
//! # Architecture
//!
//! - [`class`]: class descriptors, the name registry and method resolution
//! - [`shape`]: typed instance layouts and the root class `Primitive`
//! - [`object`]: instance allocation, lifecycle and reference counting
//! - [`dispatch`]: virtual, super and static calls
//! - [`pool`]: scoped release pools
//! - [`config`]: process-wide tunables
//!
//! # Metadata Arena
//!
//! Class descriptors, names and method tables are placed in one
//! process-lifetime [`MetadataArena`](cobbler_mem::MetadataArena), created on
//! first registration with the configured chunk size.

pub mod class;
pub mod config;
pub mod dispatch;
pub mod object;
pub mod pool;
pub mod shape;

pub use class::{
    Class, ClassBuilder, Imp, Method, all_classes, class_named, declare_type, define_type,
    is_declared,
};
pub use config::{RuntimeConfig, configure};
pub use dispatch::{Arg, Message, send_message, send_static};
pub use object::{Object, ObjectPtr};
pub use pool::{Autoreleased, PoolState, PoolStats, Scope, autorelease, with_scope};
pub use shape::{Boxed, Child, Primitive, Shape, Zeroable};

use crate::error::{Error, Result};
use cobbler_mem::MetadataArena;
use std::alloc::Layout;
use std::sync::OnceLock;

static METADATA: OnceLock<MetadataArena> = OnceLock::new();

/// Returns the arena holding class metadata.
pub(crate) fn metadata_arena() -> &'static MetadataArena {
    METADATA.get_or_init(|| MetadataArena::new(config::config().metadata_chunk_size))
}

/// Returns allocation statistics of the class metadata arena.
#[must_use]
pub fn metadata_stats() -> cobbler_mem::ArenaStats {
    metadata_arena().stats()
}

/// Creates an instance of the class registered under `name`.
///
/// # Errors
///
/// Returns [`Error::ClassNotDefined`] if no such class is defined, otherwise
/// as [`Object::create`].
///
/// # Example
///
/// ```rust
/// use cobbler::runtime::create_instance;
///
/// let list = create_instance("List", &[]).unwrap().unwrap();
/// assert_eq!(list.class().name(), "List");
/// assert!(create_instance("NoSuchClass", &[]).is_err());
/// ```
pub fn create_instance(name: &str, args: &[Arg]) -> Result<Option<Object>> {
    let class = class_named(name).ok_or_else(|| Error::ClassNotDefined {
        name: name.to_string(),
    })?;
    Object::create(class, args)
}

/// Zero-filled payload layout of `size` bytes aligned for any scalar field.
#[must_use]
pub fn raw_layout(size: usize) -> Layout {
    match Layout::from_size_align(size, std::mem::align_of::<u64>()) {
        Ok(layout) => layout,
        Err(_) => panic!("payload of {size} bytes is too large"),
    }
}

/// Reports unrecoverable misuse of the runtime.
#[cold]
#[track_caller]
pub(crate) fn misuse(message: &str) -> ! {
    #[cfg(feature = "misuse_backtrace")]
    {
        let trace = backtrace::Backtrace::new();
        panic!("runtime misuse: {message}\n{trace:?}");
    }
    #[cfg(not(feature = "misuse_backtrace"))]
    panic!("runtime misuse: {message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_instance_by_name() {
        let number = create_instance("Number", &[Arg::Int(3)]).unwrap().unwrap();
        assert_eq!(number.class().name(), "Number");
        assert_eq!(number.send("integer", &[]).unwrap(), Arg::Int(3));
    }

    #[test]
    fn test_create_instance_unknown() {
        assert_eq!(
            create_instance("RuntimeTestMissing", &[]).unwrap_err(),
            Error::ClassNotDefined {
                name: "RuntimeTestMissing".into()
            }
        );
    }

    #[test]
    fn test_metadata_lives_in_arena() {
        let _ = Primitive::class();
        let stats = metadata_stats();
        assert!(stats.allocated > 0);
        assert!(stats.capacity >= stats.allocated);
    }

    #[test]
    fn test_raw_layout() {
        let layout = raw_layout(12);
        assert_eq!(layout.size(), 12);
        assert_eq!(layout.align(), 8);
    }
}
