//! Foundation classes built on the runtime.
//!
//! These are ordinary clients of the registration interface: they declare
//! their shapes with [`primitive!`](crate::primitive), override `create`,
//! `copy` and `destroy` where they own resources, and talk to each other only
//! through messages.
//!
//! - [`PString`]: immutable text
//! - [`List`]: ordered sequence of retained objects
//! - [`Value`]: tagged scalar
//! - [`Number`]: numeric accessors over [`Value`]

pub mod list;
pub mod string;
pub mod value;

pub use list::List;
pub use string::PString;
pub use value::{Number, Value, ValueKind};

use crate::error::{Error, Result};
use crate::runtime::{Arg, Message, Object};

/// Borrows argument `index` as an instance.
pub(crate) fn object_arg<'a>(msg: &Message<'_>, args: &'a [Arg], index: usize) -> Result<&'a Object> {
    match args.get(index) {
        Some(Arg::Object(object)) => Ok(object),
        other => Err(mismatch(msg, index, "object", other)),
    }
}

pub(crate) fn mismatch(msg: &Message<'_>, index: usize, expected: &'static str, got: Option<&Arg>) -> Error {
    Error::ArgumentTypeMismatch {
        method: msg.selector().to_string(),
        index,
        expected,
        got: got.map_or("nothing", Arg::kind),
    }
}

/// Turns a constructor result into an instance, treating nil as an error.
pub(crate) fn constructed(class: &str, created: Option<Object>) -> Result<Object> {
    created.ok_or_else(|| Error::UnexpectedReply {
        method: format!("{class}.create"),
        reply: "nil",
    })
}
