//! Ordered collections of objects.

use super::{constructed, mismatch, object_arg};
use crate::error::{Error, Result};
use crate::primitive;
use crate::runtime::{Arg, Boxed, Message, Object, Primitive, Shape};
use cobbler_log::trace;

primitive! {
    /// An ordered sequence holding a claim on each element.
    ///
    /// Elements are released, oldest first, when the list is destroyed.
    pub struct List: Primitive {
        items: Boxed<Vec<Object>>,
    }
    methods {
        "create" => list_create,
        "copy" => list_copy,
        "destroy" => list_destroy,
        "push" => list_push,
        "count" => list_count,
        "at" => list_at,
    }
}

impl List {
    /// Creates an empty list.
    ///
    /// # Errors
    ///
    /// Propagates errors from `create`.
    pub fn new() -> Result<Object> {
        constructed("List", List::create(&[])?)
    }

    /// Appends `item`, taking a new claim on it.
    ///
    /// # Errors
    ///
    /// Propagates errors from `push`.
    pub fn push(list: &Object, item: &Object) -> Result<()> {
        list.send("push", &[Arg::Object(item.retain())]).map(drop)
    }

    /// Returns the number of elements, or zero for anything that is not a list.
    #[must_use]
    pub fn len(list: &Object) -> usize {
        list.fields::<List>()
            .map_or(0, |fields| fields.items.with(|items| items.map_or(0, Vec::len)))
    }

    /// Returns new claims on every element, in order.
    #[must_use]
    pub fn items(list: &Object) -> Vec<Object> {
        list.fields::<List>()
            .map(|fields| fields.items.with(|items| items.cloned().unwrap_or_default()))
            .unwrap_or_default()
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedReply`] if the list replies with something
    /// other than an instance or nil.
    pub fn at(list: &Object, index: usize) -> Result<Option<Object>> {
        match list.send("at", &[Arg::from(index as u64)])? {
            Arg::Object(item) => Ok(Some(item)),
            Arg::Nil => Ok(None),
            other => Err(Error::UnexpectedReply {
                method: "at".to_string(),
                reply: other.kind(),
            }),
        }
    }
}

fn list_create(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let reply = msg.super_call(args)?;
    msg.this::<List>().items.set(Vec::new());
    Ok(reply)
}

fn list_copy(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let reply = msg.super_call(args)?;
    if let Some(fields) = reply.as_object().and_then(|duplicate| duplicate.fields::<List>()) {
        fields.items.set(List::items(msg.receiver()));
    }
    Ok(reply)
}

fn list_destroy(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    if let Some(items) = msg.this::<List>().items.take() {
        trace!("releasing {} list element(s)", items.len());
        drop(items);
    }
    msg.super_call(args)
}

fn list_push(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let item = object_arg(msg, args, 0)?.retain();
    let list = msg.this::<List>();
    if !list.items.is_set() {
        list.items.set(Vec::new());
    }
    let count = list.items.with_mut(|items| {
        items.push(item);
        items.len()
    });
    Ok(Arg::UInt(count.unwrap_or_default() as u64))
}

fn list_count(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    let count = msg.this::<List>().items.with(|items| items.map_or(0, Vec::len));
    Ok(Arg::UInt(count as u64))
}

fn list_at(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let index = match args.first() {
        Some(Arg::UInt(index)) => usize::try_from(*index).ok(),
        Some(Arg::Int(index)) => usize::try_from(*index).ok(),
        other => return Err(mismatch(msg, 0, "index", other)),
    };
    let item = index.and_then(|index| {
        msg.this::<List>()
            .items
            .with(|items| items.and_then(|items| items.get(index).cloned()))
    });
    Ok(Arg::from(item))
}
