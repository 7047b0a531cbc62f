//! Immutable runtime strings.

use super::{constructed, mismatch};
use crate::error::Result;
use crate::primitive;
use crate::runtime::{Arg, Boxed, Message, Object, Primitive, Shape};

primitive! {
    /// Immutable text.
    ///
    /// `create` takes the text as its first argument (empty when absent);
    /// any non-text scalar is stored in its display form.
    pub struct PString: Primitive {
        text: Boxed<String>,
    }
    methods {
        "create" => string_create,
        "copy" => string_copy,
        "destroy" => string_destroy,
        "c_string" => string_c_string,
        "length" => string_length,
        "is_equal" => string_is_equal,
    }
}

impl PString {
    /// Creates a string instance holding `text`.
    ///
    /// # Errors
    ///
    /// Propagates errors from `create`.
    pub fn new(text: &str) -> Result<Object> {
        constructed("PString", PString::create(&[Arg::from(text)])?)
    }

    /// Returns the text of a string instance, or `None` for anything else.
    #[must_use]
    pub fn text(object: &Object) -> Option<String> {
        object
            .fields::<PString>()
            .map(|string| string.text.with(|text| text.cloned().unwrap_or_default()))
    }
}

fn string_create(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let text = match args.first() {
        None | Some(Arg::Nil) => String::new(),
        Some(Arg::Text(text)) => text.clone(),
        Some(object @ Arg::Object(_)) => return Err(mismatch(msg, 0, "text", Some(object))),
        Some(scalar) => scalar.to_string(),
    };
    let reply = msg.super_call(args)?;
    msg.this::<PString>().text.set(text);
    Ok(reply)
}

fn string_copy(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let reply = msg.super_call(args)?;
    if let Some(duplicate) = reply.as_object() {
        let text = msg.this::<PString>().text.with(|text| text.cloned());
        if let (Some(text), Some(fields)) = (text, duplicate.fields::<PString>()) {
            fields.text.set(text);
        }
    }
    Ok(reply)
}

fn string_destroy(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    msg.this::<PString>().text.take();
    msg.super_call(args)
}

fn string_c_string(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Text(PString::text(msg.receiver()).unwrap_or_default()))
}

fn string_length(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    let length = msg.this::<PString>().text.with(|text| text.map_or(0, |t| t.chars().count()));
    Ok(Arg::UInt(length as u64))
}

fn string_is_equal(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let ours = PString::text(msg.receiver());
    let equal = match args.first() {
        Some(Arg::Object(other)) => PString::text(other).is_some_and(|theirs| Some(theirs) == ours),
        Some(Arg::Text(theirs)) => ours.as_deref() == Some(theirs.as_str()),
        _ => false,
    };
    Ok(Arg::Bool(equal))
}
