//! Message dispatch.
//!
//! - [`send_message`]: virtual call. The method is resolved starting at the
//!   receiver's runtime class, so the most-derived override runs.
//! - [`Message::super_call`]: super call. Resolution starts at the superclass
//!   of the class that supplied the *running* implementation, never at the
//!   receiver's class. A base implementation that super-calls therefore
//!   reaches its own parent even when the receiver is a deeper subclass.
//! - [`send_static`]: non-virtual call resolved from a named class.
//!
//! Arguments and replies travel as [`Arg`] values.

use crate::error::{Error, Result};
use crate::runtime::class::Class;
use crate::runtime::object::Object;
use crate::runtime::shape::Shape;
use std::fmt;

/// A dynamically typed argument or reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Arg {
    /// No value.
    #[default]
    Nil,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// Character.
    Char(char),
    /// Owned text.
    Text(String),
    /// A claim on an instance.
    Object(Object),
}

impl Arg {
    /// Returns a short name for the kind of value held.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Nil => "nil",
            Arg::Bool(_) => "bool",
            Arg::Int(_) => "int",
            Arg::UInt(_) => "uint",
            Arg::Float(_) => "float",
            Arg::Char(_) => "char",
            Arg::Text(_) => "text",
            Arg::Object(_) => "object",
        }
    }

    /// Returns `true` for [`Arg::Nil`].
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Arg::Nil)
    }

    /// Borrows the instance, if this is one.
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Arg::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Takes the instance, if this is one.
    #[must_use]
    pub fn into_object(self) -> Option<Object> {
        match self {
            Arg::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Arg::Bool(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Arg::Int(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match *self {
            Arg::UInt(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Arg::Float(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match *self {
            Arg::Char(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Nil => f.write_str("nil"),
            Arg::Bool(value) => write!(f, "{value}"),
            Arg::Int(value) => write!(f, "{value}"),
            Arg::UInt(value) => write!(f, "{value}"),
            Arg::Float(value) => write!(f, "{value}"),
            Arg::Char(value) => write!(f, "{value}"),
            Arg::Text(text) => f.write_str(text),
            Arg::Object(object) => write!(f, "<{} {:#x}>", object.class().name(), object.as_ptr().addr()),
        }
    }
}

macro_rules! impl_from_for_arg {
    ($($ty:ty => $variant:ident via $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::$variant(<$conv>::from(value))
                }
            }
        )*
    };
}

impl_from_for_arg!(
    bool => Bool via bool,
    i8 => Int via i64,
    i16 => Int via i64,
    i32 => Int via i64,
    i64 => Int via i64,
    u8 => UInt via u64,
    u16 => UInt via u64,
    u32 => UInt via u64,
    u64 => UInt via u64,
    f32 => Float via f64,
    f64 => Float via f64,
    char => Char via char,
    String => Text via String,
    &str => Text via String,
    Object => Object via Object,
);

impl From<Option<Object>> for Arg {
    fn from(value: Option<Object>) -> Self {
        value.map_or(Arg::Nil, Arg::Object)
    }
}

/// The message an implementation is handling.
///
/// Besides the receiver, a message remembers the class whose method table
/// supplied the running implementation. Super calls start above that class.
pub struct Message<'a> {
    receiver: &'a Object,
    class: Class,
    selector: &'static str,
}

impl<'a> Message<'a> {
    /// Returns the receiving instance.
    #[must_use]
    pub fn receiver(&self) -> &'a Object {
        self.receiver
    }

    /// Returns the class that supplied the running implementation.
    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    /// Returns the selector being handled.
    #[must_use]
    pub fn selector(&self) -> &'static str {
        self.selector
    }

    /// Views the receiver's payload as shape `T`.
    ///
    /// # Panics
    ///
    /// Panics if the receiver is not an instance of `T`'s class. Methods
    /// registered on `T`'s class (or below) can always view it as `T`.
    #[must_use]
    pub fn this<T: Shape>(&self) -> &'a T {
        match self.receiver.fields::<T>() {
            Some(fields) => fields,
            None => panic!(
                "{} receiver of '{}' is not an instance of {}",
                self.receiver.class().name(),
                self.selector,
                T::class().name()
            ),
        }
    }

    /// Invokes the parent's implementation of the running selector on the
    /// same receiver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MethodNotFound`] if no class above the providing
    /// class implements the selector (always the case at the root).
    ///
    /// # Example
    ///
    /// ```rust
    /// use cobbler::primitive;
    /// use cobbler::runtime::{Arg, Message, Primitive, Shape};
    /// use std::cell::Cell;
    ///
    /// primitive! {
    ///     struct DocTally: Primitive { ready: Cell<bool> }
    ///     methods { "create" => tally_create }
    /// }
    ///
    /// fn tally_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    ///     let reply = msg.super_call(args)?;
    ///     msg.this::<DocTally>().ready.set(true);
    ///     Ok(reply)
    /// }
    ///
    /// let tally = DocTally::create(&[]).unwrap().unwrap();
    /// assert!(tally.fields::<DocTally>().unwrap().ready.get());
    /// ```
    pub fn super_call(&self, args: &[Arg]) -> Result<Arg> {
        let not_found = || Error::MethodNotFound {
            class: self.class.name().to_string(),
            method: self.selector.to_string(),
        };
        let parent = self.class.super_class().ok_or_else(not_found)?;
        let (provider, method) = parent.resolve(self.selector).ok_or_else(not_found)?;
        (method.imp)(
            &Message {
                receiver: self.receiver,
                class: provider,
                selector: self.selector,
            },
            args,
        )
    }

    /// Sends another message to the receiver through virtual dispatch.
    ///
    /// # Errors
    ///
    /// See [`send_message`].
    pub fn send(&self, selector: &str, args: &[Arg]) -> Result<Arg> {
        send_message(self.receiver, selector, args)
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("receiver", self.receiver)
            .field("class", &self.class.name())
            .field("selector", &self.selector)
            .finish()
    }
}

/// Sends `selector` to `receiver`, resolving from its runtime class.
///
/// # Errors
///
/// Returns [`Error::MethodNotFound`] if nothing on the chain implements
/// `selector`; otherwise the implementation's result.
pub fn send_message(receiver: &Object, selector: &str, args: &[Arg]) -> Result<Arg> {
    dispatch_from(receiver.class(), receiver, selector, args)
}

/// Sends `selector` to `receiver`, resolving from `class` instead of the
/// receiver's runtime class.
///
/// Overrides below `class` are bypassed.
///
/// # Errors
///
/// Returns [`Error::NotAnInstance`] if `receiver` is not an instance of
/// `class`, and [`Error::MethodNotFound`] if `class`'s chain does not
/// implement `selector`.
pub fn send_static(class: Class, receiver: &Object, selector: &str, args: &[Arg]) -> Result<Arg> {
    if !receiver.is_instance_of(&class) {
        return Err(Error::NotAnInstance {
            class: receiver.class().name().to_string(),
            expected: class.name().to_string(),
        });
    }
    dispatch_from(class, receiver, selector, args)
}

fn dispatch_from(start: Class, receiver: &Object, selector: &str, args: &[Arg]) -> Result<Arg> {
    let Some((provider, method)) = start.resolve(selector) else {
        return Err(Error::MethodNotFound {
            class: start.name().to_string(),
            method: selector.to_string(),
        });
    };
    (method.imp)(
        &Message {
            receiver,
            class: provider,
            selector: method.name,
        },
        args,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ClassBuilder, Primitive};
    use std::alloc::Layout;

    fn whoami(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
        Ok(Arg::from(msg.class().name()))
    }

    fn echo(_msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
        Ok(args.first().cloned().unwrap_or_default())
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Arg::from(3i32), Arg::Int(3));
        assert_eq!(Arg::from(3u8), Arg::UInt(3));
        assert_eq!(Arg::from(1.5f32), Arg::Float(1.5));
        assert_eq!(Arg::from("hi").as_text(), Some("hi"));
        assert_eq!(Arg::from(None::<Object>), Arg::Nil);
        assert_eq!(Arg::Char('x').as_char(), Some('x'));
        assert_eq!(Arg::Bool(true).as_int(), None);
        assert_eq!(Arg::UInt(7).kind(), "uint");
        assert!(Arg::default().is_nil());
    }

    #[test]
    fn test_arg_display() {
        assert_eq!(Arg::Int(-4).to_string(), "-4");
        assert_eq!(Arg::from("word").to_string(), "word");
        assert_eq!(Arg::Nil.to_string(), "nil");
    }

    #[test]
    fn test_send_reports_provider() {
        let base = ClassBuilder::with_layout("DispatchTestBase", Primitive::class(), Layout::new::<u8>())
            .method("whoami", whoami)
            .method("echo", echo)
            .register()
            .unwrap();
        let derived = ClassBuilder::with_layout("DispatchTestDerived", base, Layout::new::<u8>())
            .register()
            .unwrap();
        let object = Object::create(derived, &[]).unwrap().unwrap();

        assert_eq!(object.send("whoami", &[]).unwrap().as_text(), Some("DispatchTestBase"));
        assert_eq!(object.send("echo", &[Arg::Int(9)]).unwrap(), Arg::Int(9));
    }

    #[test]
    fn test_missing_method() {
        let object = Object::create(Primitive::class(), &[]).unwrap().unwrap();
        assert_eq!(
            object.send("fly", &[]).unwrap_err(),
            Error::MethodNotFound {
                class: "Primitive".into(),
                method: "fly".into()
            }
        );
    }

    #[test]
    fn test_send_static_checks_receiver() {
        let other = ClassBuilder::with_layout("DispatchTestUnrelated", Primitive::class(), Layout::new::<u8>())
            .method("whoami", whoami)
            .register()
            .unwrap();
        let object = Object::create(Primitive::class(), &[]).unwrap().unwrap();
        assert!(matches!(
            send_static(other, &object, "whoami", &[]),
            Err(Error::NotAnInstance { .. })
        ));
    }
}
