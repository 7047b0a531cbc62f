//! Tagged scalar values.
//!
//! A [`Value`] stores one scalar as a kind tag plus 64 raw bits. Its layout
//! owns nothing, so copies go through the root class's bitwise `copy`.
//! [`Number`] adds typed accessors on top.

use super::{constructed, mismatch};
use crate::error::Result;
use crate::primitive;
use crate::runtime::{Arg, Message, Object, Primitive, Shape};
use std::cell::Cell;
use std::fmt;

/// Kind of scalar held by a [`Value`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// Nothing stored.
    #[default]
    Empty = 0,
    Int = 1,
    UInt = 2,
    Float = 3,
    Char = 4,
    Bool = 5,
}

impl ValueKind {
    /// Returns the kind's name as replied by `type`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Empty => "empty",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::Char => "char",
            ValueKind::Bool => "bool",
        }
    }

    fn from_tag(tag: u8) -> ValueKind {
        match tag {
            1 => ValueKind::Int,
            2 => ValueKind::UInt,
            3 => ValueKind::Float,
            4 => ValueKind::Char,
            5 => ValueKind::Bool,
            _ => ValueKind::Empty,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

primitive! {
    /// A single tagged scalar.
    pub struct Value: Primitive {
        kind: Cell<u8>,
        bits: Cell<u64>,
    }
    methods {
        "create" => value_create,
        "type" => value_type,
        "value" => value_value,
        "is_equal" => value_is_equal,
    }
}

primitive! {
    /// Numeric view of a [`Value`].
    pub struct Number: Value {}
    methods {
        "integer" => number_integer,
        "unsigned_integer" => number_unsigned_integer,
        "floating" => number_floating,
        "character" => number_character,
        "boolean" => number_boolean,
    }
}

impl Value {
    /// Returns the kind of scalar stored.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        ValueKind::from_tag(self.kind.get())
    }

    /// Returns the stored scalar, or [`Arg::Nil`] when empty.
    #[must_use]
    pub fn get(&self) -> Arg {
        let bits = self.bits.get();
        match self.kind() {
            ValueKind::Empty => Arg::Nil,
            ValueKind::Int => Arg::Int(bits as i64),
            ValueKind::UInt => Arg::UInt(bits),
            ValueKind::Float => Arg::Float(f64::from_bits(bits)),
            ValueKind::Char => char::from_u32(bits as u32).map_or(Arg::Nil, Arg::Char),
            ValueKind::Bool => Arg::Bool(bits != 0),
        }
    }

    fn store(&self, kind: ValueKind, bits: u64) {
        self.kind.set(kind as u8);
        self.bits.set(bits);
    }
}

impl Number {
    /// Creates a number holding `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentTypeMismatch`](crate::Error::ArgumentTypeMismatch)
    /// if `value` is not a scalar.
    pub fn new(value: impl Into<Arg>) -> Result<Object> {
        constructed("Number", Number::create(&[value.into()])?)
    }
}

fn value_create(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let (kind, bits) = match args.first() {
        None | Some(Arg::Nil) => (ValueKind::Empty, 0),
        Some(Arg::Int(value)) => (ValueKind::Int, *value as u64),
        Some(Arg::UInt(value)) => (ValueKind::UInt, *value),
        Some(Arg::Float(value)) => (ValueKind::Float, value.to_bits()),
        Some(Arg::Char(value)) => (ValueKind::Char, u64::from(*value)),
        Some(Arg::Bool(value)) => (ValueKind::Bool, u64::from(*value)),
        other => return Err(mismatch(msg, 0, "scalar", other)),
    };
    let reply = msg.super_call(args)?;
    msg.this::<Value>().store(kind, bits);
    Ok(reply)
}

fn value_type(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::from(msg.this::<Value>().kind().name()))
}

fn value_value(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(msg.this::<Value>().get())
}

fn value_is_equal(msg: &Message<'_>, args: &[Arg]) -> Result<Arg> {
    let this = msg.this::<Value>();
    let equal = match args.first() {
        Some(Arg::Object(other)) => other
            .fields::<Value>()
            .is_some_and(|other| other.kind() == this.kind() && other.bits.get() == this.bits.get()),
        Some(scalar) => this.get() == *scalar,
        None => false,
    };
    Ok(Arg::Bool(equal))
}

fn number_integer(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Int(msg.this::<Number>().base.get().as_int().unwrap_or_default()))
}

fn number_unsigned_integer(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::UInt(msg.this::<Number>().base.get().as_uint().unwrap_or_default()))
}

fn number_floating(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Float(msg.this::<Number>().base.get().as_float().unwrap_or_default()))
}

fn number_character(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Char(msg.this::<Number>().base.get().as_char().unwrap_or_default()))
}

fn number_boolean(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
    Ok(Arg::Bool(msg.this::<Number>().base.get().as_bool().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_value_kinds() {
        let cases = [
            (Arg::Int(-3), "int"),
            (Arg::UInt(3), "uint"),
            (Arg::Float(0.5), "float"),
            (Arg::Char('z'), "char"),
            (Arg::Bool(true), "bool"),
            (Arg::Nil, "empty"),
        ];
        for (scalar, kind) in cases {
            let value = Value::create(&[scalar.clone()]).unwrap().unwrap();
            assert_eq!(value.send("type", &[]).unwrap().as_text(), Some(kind));
            assert_eq!(value.send("value", &[]).unwrap(), scalar);
        }
    }

    #[test]
    fn test_value_rejects_non_scalars() {
        let err = Value::create(&[Arg::from("text")]).unwrap_err();
        assert!(matches!(
            err,
            Error::ArgumentTypeMismatch { expected: "scalar", got: "text", .. }
        ));
    }

    #[test]
    fn test_value_copy_is_bitwise() {
        assert!(Value::class().is_bitwise_copyable());
        let value = Value::create(&[Arg::Float(2.25)]).unwrap().unwrap();
        let duplicate = value.copy().unwrap().unwrap();
        assert_ne!(duplicate, value);
        assert_eq!(duplicate.send("is_equal", &[Arg::Object(value)]).unwrap(), Arg::Bool(true));
    }

    #[test]
    fn test_number_accessors() {
        let number = Number::new(42i64).unwrap();
        assert_eq!(number.send("integer", &[]).unwrap(), Arg::Int(42));
        assert_eq!(number.send("unsigned_integer", &[]).unwrap(), Arg::UInt(0));
        assert_eq!(number.send("floating", &[]).unwrap(), Arg::Float(0.0));
        assert_eq!(number.send("type", &[]).unwrap().as_text(), Some("int"));

        let flag = Number::new(true).unwrap();
        assert_eq!(flag.send("boolean", &[]).unwrap(), Arg::Bool(true));
        assert_eq!(flag.send("character", &[]).unwrap(), Arg::Char('\0'));
    }

    #[test]
    fn test_number_is_a_value() {
        let number = Number::new('q').unwrap();
        assert!(number.is_instance_of(&Value::class()));
        assert_eq!(number.fields::<Value>().map(Value::kind), Some(ValueKind::Char));
        assert_eq!(number.send("is_equal", &[Arg::Char('q')]).unwrap(), Arg::Bool(true));
    }
}
