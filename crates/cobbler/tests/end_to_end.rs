//! End-to-end test
//!
//! A user-defined class that owns a list of strings, created autoreleased
//! inside a scope, used, and torn down when the scope drains.
//!
//! Run with: `cargo test --test end_to_end`

mod common;

use cobbler::foundation::{List, PString};
use cobbler::primitive;
use cobbler::runtime::{Arg, Child, Message, Primitive, Shape, object, with_scope};
use cobbler_log::{Level, capture, info};
use common::{count_entries, record, take_journal, traced_destroy};

primitive! {
    struct Custom: Primitive {
        words: Child,
    }
    methods {
        "create" => custom_create,
        "destroy" => traced_destroy,
        "print" => custom_print,
    }
}

fn custom_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    let reply = msg.super_call(args)?;
    let words = List::new()?;
    for word in ["hello", "goodbye"] {
        List::push(&words, &PString::new(word)?)?;
    }
    msg.this::<Custom>().words.set(words);
    record("create Custom");
    Ok(reply)
}

fn custom_print(msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    let Some(words) = msg.this::<Custom>().words.get() else {
        return Ok(Arg::Nil);
    };
    for word in List::items(&words) {
        info!("{}", word.send("c_string", &[])?);
    }
    let line: Vec<String> = List::items(&words).iter().filter_map(PString::text).collect();
    Ok(Arg::Text(line.join(" ")))
}

#[test]
fn test_words_program() {
    let before = object::live_count();
    take_journal();

    let (printed, records) = capture(|| {
        with_scope(|scope| {
            let custom = scope.create::<Custom>(&[]).unwrap().unwrap();
            assert_eq!(object::live_count(), before + 4);
            custom.send("print", &[]).unwrap()
        })
    });

    assert_eq!(printed.as_text(), Some("hello goodbye"));
    let lines: Vec<_> = records
        .iter()
        .filter(|record| record.level == Level::Info)
        .map(|record| record.message.as_str())
        .collect();
    assert_eq!(lines, ["hello", "goodbye"]);

    assert_eq!(take_journal(), ["create Custom", "destroy Custom"]);
    assert_eq!(object::live_count(), before);
}

#[test]
fn test_words_released_with_owner() {
    let custom = Custom::create(&[]).unwrap().unwrap();
    let words = custom.fields::<Custom>().unwrap().words.get().unwrap();
    assert_eq!(words.refcount(), 2);
    let hello = List::at(&words, 0).unwrap().unwrap();
    assert_eq!(PString::text(&hello).as_deref(), Some("hello"));

    drop(custom);
    assert_eq!(count_entries("destroy Custom"), 1);
    assert_eq!(words.refcount(), 1);
    assert_eq!(List::len(&words), 2);
}
