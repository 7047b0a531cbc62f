// Common test utilities for integration tests
//
// Shared class fixtures and an event journal used across the integration
// tests. The journal is thread-local because instances never leave the
// thread that created them, and the test harness runs tests on many threads.

#![allow(dead_code)]

use cobbler::primitive;
use cobbler::runtime::{Arg, Message, Primitive};
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Returns a class name no other test in this binary uses.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", NEXT_ID.fetch_add(1, Ordering::SeqCst))
}

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Appends an entry to this thread's journal.
pub fn record(entry: impl Into<String>) {
    JOURNAL.with(|journal| journal.borrow_mut().push(entry.into()));
}

/// Removes and returns this thread's journal entries.
pub fn take_journal() -> Vec<String> {
    JOURNAL.with(|journal| journal.take())
}

/// Number of journal entries starting with `prefix`.
pub fn count_entries(prefix: &str) -> usize {
    JOURNAL.with(|journal| {
        journal
            .borrow()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    })
}

/// `create` that initializes the parent first, then journals `create <class>`.
pub fn traced_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    let reply = msg.super_call(args)?;
    record(format!("create {}", msg.class().name()));
    Ok(reply)
}

/// `destroy` that journals `destroy <class>`, then tears down the parent.
pub fn traced_destroy(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    record(format!("destroy {}", msg.class().name()));
    msg.super_call(args)
}

// ============================================================================
// Animal <- Dog <- Puppy
// ============================================================================

primitive! {
    pub struct Animal: Primitive {
        pub legs: Cell<u32>,
    }
    methods {
        "create" => animal_create,
        "destroy" => traced_destroy,
        "speak" => animal_speak,
        "describe" => animal_describe,
    }
}

primitive! {
    pub struct Dog: Animal {}
    methods {
        "create" => traced_create,
        "destroy" => traced_destroy,
        "speak" => dog_speak,
    }
}

primitive! {
    pub struct Puppy: Dog {}
    methods {
        "create" => traced_create,
        "destroy" => traced_destroy,
    }
}

fn animal_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    let reply = traced_create(msg, args)?;
    msg.this::<Animal>().legs.set(4);
    Ok(reply)
}

fn animal_speak(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    Ok(Arg::from("..."))
}

fn dog_speak(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    Ok(Arg::from("woof"))
}

fn animal_describe(msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    let sound = msg.send("speak", &[])?;
    Ok(Arg::Text(format!("{} says {sound}", msg.receiver().class().name())))
}

// ============================================================================
// Classes with unusual lifecycles
// ============================================================================

primitive! {
    /// Declines construction by replying nil.
    pub struct Refuser: Primitive {}
    methods {
        "create" => refuse_create,
        "destroy" => traced_destroy,
    }
}

fn refuse_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    traced_create(msg, args)?;
    Ok(Arg::Nil)
}

thread_local! {
    static STASH: RefCell<Vec<cobbler::Object>> = const { RefCell::new(Vec::new()) };
}

primitive! {
    /// Keeps itself alive from its own destructor.
    pub struct Clinger: Primitive {}
    methods {
        "destroy" => cling_destroy,
    }
}

fn cling_destroy(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    STASH.with(|stash| stash.borrow_mut().push(msg.receiver().retain()));
    msg.super_call(args)
}
