//! Defines a class that owns a list of words, creates one inside a release
//! pool scope and prints its contents.
//!
//! Run with: `COBBLER_LOG=trace cargo run --example words`

use cobbler::foundation::{List, PString};
use cobbler::primitive;
use cobbler::runtime::{Arg, Child, Message, Primitive, object, with_scope};
use cobbler_log::{error, info};

primitive! {
    /// Holds a list of strings.
    struct Custom: Primitive {
        words: Child,
    }
    methods {
        "create" => custom_create,
        "destroy" => custom_destroy,
        "print" => custom_print,
    }
}

fn custom_create(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    let reply = msg.super_call(args)?;
    let words = List::new()?;
    List::push(&words, &PString::new("hello")?)?;
    List::push(&words, &PString::new("goodbye")?)?;
    msg.this::<Custom>().words.set(words);
    Ok(reply)
}

fn custom_destroy(msg: &Message<'_>, args: &[Arg]) -> cobbler::Result<Arg> {
    if let Some(words) = msg.this::<Custom>().words.take() {
        info!("Custom releasing {} words", List::len(&words));
    }
    msg.super_call(args)
}

fn custom_print(msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
    if let Some(words) = msg.this::<Custom>().words.get() {
        for word in List::items(&words) {
            println!("{}", word.send("c_string", &[])?);
        }
    }
    Ok(Arg::Nil)
}

fn main() {
    if let Err(err) = cobbler_log::init_from_env("COBBLER_LOG") {
        eprintln!("{err}; keeping the default log level");
    }

    let result = with_scope(|scope| -> cobbler::Result<()> {
        let Some(custom) = scope.create::<Custom>(&[])? else {
            return Ok(());
        };
        custom.send("print", &[])?;
        Ok(())
    });
    if let Err(err) = result {
        error!("words failed: {err}");
        std::process::exit(1);
    }
    info!("{} instances alive after the scope ended", object::live_count());
}
