//! Instance lifecycle tests
//!
//! Tests for construction, destruction and reference counting:
//! - Destroy runs exactly once, when the last claim is given back
//! - Destroy chains run leaf to root
//! - Declined construction frees without destroy
//! - Copies are independent instances
//!
//! Run with: `cargo test --test lifecycle_test`

mod common;

use cobbler::foundation::{List, PString};
use cobbler::runtime::{Arg, Message, Object, Primitive, Shape, object, define_type};
use common::{Animal, Clinger, Dog, Puppy, Refuser, count_entries, take_journal, unique_name};
use std::alloc::Layout;

#[test]
fn test_single_release_destroys_once() {
    take_journal();
    let animal = Animal::create(&[]).unwrap().unwrap();
    assert_eq!(animal.refcount(), 1);
    assert_eq!(animal.release(), None);
    assert_eq!(count_entries("destroy Animal"), 1);
}

#[test]
fn test_retain_defers_destroy() {
    let dog = Dog::create(&[]).unwrap().unwrap();
    let extra = dog.retain();
    assert_eq!(dog.refcount(), 2);
    take_journal();

    let identity = dog.as_ptr();
    assert_eq!(dog.release(), Some(identity));
    assert_eq!(count_entries("destroy"), 0);
    assert_eq!(extra.send("speak", &[]).unwrap().as_text(), Some("woof"));
    assert_eq!(extra.release(), None);
    assert_eq!(take_journal(), ["destroy Dog", "destroy Animal"]);
}

#[test]
fn test_destroy_chain_runs_leaf_to_root() {
    let puppy = Puppy::create(&[]).unwrap().unwrap();
    take_journal();
    drop(puppy);
    assert_eq!(
        take_journal(),
        ["destroy Puppy", "destroy Dog", "destroy Animal"]
    );
}

#[test]
fn test_declined_construction_skips_destroy() {
    let before = object::live_count();
    take_journal();
    assert!(Refuser::create(&[]).unwrap().is_none());
    assert_eq!(take_journal(), ["create Refuser"]);
    assert_eq!(object::live_count(), before);
}

#[test]
fn test_failed_construction_frees_instance() {
    let before = object::live_count();
    let err = PString::create(&[Arg::Object(List::new().unwrap())]).unwrap_err();
    assert!(matches!(err, cobbler::Error::ArgumentTypeMismatch { .. }));
    assert_eq!(object::live_count(), before);
}

#[test]
fn test_constructor_may_substitute_instance() {
    fn substitute(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
        Ok(Arg::from(Animal::create(&[])?))
    }
    let class = define_type(
        &unique_name("Factory"),
        "Primitive",
        Layout::new::<u8>(),
        &[("create", substitute)],
    )
    .unwrap();
    let before = object::live_count();
    let made = Object::create(class, &[]).unwrap().unwrap();
    assert_eq!(made.class(), Animal::class());
    assert_eq!(made.refcount(), 1);
    assert_eq!(object::live_count(), before + 1);
}

#[test]
fn test_copy_is_independent() {
    let animal = Animal::create(&[]).unwrap().unwrap();
    animal.fields::<Animal>().unwrap().legs.set(3);

    let duplicate = animal.copy().unwrap().unwrap();
    assert_ne!(duplicate, animal);
    assert_eq!(duplicate.class(), Animal::class());
    assert_eq!(duplicate.fields::<Animal>().unwrap().legs.get(), 3);

    take_journal();
    drop(animal);
    assert_eq!(count_entries("destroy Animal"), 1);
    assert_eq!(duplicate.refcount(), 1);
}

#[test]
fn test_live_count_returns_to_baseline() {
    let before = object::live_count();
    {
        let list = List::new().unwrap();
        for word in ["a", "b", "c"] {
            List::push(&list, &PString::new(word).unwrap()).unwrap();
        }
        assert_eq!(object::live_count(), before + 4);
    }
    assert_eq!(object::live_count(), before);
}

#[test]
fn test_root_instance_lifecycle() {
    let before = object::live_count();
    let root = Primitive::create(&[]).unwrap().unwrap();
    assert_eq!(root.class().instance_size(), 0);
    drop(root);
    assert_eq!(object::live_count(), before);
}

#[test]
#[should_panic(expected = "kept 1 claim(s) alive through destroy")]
fn test_resurrection_is_misuse() {
    let clinger = Clinger::create(&[]).unwrap().unwrap();
    drop(clinger);
}
