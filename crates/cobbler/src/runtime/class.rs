//! Class descriptors and the global class registry.
//!
//! This module implements:
//! - `Class` descriptors (name, superclass, method table, instance layout)
//! - Registration by name, including forward declarations
//! - Method resolution along the superclass chain
//!
//! # Architecture
//!
//! Classes are **globally registered** and never deallocated:
//! - Each class name maps to exactly one `Class`
//! - Descriptors live in the runtime's metadata arena (`'static`)
//! - Descriptors are immutable once registered, method tables included
//! - Every class except the root `Primitive` has exactly one superclass
//!
//! Because nothing about a descriptor changes after registration, method
//! resolution takes no locks: it scans the class's own table in order and
//! then repeats the scan on each superclass. The first entry with a matching
//! name wins.
//!
//! # Thread Safety
//!
//! Registration goes through an `RwLock`-protected map and may happen from
//! any thread. `Class` handles are `Copy + Send + Sync`.

use crate::error::{Error, Result};
use crate::runtime::dispatch::{Arg, Message};
use crate::runtime::object::allocation_layout;
use crate::runtime::shape::{Primitive, Shape, drop_payload};
use crate::runtime::metadata_arena;
use cobbler_log::{debug, warn};
use fxhash::FxHashMap;
use std::alloc::Layout;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr::NonNull;
use std::sync::{Once, OnceLock, PoisonError, RwLock};

/// Method implementation function pointer.
///
/// An implementation receives the [`Message`] being delivered (receiver,
/// the class that supplied this implementation, and the selector) plus the
/// caller's arguments, and replies with an [`Arg`].
///
/// ```
/// use cobbler::runtime::{Arg, Message};
/// use cobbler::Result;
///
/// fn describe(msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
///     Ok(Arg::from(msg.receiver().class().name()))
/// }
/// let _: cobbler::runtime::Imp = describe;
/// ```
pub type Imp = fn(&Message<'_>, &[Arg]) -> Result<Arg>;

/// One entry of a class's method table.
#[derive(Clone, Copy)]
pub struct Method {
    /// Selector name.
    pub name: &'static str,
    /// Implementation.
    pub imp: Imp,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("imp", &format!("{:p}", self.imp as *const ()))
            .finish()
    }
}

/// Descriptor data stored in the metadata arena.
pub(crate) struct ClassInner {
    name: &'static str,
    super_class: Option<Class>,
    methods: &'static [Method],
    /// Payload layout, excluding the instance header.
    instance_layout: Layout,
    /// Header plus payload.
    alloc_layout: Layout,
    payload_offset: usize,
    /// No drop glue in this layout or any ancestor's.
    bitwise_copy: bool,
    drop_payload: Option<unsafe fn(*mut u8)>,
}

/// A registered class.
///
/// `Class` is a cheap `Copy` handle; two handles are equal exactly when they
/// refer to the same registration.
///
/// # Example
///
/// ```rust
/// use cobbler::runtime::{Primitive, Shape};
///
/// let root = Primitive::class();
/// assert_eq!(root.name(), "Primitive");
/// assert!(root.super_class().is_none());
/// assert!(root.has_method("create"));
/// assert!(root.has_method("copy"));
/// assert!(root.has_method("destroy"));
/// ```
#[derive(Clone, Copy)]
pub struct Class {
    inner: NonNull<ClassInner>,
}

// SAFETY: ClassInner lives in the metadata arena for the rest of the process
// and is never mutated after registration.
unsafe impl Send for Class {}
// SAFETY: see above.
unsafe impl Sync for Class {}

impl Class {
    fn inner(&self) -> &'static ClassInner {
        // SAFETY: `inner` points into the metadata arena, which is never freed.
        unsafe { &*self.inner.as_ptr() }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner().name
    }

    /// Returns the superclass, or `None` for the root class.
    #[must_use]
    pub fn super_class(&self) -> Option<Class> {
        self.inner().super_class
    }

    /// Returns this class's own method table, in registration order.
    ///
    /// Inherited methods are not included.
    #[must_use]
    pub fn methods(&self) -> &'static [Method] {
        self.inner().methods
    }

    /// Returns the payload size of an instance in bytes, excluding the header.
    #[must_use]
    pub fn instance_size(&self) -> usize {
        self.inner().instance_layout.size()
    }

    /// Returns the payload alignment of an instance.
    #[must_use]
    pub fn instance_align(&self) -> usize {
        self.inner().instance_layout.align()
    }

    /// Returns the payload layout of an instance.
    #[must_use]
    pub fn instance_layout(&self) -> Layout {
        self.inner().instance_layout
    }

    pub(crate) fn alloc_layout(&self) -> Layout {
        self.inner().alloc_layout
    }

    pub(crate) fn payload_offset(&self) -> usize {
        self.inner().payload_offset
    }

    pub(crate) fn drop_payload(&self) -> Option<unsafe fn(*mut u8)> {
        self.inner().drop_payload
    }

    /// Returns `true` if instances can be duplicated by copying their bytes.
    ///
    /// This holds when neither this layout nor any ancestor's owns resources.
    #[must_use]
    pub fn is_bitwise_copyable(&self) -> bool {
        self.inner().bitwise_copy
    }

    /// Length of the longest payload prefix that can be duplicated bytewise.
    ///
    /// This is the payload size of the nearest bitwise-copyable class on the
    /// chain starting at `self`.
    pub(crate) fn bitwise_prefix(&self) -> usize {
        self.ancestors()
            .find(Class::is_bitwise_copyable)
            .map_or(0, |class| class.instance_size())
    }

    /// Iterates from this class up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Class> + use<> {
        std::iter::successors(Some(*self), Class::super_class)
    }

    /// Returns the inheritance chain, starting with this class and ending at
    /// the root.
    #[must_use]
    pub fn hierarchy(&self) -> Vec<Class> {
        self.ancestors().collect()
    }

    /// Resolves `selector` for instances of this class.
    ///
    /// Scans this class's own table in order, then each superclass in turn.
    /// Returns the class whose table supplied the method along with the
    /// method itself, or `None` if nothing on the chain defines it.
    ///
    /// The provider is the static class a super call from inside the
    /// implementation must start above.
    #[must_use]
    pub fn resolve(&self, selector: &str) -> Option<(Class, &'static Method)> {
        self.ancestors().find_map(|class| {
            class
                .methods()
                .iter()
                .find(|method| method.name == selector)
                .map(|method| (class, method))
        })
    }

    /// Resolves `selector` to its implementation.
    #[must_use]
    pub fn lookup_imp(&self, selector: &str) -> Option<Imp> {
        self.resolve(selector).map(|(_, method)| method.imp)
    }

    /// Returns `true` if this class or an ancestor implements `selector`.
    #[must_use]
    pub fn has_method(&self, selector: &str) -> bool {
        self.resolve(selector).is_some()
    }

    /// Returns the class whose table supplies `selector` for this class.
    #[must_use]
    pub fn method_provider(&self, selector: &str) -> Option<Class> {
        self.resolve(selector).map(|(class, _)| class)
    }

    /// Checks if this class is `class` or inherits from it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cobbler::foundation::{Number, Value};
    /// use cobbler::runtime::{Primitive, Shape};
    ///
    /// assert!(Number::class().is_subclass_of(&Value::class()));
    /// assert!(Number::class().is_subclass_of(&Primitive::class()));
    /// assert!(!Value::class().is_subclass_of(&Number::class()));
    /// ```
    #[must_use]
    pub fn is_subclass_of(&self, class: &Class) -> bool {
        self.ancestors().any(|ancestor| ancestor == *class)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner.as_ptr(), other.inner.as_ptr())
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("super_class", &self.super_class().map(|c| c.name()))
            .field("instance_size", &self.instance_size())
            .field("methods", &self.methods().len())
            .finish()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Registry
// ============================================================================

enum Entry {
    /// Named by `declare_type` but not yet defined.
    Declared,
    Defined(Class),
}

struct ClassRegistry {
    classes: RwLock<FxHashMap<&'static str, Entry>>,
}

static REGISTRY: OnceLock<ClassRegistry> = OnceLock::new();

fn registry() -> &'static ClassRegistry {
    REGISTRY.get_or_init(|| ClassRegistry {
        classes: RwLock::new(FxHashMap::default()),
    })
}

/// Registers the crate's built-in classes on first use of a name lookup.
///
/// Must not be reached from `ClassBuilder::register`, which runs inside it.
fn ensure_builtin_classes() {
    static BUILTINS: Once = Once::new();
    BUILTINS.call_once(|| {
        for class in crate::BUILTIN_CLASSES {
            class();
        }
    });
}

/// Looks up a defined class by name.
///
/// Forward-declared names that were never defined return `None`.
#[must_use]
pub fn class_named(name: &str) -> Option<Class> {
    ensure_builtin_classes();
    let classes = registry()
        .classes
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    match classes.get(name) {
        Some(Entry::Defined(class)) => Some(*class),
        _ => None,
    }
}

/// Returns `true` if `name` was declared or defined.
#[must_use]
pub fn is_declared(name: &str) -> bool {
    ensure_builtin_classes();
    registry()
        .classes
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .contains_key(name)
}

/// Returns every defined class, sorted by name.
#[must_use]
pub fn all_classes() -> Vec<Class> {
    ensure_builtin_classes();
    let mut classes: Vec<Class> = registry()
        .classes
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .filter_map(|entry| match entry {
            Entry::Defined(class) => Some(*class),
            Entry::Declared => None,
        })
        .collect();
    classes.sort_by_key(Class::name);
    classes
}

/// Makes `name` known to the registry before its definition.
///
/// Declaring lets other code refer to a type by name (for example in
/// [`is_declared`]) before the definition is available. Declaring a name that
/// is already declared or defined does nothing.
///
/// # Errors
///
/// This currently never fails; the `Result` leaves room for name validation.
pub fn declare_type(name: &str) -> Result<()> {
    ensure_builtin_classes();
    let mut classes = registry()
        .classes
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if !classes.contains_key(name) {
        let interned = metadata_arena().alloc_str(name);
        classes.insert(interned, Entry::Declared);
        debug!("declared class {name}");
    }
    Ok(())
}

/// Defines a class by name with a raw instance layout.
///
/// This is the name-based counterpart of [`ClassBuilder::with_layout`]: the
/// superclass is found by name and `layout` describes the whole payload,
/// inherited prefix included.
///
/// # Errors
///
/// - [`Error::ClassNotDefined`] if `parent` is unknown or only declared
/// - [`Error::ClassAlreadyExists`] if `name` is already defined
/// - [`Error::LayoutTooSmall`] if `layout` cannot embed the parent layout
/// - [`Error::LayoutOverflow`] if `layout` is too large for an instance
/// - [`Error::EmptyMethodName`] if a method name is empty
///
/// # Example
///
/// ```rust
/// use cobbler::runtime::{Arg, Message, define_type};
/// use std::alloc::Layout;
///
/// fn ping(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
///     Ok(Arg::from("pong"))
/// }
///
/// let class = define_type(
///     "DocPinger",
///     "Primitive",
///     Layout::new::<[u64; 2]>(),
///     &[("ping", ping)],
/// )
/// .unwrap();
/// assert_eq!(class.instance_size(), 16);
/// assert_eq!(class.super_class().unwrap().name(), "Primitive");
/// ```
pub fn define_type(
    name: &str,
    parent: &str,
    layout: Layout,
    methods: &[(&str, Imp)],
) -> Result<Class> {
    let super_class = class_named(parent).ok_or_else(|| Error::ClassNotDefined {
        name: parent.to_string(),
    })?;
    methods
        .iter()
        .fold(
            ClassBuilder::with_layout(name, super_class, layout),
            |builder, &(selector, imp)| builder.method(selector, imp),
        )
        .register()
}

// ============================================================================
// ClassBuilder
// ============================================================================

/// Builder for class registrations.
///
/// Typed classes are usually declared with the [`primitive!`](crate::primitive)
/// macro, which drives this builder from the struct's definition site.
///
/// # Example
///
/// ```rust
/// use cobbler::runtime::{Arg, ClassBuilder, Message, Primitive, Shape};
/// use std::alloc::Layout;
///
/// fn answer(_msg: &Message<'_>, _args: &[Arg]) -> cobbler::Result<Arg> {
///     Ok(Arg::Int(42))
/// }
///
/// let class = ClassBuilder::with_layout("DocOracle", Primitive::class(), Layout::new::<u32>())
///     .method("answer", answer)
///     .register()
///     .unwrap();
/// assert_eq!(class.lookup_imp("answer").map(|imp| imp as usize), Some(answer as usize));
/// ```
pub struct ClassBuilder {
    name: String,
    super_class: Option<Class>,
    layout: Layout,
    bitwise_copy: bool,
    drop_payload: Option<unsafe fn(*mut u8)>,
    methods: Vec<(String, Imp)>,
}

impl ClassBuilder {
    /// Starts a class whose instances are laid out as the Rust type `T`.
    ///
    /// The superclass is `T::Base`, registered first if necessary.
    ///
    /// # Panics
    ///
    /// Panics if `T` is its own base but is not [`Primitive`]: the runtime
    /// has a single root.
    #[must_use]
    pub fn for_shape<T: Shape>(name: &str) -> Self {
        let super_class = if TypeId::of::<T::Base>() == TypeId::of::<T>() {
            assert!(
                TypeId::of::<T>() == TypeId::of::<Primitive>(),
                "class {name} names itself as its base; only Primitive is a root"
            );
            None
        } else {
            Some(<T::Base as Shape>::class())
        };
        let owns_resources = std::mem::needs_drop::<T>();
        ClassBuilder {
            name: name.to_string(),
            super_class,
            layout: Layout::new::<T>(),
            bitwise_copy: !owns_resources,
            drop_payload: owns_resources.then_some(drop_payload::<T> as unsafe fn(*mut u8)),
            methods: Vec::new(),
        }
    }

    /// Starts a class whose payload is `layout` bytes with no Rust type.
    ///
    /// The payload is zero-filled at allocation and is bitwise-copyable unless
    /// the superclass owns resources, in which case the superclass's teardown
    /// is inherited.
    #[must_use]
    pub fn with_layout(name: &str, super_class: Class, layout: Layout) -> Self {
        ClassBuilder {
            name: name.to_string(),
            super_class: Some(super_class),
            layout,
            bitwise_copy: true,
            drop_payload: super_class.drop_payload(),
            methods: Vec::new(),
        }
    }

    /// Appends a method to the class's own table.
    ///
    /// Entries keep their order; if two share a name, the first wins.
    #[must_use]
    pub fn method(mut self, name: &str, imp: Imp) -> Self {
        self.methods.push((name.to_string(), imp));
        self
    }

    /// Validates and registers the class.
    ///
    /// If the name was forward-declared, the declaration is completed.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyMethodName`] if a method name is empty
    /// - [`Error::LayoutTooSmall`] if the layout is smaller or less aligned
    ///   than the superclass's
    /// - [`Error::LayoutOverflow`] if header and payload exceed one allocation
    /// - [`Error::ClassAlreadyExists`] if the name is already defined
    pub fn register(self) -> Result<Class> {
        if self.methods.iter().any(|(name, _)| name.is_empty()) {
            return Err(Error::EmptyMethodName { class: self.name });
        }
        if let Some(parent) = self.super_class {
            if self.layout.size() < parent.instance_size()
                || self.layout.align() < parent.instance_align()
            {
                return Err(Error::LayoutTooSmall {
                    class: self.name,
                    size: self.layout.size(),
                    parent_size: parent.instance_size(),
                });
            }
        }
        let Some((alloc_layout, payload_offset)) = allocation_layout(self.layout) else {
            return Err(Error::LayoutOverflow {
                class: self.name,
                size: self.layout.size(),
            });
        };
        for (i, (name, _)) in self.methods.iter().enumerate() {
            if self.methods[..i].iter().any(|(earlier, _)| earlier == name) {
                warn!("class {} lists method {name} twice; the first entry wins", self.name);
            }
        }

        let mut classes = registry()
            .classes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(Entry::Defined(_)) = classes.get(self.name.as_str()) {
            return Err(Error::ClassAlreadyExists { name: self.name });
        }

        let arena = metadata_arena();
        let methods: Vec<Method> = self
            .methods
            .iter()
            .map(|(name, imp)| Method {
                name: arena.alloc_str(name),
                imp: *imp,
            })
            .collect();
        let inner = arena.alloc(ClassInner {
            name: arena.alloc_str(&self.name),
            super_class: self.super_class,
            methods: arena.alloc_slice(&methods),
            instance_layout: self.layout,
            alloc_layout,
            payload_offset,
            bitwise_copy: self.bitwise_copy
                && self.super_class.is_none_or(|parent| parent.is_bitwise_copyable()),
            drop_payload: self.drop_payload,
        });
        let class = Class {
            inner: NonNull::from(inner),
        };
        classes.insert(class.name(), Entry::Defined(class));
        drop(classes);

        debug!(
            "defined class {} ({} bytes, {} methods) : {}",
            class.name(),
            class.instance_size(),
            class.methods().len(),
            class.super_class().map_or("<root>", |parent| parent.name())
        );
        Ok(class)
    }

    /// Registers the class, panicking on failure.
    ///
    /// Used from `Shape::class` definition sites, where a failure means two
    /// types claimed the same class name.
    ///
    /// # Panics
    ///
    /// Panics with the registration error.
    #[must_use]
    pub fn install(self) -> Class {
        let name = self.name.clone();
        match self.register() {
            Ok(class) => class,
            Err(err) => panic!("cannot install class {name}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Object;

    fn reply_one(_msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
        Ok(Arg::Int(1))
    }

    fn reply_two(_msg: &Message<'_>, _args: &[Arg]) -> Result<Arg> {
        Ok(Arg::Int(2))
    }

    fn layout_class(name: &str, parent: Class, size: usize) -> Class {
        ClassBuilder::with_layout(name, parent, Layout::from_size_align(size, 8).unwrap())
            .register()
            .unwrap()
    }

    #[test]
    fn test_root_class() {
        let root = Primitive::class();
        assert_eq!(root.name(), "Primitive");
        assert_eq!(root.instance_size(), 0);
        assert!(root.super_class().is_none());
        assert_eq!(class_named("Primitive"), Some(root));
        assert!(root.is_bitwise_copyable());
    }

    #[test]
    fn test_shape_class_is_idempotent() {
        assert_eq!(Primitive::class(), Primitive::class());
    }

    #[test]
    fn test_duplicate_class_name_error() {
        layout_class("ClassTestDuplicate", Primitive::class(), 8);
        let result = ClassBuilder::with_layout("ClassTestDuplicate", Primitive::class(), Layout::new::<u64>())
            .register();
        assert_eq!(
            result.unwrap_err(),
            Error::ClassAlreadyExists {
                name: "ClassTestDuplicate".into()
            }
        );
    }

    #[test]
    fn test_empty_method_name_rejected() {
        let result = ClassBuilder::with_layout("ClassTestEmptyName", Primitive::class(), Layout::new::<u8>())
            .method("", reply_one)
            .register();
        assert!(matches!(result, Err(Error::EmptyMethodName { .. })));
        assert!(class_named("ClassTestEmptyName").is_none());
    }

    #[test]
    fn test_layout_must_embed_parent() {
        let parent = layout_class("ClassTestWideParent", Primitive::class(), 32);
        let result = ClassBuilder::with_layout("ClassTestNarrowChild", parent, Layout::new::<u64>()).register();
        assert_eq!(
            result.unwrap_err(),
            Error::LayoutTooSmall {
                class: "ClassTestNarrowChild".into(),
                size: 8,
                parent_size: 32
            }
        );
    }

    #[test]
    fn test_oversized_layout_rejected() {
        let huge = Layout::from_size_align(isize::MAX as usize - 7, 8).unwrap();
        let result = ClassBuilder::with_layout("ClassTestHuge", Primitive::class(), huge).register();
        assert_eq!(
            result.unwrap_err(),
            Error::LayoutOverflow {
                class: "ClassTestHuge".into(),
                size: huge.size()
            }
        );
        assert!(class_named("ClassTestHuge").is_none());
    }

    #[test]
    fn test_declare_then_define() {
        declare_type("ClassTestForward").unwrap();
        assert!(is_declared("ClassTestForward"));
        assert!(class_named("ClassTestForward").is_none());

        // Declared-only names cannot be used as a parent yet.
        let early = define_type("ClassTestForwardChild", "ClassTestForward", Layout::new::<u8>(), &[]);
        assert_eq!(
            early.unwrap_err(),
            Error::ClassNotDefined {
                name: "ClassTestForward".into()
            }
        );

        let class = define_type("ClassTestForward", "Primitive", Layout::new::<u8>(), &[]).unwrap();
        assert_eq!(class_named("ClassTestForward"), Some(class));
        declare_type("ClassTestForward").unwrap();
        assert_eq!(class_named("ClassTestForward"), Some(class));
    }

    #[test]
    fn test_resolution_order() {
        let base = ClassBuilder::with_layout("ClassTestOrderBase", Primitive::class(), Layout::new::<u64>())
            .method("value", reply_one)
            .method("other", reply_one)
            .register()
            .unwrap();
        let derived = ClassBuilder::with_layout("ClassTestOrderDerived", base, Layout::new::<u64>())
            .method("value", reply_two)
            .method("value", reply_one)
            .register()
            .unwrap();

        let (provider, method) = derived.resolve("value").unwrap();
        assert_eq!(provider, derived);
        assert_eq!(method.imp as usize, reply_two as usize);
        assert_eq!(derived.method_provider("other"), Some(base));
        assert_eq!(derived.method_provider("create"), Some(Primitive::class()));
        assert!(derived.resolve("missing").is_none());
        assert!(!derived.has_method("missing"));
    }

    #[test]
    fn test_hierarchy_and_subclass() {
        let a = layout_class("ClassTestChainA", Primitive::class(), 8);
        let b = layout_class("ClassTestChainB", a, 16);
        let c = layout_class("ClassTestChainC", b, 24);

        let names: Vec<_> = c.hierarchy().iter().map(Class::name).collect();
        assert_eq!(names, ["ClassTestChainC", "ClassTestChainB", "ClassTestChainA", "Primitive"]);
        assert!(c.is_subclass_of(&a));
        assert!(c.is_subclass_of(&c));
        assert!(!a.is_subclass_of(&c));
    }

    #[test]
    fn test_all_classes_sorted() {
        layout_class("ClassTestListed", Primitive::class(), 8);
        let names: Vec<_> = all_classes().iter().map(Class::name).collect();
        assert!(names.contains(&"ClassTestListed"));
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_layout_class_inherits_teardown() {
        let list = crate::foundation::List::class();
        let derived = ClassBuilder::with_layout("ClassTestListLike", list, list.instance_layout())
            .register()
            .unwrap();
        assert!(!derived.is_bitwise_copyable());
        assert!(derived.drop_payload().is_some());
        assert_eq!(derived.bitwise_prefix(), 0);

        let object = Object::create(derived, &[]).unwrap().unwrap();
        assert!(object.is_instance_of(&list));
    }

    #[test]
    fn test_class_debug_and_display() {
        let class = layout_class("ClassTestDebug", Primitive::class(), 8);
        assert_eq!(class.to_string(), "ClassTestDebug");
        let debug = format!("{class:?}");
        assert!(debug.contains("ClassTestDebug"));
        assert!(debug.contains("Primitive"));
    }
}
