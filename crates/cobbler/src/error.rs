//! Error types for the Cobbler runtime.
//!
//! Recoverable failures (registration problems, failed dispatch, unexpected
//! replies) are reported through [`Error`]. A constructor that declines to
//! build an instance is not an error: `create` returns `Ok(None)`.
//! Misuse that would corrupt the object graph, such as exiting release pools
//! out of order or resurrecting an object from its destructor, panics instead.

use std::fmt;

/// Errors that can occur in the Cobbler runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A class with this name is already defined.
    ClassAlreadyExists {
        /// The rejected name.
        name: String,
    },

    /// No class with this name is defined (it may only be declared).
    ClassNotDefined {
        /// The name that was looked up.
        name: String,
    },

    /// A method table entry has an empty name.
    EmptyMethodName {
        /// The class being defined.
        class: String,
    },

    /// An instance layout cannot embed the superclass layout as its prefix.
    LayoutTooSmall {
        /// The class being defined.
        class: String,
        /// Requested payload size in bytes.
        size: usize,
        /// Payload size of the superclass in bytes.
        parent_size: usize,
    },

    /// Header plus payload do not fit in a single allocation.
    LayoutOverflow {
        /// The class being defined.
        class: String,
        /// Requested payload size in bytes.
        size: usize,
    },

    /// Neither the class nor any ancestor implements the method.
    MethodNotFound {
        /// The class where resolution started.
        class: String,
        /// The method name.
        method: String,
    },

    /// A static call named a class the receiver does not belong to.
    NotAnInstance {
        /// The receiver's class.
        class: String,
        /// The class the call was resolved from.
        expected: String,
    },

    /// A method received an argument of the wrong kind.
    ArgumentTypeMismatch {
        /// The method that rejected the argument.
        method: String,
        /// Argument index.
        index: usize,
        /// Kind the method expected.
        expected: &'static str,
        /// Kind it received.
        got: &'static str,
    },

    /// A method replied with something its caller cannot use.
    UnexpectedReply {
        /// The method that replied.
        method: String,
        /// Kind of the reply that was received.
        reply: &'static str,
    },

    /// `autorelease` was called with no release pool on this thread.
    NoActivePool,

    /// The runtime configuration was already fixed by an earlier call or by first use.
    AlreadyConfigured,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ClassAlreadyExists { name } => {
                write!(f, "Class '{name}' already exists in registry")
            }
            Error::ClassNotDefined { name } => {
                write!(f, "Class '{name}' is not defined")
            }
            Error::EmptyMethodName { class } => {
                write!(f, "Method table of class '{class}' contains an empty name")
            }
            Error::LayoutTooSmall {
                class,
                size,
                parent_size,
            } => write!(
                f,
                "Layout of class '{class}' ({size} bytes) cannot embed its superclass ({parent_size} bytes)"
            ),
            Error::LayoutOverflow { class, size } => write!(
                f,
                "Layout of class '{class}' ({size} bytes) is too large for an instance"
            ),
            Error::MethodNotFound { class, method } => {
                write!(
                    f,
                    "Method '{method}' not found in class '{class}' or its superclasses"
                )
            }
            Error::NotAnInstance { class, expected } => {
                write!(f, "Instance of '{class}' is not an instance of '{expected}'")
            }
            Error::ArgumentTypeMismatch {
                method,
                index,
                expected,
                got,
            } => write!(
                f,
                "Argument {index} of '{method}' must be {expected}, got {got}"
            ),
            Error::UnexpectedReply { method, reply } => {
                write!(f, "Method '{method}' replied with unexpected {reply}")
            }
            Error::NoActivePool => {
                write!(f, "No release pool is active on this thread")
            }
            Error::AlreadyConfigured => {
                write!(f, "Runtime configuration is already fixed")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for Cobbler runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
