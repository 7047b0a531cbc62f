//! Memory infrastructure for the Cobbler runtime.
//!
//! Class descriptors, their names and their method tables live for the rest
//! of the process once registered. [`MetadataArena`] hands out that storage
//! from a few large chunks instead of one heap allocation per item.

pub mod arena;

pub use arena::{ArenaStats, MetadataArena};
