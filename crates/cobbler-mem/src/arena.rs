//! Chunked bump allocator for immutable runtime metadata.
//!
//! # Design
//!
//! - One mutex guards the bump cursor; registration is rare, so contention
//!   is not a concern.
//! - Chunks are obtained from `std::alloc` and grow by doubling up to
//!   [`MAX_CHUNK_SIZE`]. A request larger than the next chunk size gets a
//!   chunk of its own.
//! - Values placed in the arena are never dropped. Only types without drop
//!   glue are accepted.
//! - All chunks are returned to the system allocator when the arena is
//!   dropped. The runtime's own arena lives in a `static` and is never dropped.
//!
//! # Example
//!
//! ```
//! use cobbler_mem::MetadataArena;
//!
//! let arena = MetadataArena::new(8192);
//! let name = arena.alloc_str("Custom");
//! let sizes = arena.alloc_slice(&[8usize, 16, 24]);
//! let pair = arena.alloc((name.len(), sizes.len()));
//!
//! assert_eq!(name, "Custom");
//! assert_eq!(*pair, (6, 3));
//! ```

use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Smallest chunk the arena will allocate.
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Largest chunk produced by doubling.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Allocation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
    /// Bytes handed out, excluding alignment padding.
    pub allocated: usize,
    /// Number of chunks obtained from the system allocator.
    pub chunk_count: usize,
    /// Total bytes across all chunks.
    pub capacity: usize,
}

struct Chunk {
    base: NonNull<u8>,
    layout: Layout,
}

struct ArenaState {
    chunks: Vec<Chunk>,
    /// Offset of the next free byte in the last chunk.
    cursor: usize,
    next_chunk_size: usize,
    allocated: usize,
}

/// Thread-safe arena whose allocations live as long as the arena.
pub struct MetadataArena {
    state: Mutex<ArenaState>,
}

// SAFETY: chunk pointers are only dereferenced while the mutex is held, and
// the memory they own is not tied to any thread.
unsafe impl Send for MetadataArena {}
// SAFETY: see above; handed-out references point at immutable data.
unsafe impl Sync for MetadataArena {}

impl MetadataArena {
    /// Creates an empty arena. The first chunk is allocated lazily.
    ///
    /// `chunk_size` is clamped to at least [`MIN_CHUNK_SIZE`] and rounded up
    /// to a power of two.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        let size = chunk_size
            .clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE)
            .next_power_of_two();
        MetadataArena {
            state: Mutex::new(ArenaState {
                chunks: Vec::new(),
                cursor: 0,
                next_chunk_size: size,
                allocated: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ArenaState> {
        // The state is consistent between statements, so a panic elsewhere
        // cannot leave it half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `value` into the arena.
    ///
    /// # Panics
    ///
    /// Panics if `T` has drop glue, since arena values are never dropped.
    pub fn alloc<T>(&self, value: T) -> &T {
        assert!(
            !std::mem::needs_drop::<T>(),
            "MetadataArena::alloc: values with drop glue would leak their resources"
        );
        let ptr = if std::mem::size_of::<T>() == 0 {
            NonNull::<T>::dangling()
        } else {
            self.alloc_raw(Layout::new::<T>()).cast::<T>()
        };
        // SAFETY: `ptr` is freshly reserved (or dangling for a zero-sized T),
        // properly aligned and large enough for T.
        unsafe {
            ptr.as_ptr().write(value);
            &*ptr.as_ptr()
        }
    }

    /// Copies `s` into the arena.
    pub fn alloc_str(&self, s: &str) -> &str {
        let bytes = self.alloc_slice(s.as_bytes());
        // SAFETY: `bytes` is a byte-for-byte copy of a valid `str`.
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// Copies `items` into the arena.
    pub fn alloc_slice<T: Copy>(&self, items: &[T]) -> &[T] {
        if items.is_empty() {
            return &[];
        }
        if std::mem::size_of::<T>() == 0 {
            // SAFETY: zero-sized values need no storage.
            return unsafe { std::slice::from_raw_parts(NonNull::dangling().as_ptr(), items.len()) };
        }
        let layout = Layout::array::<T>(items.len())
            .unwrap_or_else(|_| panic!("MetadataArena::alloc_slice: {} items overflow", items.len()));
        let ptr = self.alloc_raw(layout).cast::<T>();
        // SAFETY: `ptr` is freshly reserved for exactly `items.len()` values of T
        // and cannot overlap `items`.
        unsafe {
            std::ptr::copy_nonoverlapping(items.as_ptr(), ptr.as_ptr(), items.len());
            std::slice::from_raw_parts(ptr.as_ptr(), items.len())
        }
    }

    /// Returns allocation statistics.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        let state = self.lock();
        ArenaStats {
            allocated: state.allocated,
            chunk_count: state.chunks.len(),
            capacity: state.chunks.iter().map(|c| c.layout.size()).sum(),
        }
    }

    fn alloc_raw(&self, layout: Layout) -> NonNull<u8> {
        debug_assert!(layout.size() > 0);
        let mut state = self.lock();
        if let Some(ptr) = state.try_bump(layout) {
            return ptr;
        }
        state.grow(layout);
        match state.try_bump(layout) {
            Some(ptr) => ptr,
            None => unreachable!("fresh chunk is sized for the request"),
        }
    }
}

impl ArenaState {
    fn try_bump(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let chunk = self.chunks.last()?;
        let base = chunk.base.as_ptr() as usize;
        let start = (base + self.cursor).checked_next_multiple_of(layout.align())?;
        let end = start.checked_add(layout.size())?;
        if end > base + chunk.layout.size() {
            return None;
        }
        self.cursor = end - base;
        self.allocated += layout.size();
        // SAFETY: `start - base` is within the chunk, checked above.
        Some(unsafe { NonNull::new_unchecked(chunk.base.as_ptr().add(start - base)) })
    }

    #[cold]
    fn grow(&mut self, request: Layout) {
        let size = self
            .next_chunk_size
            .max((request.size() + request.align()).next_power_of_two());
        let layout = match Layout::from_size_align(size, request.align().max(16)) {
            Ok(layout) => layout,
            Err(_) => panic!("MetadataArena: chunk of {size} bytes is not allocatable"),
        };
        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let Some(base) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        self.chunks.push(Chunk { base, layout });
        self.cursor = 0;
        self.next_chunk_size = (self.next_chunk_size * 2).min(MAX_CHUNK_SIZE);
    }
}

impl Drop for MetadataArena {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        for chunk in state.chunks.drain(..) {
            // SAFETY: each chunk was allocated with exactly this layout.
            unsafe { alloc::dealloc(chunk.base.as_ptr(), chunk.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_values_and_alignment() {
        let arena = MetadataArena::new(0);
        let byte = arena.alloc(7u8);
        let wide = arena.alloc(0xdead_beef_u64);

        assert_eq!(*byte, 7);
        assert_eq!(*wide, 0xdead_beef);
        assert_eq!(wide as *const u64 as usize % std::mem::align_of::<u64>(), 0);
    }

    #[test]
    fn test_alloc_str_and_slice() {
        let arena = MetadataArena::new(4096);
        assert_eq!(arena.alloc_str("destroy"), "destroy");
        assert_eq!(arena.alloc_str(""), "");
        assert_eq!(arena.alloc_slice(&[1u16, 2, 3]), &[1, 2, 3]);
        assert!(arena.alloc_slice::<u32>(&[]).is_empty());
    }

    #[test]
    fn test_zero_sized_alloc_takes_no_space() {
        let arena = MetadataArena::new(4096);
        arena.alloc(());
        assert_eq!(arena.stats(), ArenaStats::default());
    }

    #[test]
    fn test_chunk_growth() {
        let arena = MetadataArena::new(MIN_CHUNK_SIZE);
        for i in 0..1000u64 {
            assert_eq!(*arena.alloc(i), i);
        }
        let stats = arena.stats();
        assert_eq!(stats.allocated, 8000);
        assert!(stats.chunk_count > 1);
        assert!(stats.capacity >= stats.allocated);
    }

    #[test]
    fn test_oversized_request_gets_own_chunk() {
        let arena = MetadataArena::new(MIN_CHUNK_SIZE);
        let big = vec![9u8; 10 * MIN_CHUNK_SIZE];
        let copy = arena.alloc_slice(&big);
        assert_eq!(copy.len(), big.len());
        assert!(copy.iter().all(|&b| b == 9));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let arena = Arc::new(MetadataArena::new(4096));
        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let arena = Arc::clone(&arena);
                thread::spawn(move || *arena.alloc(i))
            })
            .collect();

        let mut seen: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic(expected = "drop glue")]
    fn test_rejects_drop_types() {
        let arena = MetadataArena::new(4096);
        arena.alloc(String::from("leak"));
    }
}
