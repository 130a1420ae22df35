//! Process-wide singleton form of the allocator.
//!
//! The core [`PoolAllocator`] is a value type; tests and embedded hosts use
//! it directly for isolation. For drop-in use this module keeps a single
//! instance in a `static` behind a spin lock. The lock is purely an external
//! synchronization layer: the allocator itself remains single-threaded, and
//! each operation holds the lock only for its own O(pool count) duration.

use spin::Mutex;

use crate::pool::{InitError, PoolAllocator};

/// The process-wide allocator instance. Its backing region lives for the
/// lifetime of the process.
static POOL: Mutex<PoolAllocator> = Mutex::new(PoolAllocator::new());

/// Configures the process-wide allocator. See [`PoolAllocator::init`].
///
/// Reconfiguring discards all prior state, including blocks other callers
/// still hold.
pub fn init(block_sizes: &[usize]) -> Result<(), InitError> {
  POOL.lock().init(block_sizes)
}

/// Allocates `n` bytes from the process-wide allocator. See
/// [`PoolAllocator::allocate`].
///
/// # Safety
///
/// Same contract as [`PoolAllocator::allocate`], except the block stays
/// valid until released or until a reconfiguring [`init`]: the backing
/// region lives in a `static` and never moves.
pub unsafe fn allocate(n: usize) -> *mut u8 {
  unsafe { POOL.lock().allocate(n) }
}

/// Returns a block to the process-wide allocator. See
/// [`PoolAllocator::release`].
///
/// # Safety
///
/// Same contract as [`PoolAllocator::release`].
pub unsafe fn release(p: *mut u8) {
  unsafe { POOL.lock().release(p) }
}
