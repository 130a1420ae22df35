//! # Pool Allocator
//!
//! A fixed-footprint, segregated-fit block allocator. A single contiguous
//! byte region of compile-time size is split at initialization into up to
//! [`MAX_POOLS`] pools, each serving requests up to one configured block
//! size. After initialization the allocator never grows, never shrinks, and
//! never calls into a platform allocator.
//!
//! ## How It Works
//!
//! The backing region is divided into equal partitions, one per configured
//! block size, in the order the sizes were supplied:
//!
//! ```text
//!                    BACKING REGION (HEAP_SIZE bytes)
//!
//!   ┌────────────────┬────────────────┬────────────────┬────────────────┐
//!   │  Partition 0   │  Partition 1   │  Partition 2   │     (tail)     │
//!   │  32-B blocks   │  64-B blocks   │  256-B blocks  │     wasted     │
//!   │ ┌──┬──┬──┬───┐ │ ┌────┬────┬──┐ │ ┌────────┬───┐ │                │
//!   │ │  │  │  │...│ │ │    │    │..│ │ │        │...│ │                │
//!   │ └──┴──┴──┴───┘ │ └────┴────┴──┘ │ └────────┴───┘ │                │
//!   └────────────────┴────────────────┴────────────────┴────────────────┘
//!   ▲                ▲                ▲
//!   │                │                │
//!   start of pool 0  start of pool 1  start of pool 2
//!
//!   partition = HEAP_SIZE / count
//!   pool i occupies [i * partition, i * partition + max_i * block_size_i)
//!   where max_i = partition / block_size_i
//! ```
//!
//! Each pool hands out blocks in two phases. Blocks below the high-water
//! mark (`allocated`) have been handed out at least once; blocks above it
//! are untouched. Released blocks are threaded into an intrusive free list
//! inside the region itself:
//!
//! ```text
//!   ONE POOL (block_size = 64, allocated = 5)
//!
//!         block 0   block 1   block 2   block 3   block 4   block 5 ...
//!       ┌─────────┬─────────┬─────────┬─────────┬─────────┬─────────┐
//!       │  live   │  FREE   │  live   │  FREE   │  live   │ unborn  │
//!       └─────────┴────┬────┴─────────┴────┬────┴─────────┴─────────┘
//!                      │    ▲              │                 ▲
//!   free_head ─────────┘    └──────────────┘                 │
//!                                                      high-water mark
//!
//!   A FREE block's first machine word stores the offset of the next free
//!   block (or a sentinel). A live block's bytes belong to the caller.
//!   An unborn block has never been handed out.
//! ```
//!
//! ## Allocation Process (Step by Step)
//!
//! ```text
//!   STEP 1: Select a pool (best fit with fallback)
//!   ┌─────────────────────────────────────────────────────────────┐
//!   │  Scan all pools. A pool is a candidate iff                  │
//!   │    block_size >= n  AND  (allocated < max OR free list      │
//!   │    non-empty).                                              │
//!   │  Pick the candidate with the smallest block_size; ties go   │
//!   │  to the lowest descriptor index.                            │
//!   └─────────────────────────────────────────────────────────────┘
//!
//!   STEP 2: Dispatch within the chosen pool
//!   ┌─────────────────────────────────────────────────────────────┐
//!   │  if free list non-empty:  pop its head (LIFO reuse)         │
//!   │  else:                    hand out block `allocated`, then  │
//!   │                           allocated += 1                    │
//!   └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A full pool is simply not a candidate, so the fallback to a larger pool
//! is implicit in the selection rather than a retry: a 100-byte request
//! against pools {32, 256} is served from 256; once 256 is exhausted it is
//! served from the next larger pool with capacity.
//!
//! ## Release Process
//!
//! ```text
//!   release(p):
//!     1. Scan pools for the owner: start <= p < end, (p - start) is a
//!        multiple of block_size, and p is below the high-water mark.
//!     2. No owner -> silent no-op (foreign or interior pointer).
//!     3. Owner found -> write the current free_head into p's first word,
//!        then free_head = p.  The list is LIFO.
//! ```
//!
//! ## Trade-offs
//!
//! ### Advantages
//! - **Constant-time dispatch**: after the O(MAX_POOLS) selection, both
//!   allocation and release touch a single block.
//! - **Fixed footprint**: the region and the descriptor table are the whole
//!   allocator; there is no hidden bookkeeping heap.
//! - **No fragmentation inside a pool**: every block has the same size.
//!
//! ### Disadvantages
//! - **Internal waste**: a request smaller than its block rounds up to the
//!   full block; partition remainders are unusable.
//! - **No oversized requests**: nothing larger than the largest configured
//!   block size can ever be served; pools are never split or combined.
//! - **No double-free detection** in release builds: releasing a block twice
//!   puts a cycle in the free list. Debug builds assert against it.
//!
//! ## Safety
//!
//! This allocator deals in raw pointers into its own region. Callers must
//! ensure:
//! - Pointers returned by `allocate` are not used after `release`.
//! - The same pointer is not released twice.
//! - The allocator value is not moved while handed-out pointers are live.

use std::cell::UnsafeCell;
use std::fmt;
use std::ptr;

use thiserror::Error;

use crate::link::{self, LINK_WIDTH, NO_LINK};
use crate::{blocks_in_partition, partition_size};

/// Total size in bytes of the default backing region.
pub const HEAP_SIZE: usize = 65536;

/// Hard upper bound on the number of pools. Sized so the linear scans in
/// allocation and release stay trivial.
pub const MAX_POOLS: usize = 5;

/// Rejected configurations reported by [`PoolAllocator::init`].
///
/// Every variant is a programmer error, not a runtime condition: the caller
/// either re-calls `init` with valid parameters or refrains from using the
/// allocator. A failed `init` leaves the allocator with zero pools, so
/// subsequent allocations fail and releases are no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InitError {
  /// The number of block sizes is outside `1..=MAX_POOLS`.
  #[error("invalid pool count {count} (accepted range: 1..={})", MAX_POOLS)]
  InvalidCount { count: usize },

  /// A block size of zero can never serve a request.
  #[error("invalid block size {size} (must be nonzero)")]
  InvalidBlockSize { size: usize },

  /// A block must be able to hold one free-list link once released.
  #[error("block size {size} is below the link width {min}")]
  BlockTooSmall { size: usize, min: usize },

  /// A block must fit inside its pool's partition.
  #[error("block size {size} exceeds the partition size {partition}")]
  BlockTooLarge { size: usize, partition: usize },
}

/// Descriptor for one pool: the blocks of a single configured size.
///
/// `start`, `end`, and `free_head` are byte offsets into the backing region
/// rather than raw addresses, so the descriptor table stays valid if the
/// allocator value is moved between configuration and use.
#[derive(Clone, Copy)]
struct Pool {
  /// Size in bytes of each block this pool serves.
  block_size: usize,

  /// Inclusive lower bound of the pool's sub-range.
  start: usize,

  /// Exclusive upper bound: `start + max * block_size`.
  end: usize,

  /// Maximum number of blocks the partition can hold.
  max: usize,

  /// Count of blocks below the high-water mark that have ever been handed
  /// out. Never exceeds `max`.
  allocated: usize,

  /// Offset of the most recently released block, or [`NO_LINK`].
  free_head: usize,
}

impl Pool {
  const fn unconfigured() -> Self {
    Self {
      block_size: 0,
      start: 0,
      end: 0,
      max: 0,
      allocated: 0,
      free_head: NO_LINK,
    }
  }

  /// A pool can serve a request while it has unborn blocks or a non-empty
  /// free list.
  fn has_capacity(&self) -> bool {
    self.allocated < self.max || self.free_head != NO_LINK
  }
}

/// A segregated-fit block allocator over a fixed `N`-byte region.
///
/// # Memory Management Strategy
///
/// The allocator owns its backing region and a fixed-capacity table of pool
/// descriptors. `init` partitions the region; `allocate` picks the best-fit
/// pool and either bumps that pool's high-water mark or pops its free list;
/// `release` locates the owning pool by pointer range and pushes the block
/// onto that pool's free list.
///
/// ```text
///   ┌──────────────────────────────────────────────────────────┐
///   │                    PoolAllocator<N>                      │
///   │                                                          │
///   │   heap: [u8; N] ───► the backing region                  │
///   │                                                          │
///   │   pools[0] ───► { block_size, start, end, max,           │
///   │   pools[1]        allocated, free_head }                 │
///   │   ...                                                    │
///   │   pool_count: how many descriptors are valid             │
///   └──────────────────────────────────────────────────────────┘
/// ```
///
/// # Two Forms
///
/// Tests and embedded hosts use this value type directly for isolation. For
/// drop-in use there is a process-wide singleton in [`crate::global`].
///
/// # Thread Safety
///
/// This allocator is **NOT** thread-safe. No operation suspends or yields;
/// concurrent entry from two threads is a data race. External
/// synchronization (such as the mutex in [`crate::global`]) is required for
/// shared use.
pub struct PoolAllocator<const N: usize = HEAP_SIZE> {
  /// The backing region. Freed blocks alias their bytes as free-list links,
  /// so the region lives behind an `UnsafeCell`.
  heap: UnsafeCell<[u8; N]>,

  /// Fixed-capacity descriptor table, ordered as the user supplied the
  /// block sizes. Pools are NOT sorted by block size.
  pools: [Pool; MAX_POOLS],

  /// Number of valid descriptors. Zero until the first successful `init`.
  pool_count: usize,
}

impl<const N: usize> PoolAllocator<N> {
  /// Creates an unconfigured allocator.
  ///
  /// No operation can succeed until [`init`](Self::init) has configured the
  /// pools: `allocate` returns null and `release` is a no-op.
  ///
  /// This is a `const fn` so the allocator can live in a `static`.
  pub const fn new() -> Self {
    Self {
      heap: UnsafeCell::new([0; N]),
      pools: [Pool::unconfigured(); MAX_POOLS],
      pool_count: 0,
    }
  }

  /// Configures the pools from an ordered list of block sizes.
  ///
  /// The backing region is split into `block_sizes.len()` equal partitions
  /// of `N / block_sizes.len()` bytes. Pool `i` serves blocks of
  /// `block_sizes[i]` bytes out of partition `i`; the partition remainder
  /// that does not divide evenly into blocks is wasted by design, keeping
  /// the pointer-to-pool lookup in [`release`](Self::release) free of
  /// arithmetic surprises.
  ///
  /// Calling `init` again reconfigures the allocator and discards all prior
  /// state, including any live blocks.
  ///
  /// # Arguments
  ///
  /// * `block_sizes` - one entry per pool, in pool order. Accepted ranges:
  ///   `1..=MAX_POOLS` sizes, each size in `LINK_WIDTH..=N / count`.
  ///
  /// # Errors
  ///
  /// Validation happens in order:
  /// 1. [`InitError::InvalidCount`] - zero sizes, or more than [`MAX_POOLS`].
  /// 2. [`InitError::InvalidBlockSize`] / [`InitError::BlockTooSmall`] - a
  ///    size of zero, or one too small to hold a free-list link.
  /// 3. [`InitError::BlockTooLarge`] - a size exceeding its partition.
  ///
  /// On failure the allocator keeps zero pools; a subsequent `allocate`
  /// returns null and `release` is a no-op.
  ///
  /// # Example
  ///
  /// ```rust
  /// use rpool::PoolAllocator;
  ///
  /// let mut allocator: PoolAllocator = PoolAllocator::new();
  /// assert!(allocator.init(&[32, 64, 256, 1024]).is_ok());
  /// assert!(allocator.init(&[32, 64, 256, 1024, 14000]).is_err());
  /// ```
  pub fn init(
    &mut self,
    block_sizes: &[usize],
  ) -> Result<(), InitError> {
    // Clear first: a failed call must not leave stale descriptors behind,
    // and an unconfigured table is the safe state.
    self.pool_count = 0;

    let count = block_sizes.len();
    if count == 0 || count > MAX_POOLS {
      return Err(InitError::InvalidCount { count });
    }

    let partition = partition_size!(N, count);
    for &size in block_sizes {
      if size == 0 {
        return Err(InitError::InvalidBlockSize { size });
      }
      if size < LINK_WIDTH {
        return Err(InitError::BlockTooSmall { size, min: LINK_WIDTH });
      }
      if size > partition {
        return Err(InitError::BlockTooLarge { size, partition });
      }
    }

    for (i, &size) in block_sizes.iter().enumerate() {
      let max = blocks_in_partition!(partition, size);
      let start = i * partition;

      self.pools[i] = Pool {
        block_size: size,
        start,
        end: start + max * size,
        max,
        allocated: 0,
        free_head: NO_LINK,
      };
    }
    self.pool_count = count;

    Ok(())
  }

  /// Allocates at least `n` contiguous bytes from exactly one pool.
  ///
  /// Selection is best fit with fallback: among the pools whose block size
  /// can hold `n` and which still have capacity (an unborn block or a
  /// non-empty free list), the one with the smallest block size wins; ties
  /// resolve to the lowest descriptor index. A full pool is simply not a
  /// candidate, so requests spill into the next larger pool without a
  /// retry.
  ///
  /// Within the chosen pool the most recently released block is reused
  /// first (LIFO); only when the free list is empty is a fresh block handed
  /// out from below the high-water mark.
  ///
  /// # Arguments
  ///
  /// * `n` - requested size in bytes. Zero fails. Values larger than the
  ///   largest configured block size fail regardless of state, which also
  ///   covers "negative" sizes that wrapped into huge values.
  ///
  /// # Returns
  ///
  /// A pointer to `block_size >= n` bytes inside the chosen pool, or null
  /// if no pool qualifies. The bytes hold prior contents; nothing is
  /// zeroed.
  ///
  /// # Complexity
  ///
  /// O([`MAX_POOLS`]) for selection, O(1) for dispatch.
  ///
  /// # Safety
  ///
  /// The returned block is only valid while the allocator is neither moved
  /// nor reconfigured, and until it is passed to [`release`](Self::release).
  pub unsafe fn allocate(
    &mut self,
    n: usize,
  ) -> *mut u8 {
    if n == 0 {
      return ptr::null_mut();
    }

    let Some(index) = self.best_fit(n) else {
      return ptr::null_mut();
    };

    let head = self.pools[index].free_head;
    let offset = if head != NO_LINK {
      // Unlink the head; the most recently released block is reused first.
      let next = unsafe { link::read_link(self.block_at(head)) };
      self.pools[index].free_head = next;
      head
    } else {
      let pool = &mut self.pools[index];
      let offset = pool.start + pool.allocated * pool.block_size;
      pool.allocated += 1;
      offset
    };

    self.block_at(offset)
  }

  /// Returns the block at `p` to its owning pool's free list.
  ///
  /// The owning pool is found by a linear scan in descriptor order: a pool
  /// owns `p` iff `p` lies in `[start, end)`, `(p - start)` is a multiple
  /// of the pool's block size, and the block lies below the high-water mark
  /// (an address that was never handed out cannot be released). If no pool
  /// owns `p` - the pointer is null, foreign, or interior to a block - the
  /// call is a silent no-op and corrupts nothing, so `release` is safe to
  /// call from cleanup paths.
  ///
  /// # Complexity
  ///
  /// O([`MAX_POOLS`]) for the owner lookup, O(1) for the push.
  ///
  /// # Safety
  ///
  /// `p` must either not resolve to a live block, or resolve to a live
  /// block the caller no longer reads or writes. Releasing the same block
  /// twice is a caller bug: it puts a cycle in the free list. Debug builds
  /// assert against double release; release builds do not pay for the
  /// check.
  pub unsafe fn release(
    &mut self,
    p: *mut u8,
  ) {
    if p.is_null() {
      return;
    }

    let Some((index, offset)) = self.owner_of(p) else {
      return;
    };

    debug_assert!(
      !self.free_list_contains(index, offset),
      "block at offset {offset} released twice",
    );

    let head = self.pools[index].free_head;
    unsafe { link::write_link(self.block_at(offset), head) };
    self.pools[index].free_head = offset;
  }

  /// Number of configured pools. Zero until a successful
  /// [`init`](Self::init).
  pub fn pool_count(&self) -> usize {
    self.pool_count
  }

  /// Scans the descriptor table for the best-fit pool for an `n`-byte
  /// request: smallest sufficient block size among pools with capacity,
  /// lowest index on ties. The strict `<` keeps the earliest pool when two
  /// pools share a block size.
  fn best_fit(
    &self,
    n: usize,
  ) -> Option<usize> {
    let mut best = None;
    let mut best_size = usize::MAX;

    for (i, pool) in self.pools[..self.pool_count].iter().enumerate() {
      if n <= pool.block_size && pool.block_size < best_size && pool.has_capacity() {
        best = Some(i);
        best_size = pool.block_size;
      }
    }

    best
  }

  /// Locates the pool owning `p` and `p`'s offset into the region.
  ///
  /// Pool sub-ranges are pairwise disjoint, so at most one pool can match
  /// the range check; a pointer inside a matching range that is misaligned
  /// within its block, or beyond the pool's high-water mark, belongs to no
  /// pool at all.
  fn owner_of(
    &self,
    p: *const u8,
  ) -> Option<(usize, usize)> {
    let base = self.heap.get() as usize;
    let offset = (p as usize).checked_sub(base)?;
    if offset >= N {
      return None;
    }

    for (i, pool) in self.pools[..self.pool_count].iter().enumerate() {
      if offset < pool.start || offset >= pool.end {
        continue;
      }
      if (offset - pool.start) % pool.block_size != 0 {
        return None;
      }
      if (offset - pool.start) / pool.block_size >= pool.allocated {
        return None;
      }
      return Some((i, offset));
    }

    None
  }

  /// Pointer to the block at `offset`.
  fn block_at(
    &self,
    offset: usize,
  ) -> *mut u8 {
    // Every offset handed to this function comes from a descriptor whose
    // range lies inside the region.
    unsafe { self.heap.get().cast::<u8>().add(offset) }
  }

  /// Walks pool `index`'s free list and returns its length.
  fn free_list_len(
    &self,
    index: usize,
  ) -> usize {
    let mut len = 0;
    let mut cursor = self.pools[index].free_head;

    while cursor != NO_LINK {
      len += 1;
      cursor = unsafe { link::read_link(self.block_at(cursor)) };
    }

    len
  }

  /// Whether `offset` is already on pool `index`'s free list. Used by the
  /// debug-mode double-release assertion.
  fn free_list_contains(
    &self,
    index: usize,
    offset: usize,
  ) -> bool {
    let mut cursor = self.pools[index].free_head;

    while cursor != NO_LINK {
      if cursor == offset {
        return true;
      }
      cursor = unsafe { link::read_link(self.block_at(cursor)) };
    }

    false
  }
}

impl<const N: usize> fmt::Debug for PoolAllocator<N> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    let mut out = f.debug_struct("PoolAllocator");
    out.field("heap_size", &N);
    out.field("pool_count", &self.pool_count);

    for (i, pool) in self.pools[..self.pool_count].iter().enumerate() {
      out.field(
        &format!("pool[{i}]"),
        &format_args!(
          "{} B x {} at {}..{}, allocated {}, free {}",
          pool.block_size,
          pool.max,
          pool.start,
          pool.end,
          pool.allocated,
          self.free_list_len(i),
        ),
      );
    }

    out.finish()
  }
}

/// Debug helper function that prints an allocation outcome.
///
/// # Example Output
///
/// ```text
/// Allocated 240 bytes, address = 0x5555557a1040
/// Allocation of 2048 bytes failed (no suitable pool)
/// ```
pub fn print_alloc(
  n: usize,
  addr: *mut u8,
) {
  if addr.is_null() {
    println!("Allocation of {n} bytes failed (no suitable pool)");
  } else {
    println!("Allocated {n} bytes, address = {addr:?}");
  }
}
