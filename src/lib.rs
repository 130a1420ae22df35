//! # rpool - A Segregated Pool Memory Allocator Library
//!
//! This crate provides a **fixed-footprint pool allocator**: a single
//! contiguous byte region of compile-time size, partitioned at
//! initialization into pools of equal-sized blocks.
//!
//! ## Overview
//!
//! A pool allocator trades flexibility for determinism: every request is
//! served from a pool of fixed-size blocks, so allocation and deallocation
//! are constant-time after a bounded pool scan, and the memory footprint
//! never changes.
//!
//! ```text
//!   Pool Allocator Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                  BACKING REGION (fixed size)                         │
//!   │                                                                      │
//!   │   ┌──────────────────┬──────────────────┬──────────────────┐         │
//!   │   │   32-B blocks    │   64-B blocks    │   256-B blocks   │         │
//!   │   │ ┌──┬──┬──┬──┬──┐ │ ┌────┬────┬────┐ │ ┌──────┬──────┐  │         │
//!   │   │ │##│  │##│  │  │ │ │####│    │####│ │ │######│      │  │         │
//!   │   │ └──┴──┴──┴──┴──┘ │ └────┴────┴────┘ │ └──────┴──────┘  │         │
//!   │   └──────────────────┴──────────────────┴──────────────────┘         │
//!   │                                                                      │
//!   │   A request goes to the pool with the smallest sufficient block      │
//!   │   size that still has capacity ("best fit with fallback").           │
//!   │   Freed blocks are recycled LIFO through an intrusive free list.     │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── partition  - Partition arithmetic macros (partition_size!,
//!   │                blocks_in_partition!)
//!   ├── link       - Intrusive free-list link representation (internal)
//!   ├── pool       - PoolAllocator implementation
//!   └── global     - Process-wide singleton behind a spin lock
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::PoolAllocator;
//!
//! let mut allocator: PoolAllocator = PoolAllocator::new();
//!
//! // Partition the 64-KiB region into four pools.
//! allocator.init(&[32, 64, 256, 1024]).unwrap();
//!
//! unsafe {
//!     // 100 bytes best-fit into the 256-byte pool.
//!     let ptr = allocator.allocate(100);
//!     assert!(!ptr.is_null());
//!
//!     // Use the memory.
//!     ptr.write(42);
//!     assert_eq!(ptr.read(), 42);
//!
//!     // Return it; the block is recycled LIFO.
//!     allocator.release(ptr);
//! }
//! ```
//!
//! ## How It Works
//!
//! `init` splits the region into equal partitions, one per configured block
//! size, and records a descriptor per pool. `allocate` scans the descriptor
//! table for the smallest sufficient pool with capacity, then either bumps
//! that pool's high-water mark or pops the head of its free list. `release`
//! finds the owning pool by pointer range and pushes the block back as the
//! new free-list head. The free list is threaded through the freed blocks
//! themselves:
//!
//! ```text
//!   One pool after release(B), release(D):
//!
//!   ┌───────┬───────┬───────┬───────┬───────┐
//!   │ A live│ B free│ C live│ D free│ unborn│
//!   └───────┴───┬───┴───────┴───┬───┴───────┘
//!               │   ▲           │
//!   free_head ──┘   └───────────┘      (next allocate returns D, then B)
//! ```
//!
//! ## Features
//!
//! - **Fixed footprint**: no dynamic growth, no platform-allocator calls
//! - **Deterministic cost**: O(pool count) selection, O(1) dispatch
//! - **Best fit with fallback**: full pools spill into the next larger one
//! - **Two forms**: an owned value type, and a process-wide singleton
//!
//! ## Limitations
//!
//! - **Single-threaded core**: the singleton wraps it in a lock; the value
//!   type requires external synchronization
//! - **Bounded requests**: nothing larger than the largest configured block
//!   size can be served
//! - **No metadata**: the allocator returns raw regions and keeps no record
//!   of sizes or callers
//! - **No double-free detection** in release builds
//!
//! ## Safety
//!
//! Allocation hands out raw pointers into the allocator's own region. All
//! allocation and release operations require `unsafe` blocks, and the
//! caller is responsible for not using blocks after releasing them.

pub mod global;
mod link;
pub mod partition;
mod pool;

pub use link::LINK_WIDTH;
pub use pool::{print_alloc, InitError, PoolAllocator, HEAP_SIZE, MAX_POOLS};
