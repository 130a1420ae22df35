use std::{io::Read, ptr};

use rpool::{print_alloc, InitError, PoolAllocator};

/// Waits until the user presses ENTER.
/// Useful when you want to follow the allocator state section by section,
/// or inspect the process with tools like `pmap`, `htop`, or `gdb`.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn main() {
  // Our pool allocator: a 64-KiB region that will be partitioned into
  // equal shares, one per configured block size. Nothing is ever requested
  // from the operating system after this value exists.
  let mut allocator: PoolAllocator = PoolAllocator::new();

  // --------------------------------------------------------------------
  // 1) Rejected configurations.
  //    Too many pools, and a block size that cannot fit its partition.
  // --------------------------------------------------------------------
  println!("[1] Rejected configurations");

  let err = allocator.init(&[32, 64, 256, 1024, 2048, 4096]).unwrap_err();
  println!("[1] init with 6 sizes      -> {err}");
  assert!(matches!(err, InitError::InvalidCount { .. }));

  // Partition = 65536 / 5 = 13107, so a 14000-byte block cannot fit.
  let err = allocator.init(&[32, 64, 256, 1024, 14000]).unwrap_err();
  println!("[1] init with a 14000-byte size -> {err}");

  // --------------------------------------------------------------------
  // 2) A valid configuration: four pools over four 16-KiB partitions.
  //    They hold 512, 256, 64, and 16 blocks respectively.
  // --------------------------------------------------------------------
  allocator.init(&[32, 64, 256, 1024]).expect("valid configuration");
  println!("\n[2] Configured: {allocator:#?}");

  block_until_enter_pressed();

  unsafe {
    // --------------------------------------------------------------------
    // 3) Best fit: 66 bytes skip the 32- and 64-byte pools and land in
    //    the 256-byte pool; 240 bytes land there as well.
    // --------------------------------------------------------------------
    println!("\n[3] Best-fit allocations");
    let first_block = allocator.allocate(66);
    print_alloc(66, first_block);

    let second_block = allocator.allocate(240);
    print_alloc(240, second_block);

    // Write something into the allocated memory to show it's usable.
    ptr::write_bytes(first_block, 0xAB, 66);
    println!("[3] Initialized first block with 0xAB");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) Fallback: fill the rest of the 256-byte pool. The 65th request
    //    overall finds that pool full and spills into the 1024-byte pool.
    // --------------------------------------------------------------------
    println!("\n[4] Filling the 256-byte pool");
    for i in 2..65 {
      let block = allocator.allocate(240);
      if i == 2 || i == 63 {
        println!("[4] request {}: 240 bytes from the 256-byte pool at {block:?}", i + 1);
      } else if i == 64 {
        println!("[4] request {}: 240 bytes from the 1024-byte pool at {block:?}", i + 1);
      }
    }
    println!("[4] State: {allocator:#?}");

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) LIFO reuse: release a block and watch the very next fitting
    //    allocation return the same address.
    // --------------------------------------------------------------------
    println!("\n[5] LIFO reuse");
    let p1 = allocator.allocate(56);
    let p2 = allocator.allocate(56);
    print_alloc(56, p1);
    print_alloc(56, p2);

    allocator.release(p1);
    println!("[5] Released {p1:?}");

    let p3 = allocator.allocate(56);
    print_alloc(56, p3);
    println!(
      "[5] p3 == p1? {}",
      if p3 == p1 {
        "Yes, the most recently freed block is reused first"
      } else {
        "No, something is off"
      }
    );

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 6) Exhaustion: the 1024-byte pool holds 16 blocks, one of which is
    //    already spoken for by the spill in step 4. Requests beyond that
    //    fail with null; there is no larger pool to fall back to.
    // --------------------------------------------------------------------
    println!("\n[6] Exhausting the 1024-byte pool");
    let mut served = 0;
    loop {
      let block = allocator.allocate(1023);
      if block.is_null() {
        print_alloc(1023, block);
        break;
      }
      served += 1;
    }
    println!("[6] Served {served} further 1023-byte requests before running dry");

    // --------------------------------------------------------------------
    // 7) Foreign pointers: releasing null or an address outside the
    //    region is a silent no-op; the pools are untouched.
    // --------------------------------------------------------------------
    println!("\n[7] Releasing null and a foreign pointer (both no-ops)");
    allocator.release(ptr::null_mut());
    let mut on_the_stack = 0u8;
    allocator.release(&mut on_the_stack);
    println!("[7] State unchanged: {allocator:#?}");

    // --------------------------------------------------------------------
    // 8) End of demo.
    //
    //    The backing region is part of the allocator value; it is reclaimed
    //    like any other local when main returns.
    // --------------------------------------------------------------------
    println!("\n[8] End of example.");
  }
}
