/// Calculates the equal share of a backing region allotted to each pool.
///
/// The region is split evenly; any remainder of `$heap_size % $count` bytes
/// at the tail of the region stays unused.
///
/// # Examples
///
/// ```rust
/// use rpool::partition_size;
///
/// assert_eq!(partition_size!(65536, 4), 16384);
/// assert_eq!(partition_size!(65536, 5), 13107); // remainder of 1 byte is wasted
/// ```
#[macro_export]
macro_rules! partition_size {
  ($heap_size:expr, $count:expr) => {
    ($heap_size / $count)
  };
}

/// Calculates how many whole blocks of a given size fit in one partition.
///
/// Any partial block at the tail of the partition is ignored.
///
/// # Examples
///
/// ```rust
/// use rpool::blocks_in_partition;
///
/// assert_eq!(blocks_in_partition!(16384, 256), 64);
/// assert_eq!(blocks_in_partition!(16384, 1024), 16);
/// assert_eq!(blocks_in_partition!(13107, 1000), 13); // 107 bytes wasted
/// ```
#[macro_export]
macro_rules! blocks_in_partition {
  ($partition:expr, $block_size:expr) => {
    ($partition / $block_size)
  };
}
