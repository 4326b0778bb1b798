//! # Cell Buffer Pool
//!
//! Free list of cell buffers for objects that are frequently allocated and
//! freed: region slabs (512x512 cells, ~6 MB each) and layer scratch grids.
//!
//! Reuse is an optimization only. Every buffer handed out is fully
//! overwritten by its new owner, and callers never depend on getting a
//! recycled buffer back.

use parking_lot::Mutex;

use crate::cell::CellAttributes;
use crate::grid::{Area, CellGrid};

/// A thread-safe pool of cell buffers.
///
/// # Example
///
/// ```rust,ignore
/// let pool = GridPool::new(4);
///
/// let grid = pool.acquire(Area::new(0, 0, 512, 512));
/// // ... fill and use ...
/// pool.release(grid);
/// ```
#[derive(Debug)]
pub struct GridPool {
    /// Released buffers, largest capacity last.
    free_list: Mutex<Vec<Vec<CellAttributes>>>,
    /// Maximum number of idle buffers kept.
    capacity: usize,
}

/// Counters exposed for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Buffers currently idle in the pool.
    pub idle: usize,
    /// Maximum idle buffers.
    pub capacity: usize,
}

impl GridPool {
    /// Creates a pool keeping at most `capacity` idle buffers.
    ///
    /// A capacity of zero disables pooling: every acquire allocates.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free_list: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Returns the maximum number of idle buffers.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.free_list.lock().len(),
            capacity: self.capacity,
        }
    }

    /// Takes a buffer of exactly `area.len()` default cells.
    ///
    /// Picks the smallest idle buffer that is large enough, else allocates.
    #[must_use]
    pub fn acquire(&self, area: Area) -> CellGrid {
        let len = area.len();
        let recycled = {
            let mut free = self.free_list.lock();
            free.iter()
                .position(|buf| buf.capacity() >= len)
                .map(|i| free.remove(i))
        };
        let mut cells = recycled.unwrap_or_default();
        cells.clear();
        cells.resize(len, CellAttributes::default());
        CellGrid::from_cells(area, cells).unwrap_or_else(|| CellGrid::new(area))
    }

    /// Returns a grid's buffer to the pool.
    ///
    /// Dropped instead if the pool is full.
    pub fn release(&self, grid: CellGrid) {
        if self.capacity == 0 {
            return;
        }
        let buf = grid.into_cells();
        let mut free = self.free_list.lock();
        if free.len() >= self.capacity {
            return;
        }
        let at = free.partition_point(|b| b.capacity() <= buf.capacity());
        free.insert(at, buf);
    }

    /// Drops every idle buffer.
    pub fn clear(&self) {
        self.free_list.lock().clear();
    }
}

impl Default for GridPool {
    fn default() -> Self {
        Self::new(4)
    }
}
