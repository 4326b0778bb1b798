//! # Cell Grids
//!
//! Rectangles of cells anchored at world coordinates.
//!
//! Every map-producing function in the pipeline returns a `CellGrid`
//! covering exactly the `Area` it was asked for. Storage is row-major:
//! `z` is the outer axis, `x` the inner one.

use crate::cell::CellAttributes;

/// A rectangle in world tile coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Area {
    /// West edge (inclusive).
    pub x: i32,
    /// North edge (inclusive).
    pub z: i32,
    /// Width in tiles.
    pub width: usize,
    /// Depth in tiles.
    pub height: usize,
}

impl Area {
    /// Creates a new area.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32, width: usize, height: usize) -> Self {
        Self { x, z, width, height }
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.width * self.height
    }

    /// Returns true if the area covers no cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// East edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn end_x(&self) -> i32 {
        self.x + self.width as i32
    }

    /// South edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn end_z(&self) -> i32 {
        self.z + self.height as i32
    }

    /// Grows the area by `halo` tiles on every side.
    #[inline]
    #[must_use]
    pub const fn expand(&self, halo: usize) -> Self {
        Self {
            x: self.x - halo as i32,
            z: self.z - halo as i32,
            width: self.width + 2 * halo,
            height: self.height + 2 * halo,
        }
    }

    /// Returns true if the world coordinate lies inside the area.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.x && x < self.end_x() && z >= self.z && z < self.end_z()
    }

    /// Returns true if `other` lies entirely inside this area.
    #[must_use]
    pub const fn contains_area(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.z >= self.z
            && other.end_x() <= self.end_x()
            && other.end_z() <= self.end_z()
    }

    /// Area of the coarser grid (cells `2^shift` times larger) that covers
    /// this one, plus `halo` coarse cells on the east and south sides.
    #[must_use]
    pub const fn coarsen(&self, shift: u32, halo: usize) -> Self {
        let x0 = self.x >> shift;
        let z0 = self.z >> shift;
        let x1 = (self.end_x() - 1) >> shift;
        let z1 = (self.end_z() - 1) >> shift;
        Self {
            x: x0,
            z: z0,
            width: (x1 - x0) as usize + 1 + halo,
            height: (z1 - z0) as usize + 1 + halo,
        }
    }
}

/// A rectangle of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGrid {
    area: Area,
    cells: Vec<CellAttributes>,
}

impl CellGrid {
    /// Creates a grid filled with default (ocean, unset) cells.
    #[must_use]
    pub fn new(area: Area) -> Self {
        Self {
            area,
            cells: vec![CellAttributes::default(); area.len()],
        }
    }

    /// Creates a grid by evaluating `f(x, z)` at every world coordinate.
    pub fn from_fn(area: Area, mut f: impl FnMut(i32, i32) -> CellAttributes) -> Self {
        let mut cells = Vec::with_capacity(area.len());
        for z in area.z..area.end_z() {
            for x in area.x..area.end_x() {
                cells.push(f(x, z));
            }
        }
        Self { area, cells }
    }

    /// Wraps an existing buffer.
    ///
    /// Returns `None` if the buffer length does not match the area.
    #[must_use]
    pub fn from_cells(area: Area, cells: Vec<CellAttributes>) -> Option<Self> {
        (cells.len() == area.len()).then_some(Self { area, cells })
    }

    /// Area covered by this grid.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    /// Width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.area.width
    }

    /// Depth in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.area.height
    }

    /// Raw cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[CellAttributes] {
        &self.cells
    }

    /// Mutable raw cells, row-major.
    #[inline]
    pub fn cells_mut(&mut self) -> &mut [CellAttributes] {
        &mut self.cells
    }

    /// Consumes the grid and returns its buffer.
    #[must_use]
    pub fn into_cells(self) -> Vec<CellAttributes> {
        self.cells
    }

    #[inline]
    fn index(&self, x: i32, z: i32) -> usize {
        let lx = (x - self.area.x) as usize;
        let lz = (z - self.area.z) as usize;
        lz * self.area.width + lx
    }

    /// Gets the cell at world coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid. Layers size their
    /// upstream requests so this never happens; a panic here is a halo bug.
    #[inline]
    #[must_use]
    pub fn at(&self, x: i32, z: i32) -> &CellAttributes {
        assert!(
            self.area.contains(x, z),
            "({x}, {z}) outside grid {:?}",
            self.area
        );
        &self.cells[self.index(x, z)]
    }

    /// Gets the cell at world coordinates, if inside the grid.
    #[inline]
    #[must_use]
    pub fn get(&self, x: i32, z: i32) -> Option<&CellAttributes> {
        self.area
            .contains(x, z)
            .then(|| &self.cells[self.index(x, z)])
    }

    /// Sets the cell at world coordinates. Out-of-range writes are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, z: i32, cell: CellAttributes) {
        if self.area.contains(x, z) {
            let i = self.index(x, z);
            self.cells[i] = cell;
        }
    }

    /// Copies out a sub-rectangle.
    ///
    /// Returns `None` if `area` is not fully inside the grid.
    #[must_use]
    pub fn slice(&self, area: Area) -> Option<Self> {
        if !self.area.contains_area(&area) {
            return None;
        }
        let mut cells = Vec::with_capacity(area.len());
        for z in area.z..area.end_z() {
            let start = self.index(area.x, z);
            cells.extend_from_slice(&self.cells[start..start + area.width]);
        }
        Some(Self { area, cells })
    }

    /// Iterates `(x, z, cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &CellAttributes)> + '_ {
        let area = self.area;
        self.cells.iter().enumerate().map(move |(i, cell)| {
            let x = area.x + (i % area.width) as i32;
            let z = area.z + (i / area.width) as i32;
            (x, z, cell)
        })
    }
}
