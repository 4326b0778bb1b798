//! # Chunk Streaming Window
//!
//! Tracks which chunks around an observer are believed loaded and emits
//! one event per transition.
//!
//! The window is a `(2R+1)²` grid of flags centred on the observer's
//! chunk. When the centre or radius changes, flags are carried over to a
//! fresh grid by absolute coordinate: flags that no longer fit produce
//! `Unload`, and every cell still unflagged afterwards produces `Load`.
//! A coordinate therefore alternates strictly between load and unload.

use tracing::trace;

use crate::chunk::ChunkCoord;

/// A window transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkEvent {
    /// Chunk entered the window.
    Load(ChunkCoord),
    /// Chunk left the window.
    Unload(ChunkCoord),
}

impl ChunkEvent {
    /// Chunk this event is about.
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        match self {
            Self::Load(c) | Self::Unload(c) => c,
        }
    }
}

/// Loaded flags around a moving centre.
#[derive(Clone, Debug)]
pub struct ChunkWindow {
    radius: u32,
    center: Option<ChunkCoord>,
    loaded: Vec<bool>,
}

impl ChunkWindow {
    /// Creates an empty window. Nothing is loaded until the first
    /// [`ChunkWindow::set_position`].
    #[must_use]
    pub fn new(radius: u32) -> Self {
        Self {
            radius,
            center: None,
            loaded: vec![false; Self::cells(radius)],
        }
    }

    const fn side(radius: u32) -> usize {
        2 * radius as usize + 1
    }

    const fn cells(radius: u32) -> usize {
        Self::side(radius) * Self::side(radius)
    }

    /// Current radius.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Current centre, `None` before the first position.
    #[must_use]
    pub const fn center(&self) -> Option<ChunkCoord> {
        self.center
    }

    /// Absolute coordinate of grid index `i`.
    fn coord_at(center: ChunkCoord, radius: u32, i: usize) -> ChunkCoord {
        let side = Self::side(radius);
        let r = radius as i32;
        ChunkCoord::new(
            center.x + (i % side) as i32 - r,
            center.z + (i / side) as i32 - r,
        )
    }

    /// Grid index of `coord`, if inside the window.
    fn index_of(center: ChunkCoord, radius: u32, coord: ChunkCoord) -> Option<usize> {
        let r = i64::from(radius);
        let dx = i64::from(coord.x) - i64::from(center.x) + r;
        let dz = i64::from(coord.z) - i64::from(center.z) + r;
        let side = 2 * r + 1;
        ((0..side).contains(&dx) && (0..side).contains(&dz)).then(|| (dz * side + dx) as usize)
    }

    /// Returns true if `coord` is flagged loaded.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.center
            .and_then(|c| Self::index_of(c, self.radius, coord))
            .is_some_and(|i| self.loaded[i])
    }

    /// Every coordinate flagged loaded, row-major.
    pub fn loaded(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        let center = self.center;
        let radius = self.radius;
        self.loaded
            .iter()
            .enumerate()
            .filter(|(_, &on)| on)
            .filter_map(move |(i, _)| center.map(|c| Self::coord_at(c, radius, i)))
    }

    /// Moves the window to `center`.
    pub fn set_position(&mut self, center: ChunkCoord) -> Vec<ChunkEvent> {
        if self.center == Some(center) {
            return Vec::new();
        }
        self.rebuild(center, self.radius)
    }

    /// Moves the window to the chunk nearest an observer position.
    pub fn set_observer(&mut self, x: f64, z: f64) -> Vec<ChunkEvent> {
        self.set_position(ChunkCoord::from_observer(x, z))
    }

    /// Changes the radius around the current centre.
    pub fn set_radius(&mut self, radius: u32) -> Vec<ChunkEvent> {
        if radius == self.radius {
            return Vec::new();
        }
        match self.center {
            Some(center) => self.rebuild(center, radius),
            None => {
                self.radius = radius;
                self.loaded = vec![false; Self::cells(radius)];
                Vec::new()
            }
        }
    }

    /// Unloads everything and forgets the centre.
    pub fn clear(&mut self) -> Vec<ChunkEvent> {
        let events: Vec<ChunkEvent> = self.loaded().map(ChunkEvent::Unload).collect();
        for event in &events {
            trace!(chunk = ?event.chunk(), "window unload");
        }
        self.loaded.iter_mut().for_each(|flag| *flag = false);
        self.center = None;
        events
    }

    fn rebuild(&mut self, center: ChunkCoord, radius: u32) -> Vec<ChunkEvent> {
        let mut next = vec![false; Self::cells(radius)];
        let mut events = Vec::new();

        if let Some(old) = self.center {
            for (i, _) in self.loaded.iter().enumerate().filter(|(_, &on)| on) {
                let coord = Self::coord_at(old, self.radius, i);
                match Self::index_of(center, radius, coord) {
                    Some(j) => next[j] = true,
                    None => {
                        trace!(chunk = ?coord, "window unload");
                        events.push(ChunkEvent::Unload(coord));
                    }
                }
            }
        }

        for (i, flag) in next.iter_mut().enumerate().filter(|(_, on)| !**on) {
            let coord = Self::coord_at(center, radius, i);
            trace!(chunk = ?coord, "window load");
            events.push(ChunkEvent::Load(coord));
            *flag = true;
        }

        self.center = Some(center);
        self.radius = radius;
        self.loaded = next;
        events
    }
}
