//! Uniform hash grid used for pointer picking.
//!
//! Items are dense integer keys (simulation slots). Each item remembers its own
//! hit radius so a query can widen its search by the largest radius present.

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

pub const DEFAULT_CELL_SIZE: f32 = 64.0;

type Cell = (i32, i32);

#[derive(Clone, Copy, Debug)]
struct Entry {
    position: Vec2,
    radius: f32,
    cell: Cell,
}

#[derive(Clone, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    cells: HashMap<Cell, Vec<usize>>,
    entries: Vec<Option<Entry>>,
    len: usize,
    max_radius: f32,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: if cell_size.is_finite() && cell_size > 1.0 { cell_size } else { DEFAULT_CELL_SIZE },
            cells: HashMap::new(),
            entries: Vec::new(),
            len: 0,
            max_radius: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
        self.len = 0;
        self.max_radius = 0.0;
    }

    fn cell_for(&self, position: Vec2) -> Cell {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Inserts or moves `key`. Non-finite positions are ignored.
    pub fn insert(&mut self, key: usize, position: Vec2, radius: f32) {
        if !position.x.is_finite() || !position.y.is_finite() {
            self.remove(key);
            return;
        }

        let cell = self.cell_for(position);
        if key >= self.entries.len() {
            self.entries.resize(key + 1, None);
        }

        match self.entries[key].map(|entry| entry.cell) {
            Some(previous) if previous == cell => {}
            Some(previous) => {
                self.detach(key, previous);
                self.cells.entry(cell).or_default().push(key);
            }
            None => {
                self.cells.entry(cell).or_default().push(key);
                self.len += 1;
            }
        }

        let radius = radius.max(0.0);
        self.max_radius = self.max_radius.max(radius);
        self.entries[key] = Some(Entry {
            position,
            radius,
            cell,
        });
    }

    pub fn remove(&mut self, key: usize) -> bool {
        let Some(entry) = self.entries.get_mut(key).and_then(Option::take) else {
            return false;
        };
        self.detach(key, entry.cell);
        self.len -= 1;
        true
    }

    fn detach(&mut self, key: usize, cell: Cell) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|&other| other != key);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Replaces the whole content; `items` yields `(key, position, radius)`.
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (usize, Vec2, f32)>) {
        self.clear();
        for (key, position, radius) in items {
            self.insert(key, position, radius);
        }
    }

    /// Nearest item whose centre lies within `item.radius + extra_radius` of
    /// `point`. Ties resolve to the lower key.
    pub fn nearest_within(&self, point: Vec2, extra_radius: f32) -> Option<(usize, f32)> {
        if self.len == 0 || !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }

        let extra_radius = extra_radius.max(0.0);
        let reach = extra_radius + self.max_radius;
        let min = self.cell_for(vec2(point.x - reach, point.y - reach));
        let max = self.cell_for(vec2(point.x + reach, point.y + reach));
        let span = (max.0 as i64 - min.0 as i64 + 1) * (max.1 as i64 - min.1 as i64 + 1);

        let mut best: Option<(usize, f32)> = None;
        let mut consider = |key: usize| {
            let Some(entry) = self.entries[key] else {
                return;
            };
            let distance = (entry.position - point).length();
            if distance > entry.radius + extra_radius {
                return;
            }
            let better = match best {
                None => true,
                Some((best_key, best_distance)) => {
                    distance < best_distance || (distance == best_distance && key < best_key)
                }
            };
            if better {
                best = Some((key, distance));
            }
        };

        if span > self.cells.len() as i64 {
            for bucket in self.cells.values() {
                bucket.iter().copied().for_each(&mut consider);
            }
        } else {
            for cx in min.0..=max.0 {
                for cy in min.1..=max.1 {
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        bucket.iter().copied().for_each(&mut consider);
                    }
                }
            }
        }

        best
    }
}
