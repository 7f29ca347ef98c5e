//! Spatial hash broad phase with back-referenced cell membership.
//!
//! Space is partitioned into a uniform grid of cubes. Every tracked item
//! is registered in each cell its bounding box touches, and remembers
//! where inside each cell list it was stored. Removal swaps the last
//! entry of a cell list into the vacated slot and patches the moved
//! entry's back-reference, so removing an item costs O(cells it spans)
//! regardless of how crowded those cells are.
//!
//! Items are identified by a dense `usize` index (a node index for cloth),
//! and the hasher owns all membership bookkeeping in an index-addressed
//! arena. Callers only hand in something [`SpatialHashable`].

use std::collections::HashMap;

use glam::{IVec3, Vec3};
use weft_types::{WeftError, WeftResult};

use crate::broad::{GridBounds, SpatialHashable};

/// One item stored in a cell list.
#[derive(Debug, Clone, Copy)]
struct CellEntry {
    item: usize,
    /// Position of the matching [`Membership`] in the item's tracker.
    slot: usize,
}

/// Where an item sits inside one cell list.
#[derive(Debug, Clone, Copy)]
struct Membership {
    cell: IVec3,
    index: usize,
}

/// Bookkeeping for a single tracked item.
#[derive(Debug, Clone, Default)]
struct ItemTracker {
    bounds: Option<GridBounds>,
    memberships: Vec<Membership>,
}

/// Uniform-grid spatial hash.
///
/// Cell lists are never dropped once created; an emptied cell keeps its
/// allocation for the next item that moves into it.
#[derive(Debug, Clone)]
pub struct SpatialHasher {
    grid_size: f32,
    grid: HashMap<IVec3, Vec<CellEntry>>,
    trackers: Vec<ItemTracker>,
    tracked: usize,
    reinsertions: u64,
}

impl SpatialHasher {
    /// Creates an empty hasher with cubic cells of edge `grid_size`.
    pub fn new(grid_size: f32) -> WeftResult<Self> {
        if !(grid_size.is_finite() && grid_size > 0.0) {
            return Err(WeftError::InvalidConfig(format!(
                "grid size must be positive and finite, got {grid_size}"
            )));
        }
        Ok(Self {
            grid_size,
            grid: HashMap::new(),
            trackers: Vec::new(),
            tracked: 0,
            reinsertions: 0,
        })
    }

    /// Edge length of one grid cell.
    pub fn grid_size(&self) -> f32 {
        self.grid_size
    }

    /// Number of items currently tracked.
    pub fn len(&self) -> usize {
        self.tracked
    }

    pub fn is_empty(&self) -> bool {
        self.tracked == 0
    }

    /// Returns true if `item` is currently registered.
    pub fn contains(&self, item: usize) -> bool {
        self.bounds_of(item).is_some()
    }

    /// Cell range the item was registered with, if tracked.
    pub fn bounds_of(&self, item: usize) -> Option<GridBounds> {
        self.trackers.get(item).and_then(|t| t.bounds)
    }

    /// Cell range a hashable would occupy on this grid.
    pub fn bounds_for<T: SpatialHashable + ?Sized>(&self, item: &T) -> GridBounds {
        GridBounds::of(item, self.grid_size)
    }

    /// How many times [`update`](Self::update) actually re-registered an item.
    pub fn reinsertion_count(&self) -> u64 {
        self.reinsertions
    }

    /// Registers `item` in every cell its bounding box covers.
    ///
    /// Inserting an item that is already tracked re-registers it.
    pub fn insert<T: SpatialHashable + ?Sized>(&mut self, item: usize, hashable: &T) {
        let bounds = self.bounds_for(hashable);
        self.remove(item);
        self.insert_with_bounds(item, bounds);
    }

    fn insert_with_bounds(&mut self, item: usize, bounds: GridBounds) {
        if item >= self.trackers.len() {
            self.trackers.resize_with(item + 1, ItemTracker::default);
        }

        let mut memberships = std::mem::take(&mut self.trackers[item].memberships);
        memberships.clear();
        for cell in bounds.cells() {
            let list = self.grid.entry(cell).or_default();
            memberships.push(Membership {
                cell,
                index: list.len(),
            });
            list.push(CellEntry {
                item,
                slot: memberships.len() - 1,
            });
        }

        let tracker = &mut self.trackers[item];
        tracker.memberships = memberships;
        tracker.bounds = Some(bounds);
        self.tracked += 1;
    }

    /// Unregisters `item` from every cell. Returns false if it was not tracked.
    pub fn remove(&mut self, item: usize) -> bool {
        let Some(tracker) = self.trackers.get_mut(item) else {
            return false;
        };
        if tracker.bounds.take().is_none() {
            return false;
        }

        let mut memberships = std::mem::take(&mut tracker.memberships);
        for membership in &memberships {
            let Some(list) = self.grid.get_mut(&membership.cell) else {
                continue;
            };
            let last = list.len() - 1;
            if membership.index != last {
                let moved = list[last];
                list[membership.index] = moved;
                self.trackers[moved.item].memberships[moved.slot].index = membership.index;
            }
            list.pop();
        }

        memberships.clear();
        self.trackers[item].memberships = memberships;
        self.tracked -= 1;
        true
    }

    /// Re-registers `item` only if its cell range changed.
    ///
    /// Returns true when the item was moved to a new set of cells. An
    /// untracked item is inserted.
    pub fn update<T: SpatialHashable + ?Sized>(&mut self, item: usize, hashable: &T) -> bool {
        let bounds = self.bounds_for(hashable);
        if self.bounds_of(item) == Some(bounds) {
            return false;
        }
        self.remove(item);
        self.insert_with_bounds(item, bounds);
        self.reinsertions += 1;
        true
    }

    /// Items sharing at least one cell with `item`, including `item` itself.
    ///
    /// An item spanning several cells shared with the query is yielded once
    /// per shared cell; callers that need uniqueness sort and dedup.
    pub fn query_near_item(&self, item: usize) -> impl Iterator<Item = usize> + '_ {
        let memberships = self
            .trackers
            .get(item)
            .map(|t| t.memberships.as_slice())
            .unwrap_or(&[]);
        memberships
            .iter()
            .flat_map(move |m| self.cell_items(m.cell))
    }

    /// Items registered in any cell of `bounds`, possibly repeated.
    ///
    /// When `bounds` spans more cells than there are tracked items, the
    /// trackers are scanned instead and each overlapping item is yielded
    /// once.
    pub fn query_near_bounds(&self, bounds: GridBounds) -> Box<dyn Iterator<Item = usize> + '_> {
        if bounds.cell_count() > self.tracked as u64 {
            Box::new(self.trackers.iter().enumerate().filter_map(move |(item, tracker)| {
                tracker
                    .bounds
                    .filter(|own| own.overlaps(&bounds))
                    .map(|_| item)
            }))
        } else {
            Box::new(bounds.cells().flat_map(move |cell| self.cell_items(cell)))
        }
    }

    /// Items registered in any cell touched by the cube of edge
    /// `2 * radius` centred at `centroid`, possibly repeated.
    pub fn query_near_sphere(
        &self,
        centroid: Vec3,
        radius: f32,
    ) -> Box<dyn Iterator<Item = usize> + '_> {
        let bounds = GridBounds::from_aabb(centroid, Vec3::splat(2.0 * radius), self.grid_size);
        self.query_near_bounds(bounds)
    }

    fn cell_items(&self, cell: IVec3) -> impl Iterator<Item = usize> + '_ {
        self.grid
            .get(&cell)
            .into_iter()
            .flat_map(|list| list.iter().map(|entry| entry.item))
    }

    /// Checks every back-reference against the cell lists.
    ///
    /// Returns the number of registrations verified, or a description of
    /// the first inconsistency.
    pub fn verify_consistency(&self) -> Result<usize, String> {
        let mut verified = 0;
        for (item, tracker) in self.trackers.iter().enumerate() {
            let Some(bounds) = tracker.bounds else {
                if !tracker.memberships.is_empty() {
                    return Err(format!("untracked item {item} still has memberships"));
                }
                continue;
            };
            if tracker.memberships.len() as u64 != bounds.cell_count() {
                return Err(format!(
                    "item {item} registered in {} cells, bounds cover {}",
                    tracker.memberships.len(),
                    bounds.cell_count()
                ));
            }
            for (slot, membership) in tracker.memberships.iter().enumerate() {
                let entry = self
                    .grid
                    .get(&membership.cell)
                    .and_then(|list| list.get(membership.index));
                match entry {
                    Some(e) if e.item == item && e.slot == slot => verified += 1,
                    _ => {
                        return Err(format!(
                            "item {item} back-reference {slot} points at a foreign entry"
                        ))
                    }
                }
            }
        }
        let stored: usize = self.grid.values().map(Vec::len).sum();
        if stored != verified {
            return Err(format!("{stored} cell entries but {verified} back-references"));
        }
        Ok(verified)
    }
}
