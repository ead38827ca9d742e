//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;

use crate::core::types::{EntityId, Rect, Vec2};

/// Sparse hash grid bucketing entity ids by cell.
///
/// Each cell keeps its ids in insertion order and rectangle queries walk
/// cells row by row, so results are deterministic for a given insertion
/// history regardless of hash seeds.
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    /// Remove `entity` from the cell covering `pos`. Returns false if it
    /// was not stored there.
    pub fn remove(&mut self, entity: EntityId, pos: Vec2) -> bool {
        let coord = self.cell_coord(pos);
        let Some(cell) = self.cells.get_mut(&coord) else {
            return false;
        };
        let Some(index) = cell.iter().position(|(e, _)| *e == entity) else {
            return false;
        };
        // `remove` rather than `swap_remove`: survivors keep insertion order
        cell.remove(index);
        if cell.is_empty() {
            self.cells.remove(&coord);
        }
        true
    }

    /// All entities whose stored position lies inside the closed rectangle.
    ///
    /// Entities are yielded lazily. Cells are visited in row-major order,
    /// entities within a cell in insertion order.
    pub fn query_rect(&self, rect: Rect) -> impl Iterator<Item = EntityId> + '_ {
        self.occupied_cells_in(rect).into_iter().flat_map(move |coord| {
            self.cells
                .get(&coord)
                .into_iter()
                .flatten()
                .filter(move |(_, pos)| rect.contains(*pos))
                .map(|(e, _)| *e)
        })
    }

    /// Occupied cells overlapping `rect`, sorted row-major.
    ///
    /// Walks the covered cell range when it is smaller than the number of
    /// occupied cells, otherwise filters the occupied cells. Either way the
    /// work is bounded by `min(covered, occupied)` cells.
    fn occupied_cells_in(&self, rect: Rect) -> Vec<(i32, i32)> {
        if rect.is_empty() || self.cells.is_empty() {
            return Vec::new();
        }
        let (min_x, min_y) = self.cell_coord(rect.min);
        let (max_x, max_y) = self.cell_coord(rect.max);
        let columns = (max_x as i64 - min_x as i64 + 1) as u64;
        let rows = (max_y as i64 - min_y as i64 + 1) as u64;

        if columns.saturating_mul(rows) <= self.cells.len() as u64 {
            (min_y..=max_y)
                .flat_map(|cy| (min_x..=max_x).map(move |cx| (cx, cy)))
                .filter(|coord| self.cells.contains_key(coord))
                .collect()
        } else {
            let mut coords: Vec<_> = self
                .cells
                .keys()
                .copied()
                .filter(|&(cx, cy)| (min_x..=max_x).contains(&cx) && (min_y..=max_y).contains(&cy))
                .collect();
            coords.sort_unstable_by_key(|&(cx, cy)| (cy, cx));
            coords
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_rect_filters_within_cells() {
        let mut grid = SparseHashGrid::new(10.0);
        grid.insert(EntityId(1), Vec2::new(1.0, 1.0));
        grid.insert(EntityId(2), Vec2::new(9.0, 9.0));
        grid.insert(EntityId(3), Vec2::new(25.0, 5.0));

        let found: Vec<_> = grid.query_rect(Rect::new(0.0, 0.0, 5.0, 5.0)).collect();
        assert_eq!(found, vec![EntityId(1)]);

        let found: Vec<_> = grid.query_rect(Rect::new(0.0, 0.0, 30.0, 30.0)).collect();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_query_rect_is_row_major_and_stable() {
        let mut grid = SparseHashGrid::new(10.0);
        grid.insert(EntityId(5), Vec2::new(15.0, 15.0));
        grid.insert(EntityId(4), Vec2::new(5.0, 15.0));
        grid.insert(EntityId(3), Vec2::new(15.0, 5.0));
        grid.insert(EntityId(2), Vec2::new(5.0, 5.0));
        grid.insert(EntityId(1), Vec2::new(6.0, 6.0));

        let rect = Rect::new(0.0, 0.0, 20.0, 20.0);
        let first: Vec<_> = grid.query_rect(rect).collect();
        let second: Vec<_> = grid.query_rect(rect).collect();
        assert_eq!(
            first,
            vec![EntityId(2), EntityId(1), EntityId(3), EntityId(4), EntityId(5)]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_inverted_rect_is_empty() {
        let mut grid = SparseHashGrid::new(10.0);
        grid.insert(EntityId(1), Vec2::new(5.0, 5.0));
        assert_eq!(grid.query_rect(Rect::new(10.0, 10.0, 0.0, 0.0)).count(), 0);
    }

    #[test]
    fn test_remove_keeps_order_and_len() {
        let mut grid = SparseHashGrid::new(10.0);
        grid.insert(EntityId(1), Vec2::new(1.0, 1.0));
        grid.insert(EntityId(2), Vec2::new(2.0, 2.0));
        grid.insert(EntityId(3), Vec2::new(3.0, 3.0));

        assert!(grid.remove(EntityId(2), Vec2::new(2.0, 2.0)));
        assert!(!grid.remove(EntityId(2), Vec2::new(2.0, 2.0)));

        let found: Vec<_> = grid.query_rect(Rect::new(0.0, 0.0, 9.0, 9.0)).collect();
        assert_eq!(found, vec![EntityId(1), EntityId(3)]);
    }

    #[test]
    fn test_tiny_cells_query_occupied_cells_only() {
        let mut grid = SparseHashGrid::new(0.0001);
        grid.insert(EntityId(3), Vec2::new(90.0, 10.0));
        grid.insert(EntityId(1), Vec2::new(10.0, 50.0));
        grid.insert(EntityId(2), Vec2::new(50.0, 10.0));

        // ~10^12 covered cells; only the three occupied ones are visited
        let found: Vec<_> = grid.query_rect(Rect::new(0.0, 0.0, 100.0, 100.0)).collect();
        assert_eq!(found, vec![EntityId(2), EntityId(3), EntityId(1)]);

        let found: Vec<_> = grid.query_rect(Rect::new(40.0, 0.0, 100.0, 20.0)).collect();
        assert_eq!(found, vec![EntityId(2), EntityId(3)]);
    }

    #[test]
    fn test_both_walks_agree() {
        let mut grid = SparseHashGrid::new(4.0);
        for i in 0..40u64 {
            grid.insert(EntityId(i), Vec2::new((i * 7 % 50) as f32, (i * 13 % 30) as f32));
        }
        // 2x2 covered cells: dense walk. 13x8 covered cells: sparse filter.
        let small = Rect::new(8.0, 8.0, 15.0, 15.0);
        let large = Rect::new(0.0, 0.0, 50.0, 30.0);
        let small_found: Vec<_> = grid.query_rect(small).collect();
        let large_found: Vec<_> = grid.query_rect(large).collect();

        assert_eq!(large_found.len(), 40);
        let in_small: Vec<_> = large_found
            .iter()
            .copied()
            .filter(|id| small_found.contains(id))
            .collect();
        assert_eq!(in_small, small_found);
    }
}
