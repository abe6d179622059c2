use std::ops::{Index, IndexMut};

/// Moore neighbourhood offsets, row-major.
#[rustfmt::skip]
pub const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Fixed-size, row-major 2-D board.
///
/// Always rectangular: the dimensions are chosen at creation and never
/// change. `get`/`set` report out-of-bounds access instead of clamping, and
/// indexing with `grid[(r, c)]` panics on it like slice indexing does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Builds a grid from nested rows. Returns `None` if the rows are ragged.
    #[cfg(test)]
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return None;
        }
        let n = rows.len();
        Some(Self {
            rows: n,
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// Swaps rows and columns.
    pub fn transpose(&self) -> Self {
        let mut cells = Vec::with_capacity(self.cells.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                cells.push(self.cells[r * self.cols + c].clone());
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            cells,
        }
    }

    /// Removes row `r`, shifts every row above it down by one and fills the
    /// top row with `fill`. Dimensions are unchanged.
    pub fn drop_row(&mut self, r: usize, fill: T) {
        assert!(r < self.rows, "row {r} out of bounds ({} rows)", self.rows);
        let start = r * self.cols;
        self.cells.drain(start..start + self.cols);
        self.cells.splice(0..0, std::iter::repeat(fill).take(self.cols));
    }

    /// Overwrites row `r` with `values`. The slice must be exactly `cols` long.
    pub fn set_row(&mut self, r: usize, values: &[T]) {
        assert_eq!(values.len(), self.cols, "row length must match grid width");
        let start = r * self.cols;
        self.cells[start..start + self.cols].clone_from_slice(values);
    }

    /// Resets every cell to `fill`.
    pub fn fill(&mut self, fill: T) {
        for cell in &mut self.cells {
            *cell = fill.clone();
        }
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn within_bounds(&self, r: isize, c: isize) -> bool {
        r >= 0 && c >= 0 && (r as usize) < self.rows && (c as usize) < self.cols
    }

    pub fn get(&self, r: usize, c: usize) -> Option<&T> {
        if r < self.rows && c < self.cols {
            self.cells.get(r * self.cols + c)
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, r: usize, c: usize) -> Option<&mut T> {
        if r < self.rows && c < self.cols {
            self.cells.get_mut(r * self.cols + c)
        } else {
            None
        }
    }

    /// Writes `value` at `(r, c)`. Returns `false` (and writes nothing) when
    /// the position is outside the grid.
    pub fn set(&mut self, r: usize, c: usize, value: T) -> bool {
        match self.get_mut(r, c) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn row(&self, r: usize) -> &[T] {
        assert!(r < self.rows, "row {r} out of bounds ({} rows)", self.rows);
        &self.cells[r * self.cols..(r + 1) * self.cols]
    }

    pub fn for_each_cell(&self, mut f: impl FnMut(usize, usize, &T)) {
        for (i, cell) in self.cells.iter().enumerate() {
            f(i / self.cols, i % self.cols, cell);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / cols, i % cols), cell))
    }

    /// In-bounds Moore neighbours of `(r, c)`.
    pub fn neighbours(&self, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        NEIGHBOURS.iter().filter_map(move |&(dr, dc)| {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            self.within_bounds(nr, nc).then_some((nr as usize, nc as usize))
        })
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (r, c): (usize, usize)) -> &T {
        assert!(
            r < self.rows && c < self.cols,
            "cell ({r}, {c}) out of bounds for {}x{} grid",
            self.rows,
            self.cols
        );
        &self.cells[r * self.cols + c]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        assert!(
            r < self.rows && c < self.cols,
            "cell ({r}, {c}) out of bounds for {}x{} grid",
            self.rows,
            self.cols
        );
        &mut self.cells[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn get_and_set_respect_bounds() {
        let mut g = Grid::new(2, 3, 0u8);
        assert!(g.set(1, 2, 7));
        assert_eq!(g.get(1, 2), Some(&7));
        assert!(!g.set(2, 0, 9));
        assert_eq!(g.get(0, 3), None);
        assert!(g.within_bounds(1, 2));
        assert!(!g.within_bounds(-1, 0));
        assert!(!g.within_bounds(0, 3));
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds_panics() {
        let g = Grid::new(2, 2, 0u8);
        let _ = g[(0, 2)];
    }

    #[test]
    fn transpose_swaps_axes() {
        let g = Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        let t = g.transpose();
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert_eq!(t.row(0), &[1, 4]);
        assert_eq!(t.row(2), &[3, 6]);
        assert_eq!(t.transpose(), g);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_none());
    }

    #[test]
    fn drop_row_shifts_rows_down() {
        let mut g = Grid::from_rows(vec![vec![1, 1], vec![2, 2], vec![3, 3]]).unwrap();
        g.drop_row(1, 0);
        assert_eq!(g.row(0), &[0, 0]);
        assert_eq!(g.row(1), &[1, 1]);
        assert_eq!(g.row(2), &[3, 3]);
    }

    #[test]
    fn corner_has_three_neighbours() {
        let g = Grid::new(4, 4, ());
        assert_eq!(g.neighbours(0, 0).count(), 3);
        assert_eq!(g.neighbours(1, 1).count(), 8);
        assert_eq!(g.neighbours(3, 1).count(), 5);
    }

    #[test]
    fn for_each_cell_visits_row_major() {
        let g = Grid::from_rows(vec![vec!['a', 'b'], vec!['c', 'd']]).unwrap();
        let mut seen = Vec::new();
        g.for_each_cell(|r, c, v| seen.push((r, c, *v)));
        assert_eq!(seen, vec![(0, 0, 'a'), (0, 1, 'b'), (1, 0, 'c'), (1, 1, 'd')]);
    }

    proptest! {
        #[test]
        fn drop_row_keeps_dimensions(rows in 1usize..12, cols in 1usize..12, pick in 0usize..12) {
            let mut g = Grid::new(rows, cols, 1u8);
            let r = pick % rows;
            g.drop_row(r, 0);
            prop_assert_eq!(g.rows(), rows);
            prop_assert_eq!(g.cols(), cols);
            prop_assert!(g.row(0).iter().all(|&v| v == 0));
            prop_assert_eq!(g.cells().len(), rows * cols);
        }
    }
}
