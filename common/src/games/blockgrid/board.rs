use serde::{Deserialize, Serialize};

use super::catalog::Shape;
use super::types::{BOARD_SIZE, BOX_SIZE, CELL_COUNT, Point};

/// Rows, columns and boxes that are fully occupied, plus the union of their
/// cells in row-major order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClearSet {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub boxes: Vec<usize>,
    pub cells: Vec<Point>,
}

impl ClearSet {
    pub fn group_count(&self) -> usize {
        self.rows.len() + self.cols.len() + self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group_count() == 0
    }
}

/// 9×9 grid of color classes, 0 meaning empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<u8>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: vec![0; CELL_COUNT],
        }
    }

    pub fn from_cells(cells: Vec<u8>) -> Result<Self, String> {
        if cells.len() != CELL_COUNT {
            return Err(format!(
                "Board must have {} cells, got {}",
                CELL_COUNT,
                cells.len()
            ));
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * BOARD_SIZE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.cells[row * BOARD_SIZE + col] = value;
    }

    pub fn is_occupied(&self, point: Point) -> bool {
        point.in_bounds() && self.cells[point.to_index()] != 0
    }

    pub fn is_empty_at(&self, point: Point) -> bool {
        point.in_bounds() && self.cells[point.to_index()] == 0
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> impl Iterator<Item = Point> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == 0)
            .map(|(i, _)| Point::from_index(i))
    }

    /// True when every cell of `shape` anchored at `(row, col)` lands on an
    /// empty in-bounds cell.
    pub fn can_place(&self, shape: &Shape, row: i32, col: i32) -> bool {
        shape
            .cells
            .iter()
            .all(|cell| self.is_empty_at(cell.offset(row, col)))
    }

    /// Writes the shape's color into its cells. Caller checks `can_place`.
    pub fn place(&mut self, shape: &Shape, row: i32, col: i32) -> Vec<Point> {
        let placed: Vec<Point> = shape.cells.iter().map(|c| c.offset(row, col)).collect();
        for point in &placed {
            self.cells[point.to_index()] = shape.color;
        }
        placed
    }

    /// True when the shape fits at some anchor on the board.
    pub fn fits_anywhere(&self, shape: &Shape) -> bool {
        let max_row = BOARD_SIZE as i32 - shape.height();
        let max_col = BOARD_SIZE as i32 - shape.width();
        (0..=max_row).any(|row| (0..=max_col).any(|col| self.can_place(shape, row, col)))
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        (0..BOARD_SIZE).all(|col| self.get(row, col) != 0)
    }

    pub fn is_col_full(&self, col: usize) -> bool {
        (0..BOARD_SIZE).all(|row| self.get(row, col) != 0)
    }

    /// Boxes are numbered row-major: box `b` covers rows `3*(b/3)..` and
    /// columns `3*(b%3)..`.
    pub fn is_box_full(&self, b: usize) -> bool {
        box_points(b).all(|p| self.cells[p.to_index()] != 0)
    }

    /// Each group is scanned independently, so a cell may belong to a full
    /// row, column and box at once; `cells` lists it once.
    pub fn find_clears(&self) -> ClearSet {
        let rows: Vec<usize> = (0..BOARD_SIZE).filter(|&r| self.is_row_full(r)).collect();
        let cols: Vec<usize> = (0..BOARD_SIZE).filter(|&c| self.is_col_full(c)).collect();
        let boxes: Vec<usize> = (0..BOARD_SIZE).filter(|&b| self.is_box_full(b)).collect();

        let mut marked = [false; CELL_COUNT];
        for &row in &rows {
            for col in 0..BOARD_SIZE {
                marked[row * BOARD_SIZE + col] = true;
            }
        }
        for &col in &cols {
            for row in 0..BOARD_SIZE {
                marked[row * BOARD_SIZE + col] = true;
            }
        }
        for &b in &boxes {
            for p in box_points(b) {
                marked[p.to_index()] = true;
            }
        }

        let cells = marked
            .iter()
            .enumerate()
            .filter(|(_, m)| **m)
            .map(|(i, _)| Point::from_index(i))
            .collect();

        ClearSet {
            rows,
            cols,
            boxes,
            cells,
        }
    }

    /// Zeroes the given cells and returns how many of them were occupied.
    pub fn clear(&mut self, points: &[Point]) -> usize {
        let mut cleared = 0;
        for point in points.iter().filter(|p| p.in_bounds()) {
            let cell = &mut self.cells[point.to_index()];
            if *cell != 0 {
                cleared += 1;
            }
            *cell = 0;
        }
        cleared
    }
}

pub(crate) fn box_points(b: usize) -> impl Iterator<Item = Point> {
    let top = (b / BOX_SIZE) * BOX_SIZE;
    let left = (b % BOX_SIZE) * BOX_SIZE;
    (0..BOX_SIZE).flat_map(move |dr| {
        (0..BOX_SIZE).map(move |dc| Point::new((top + dr) as i32, (left + dc) as i32))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::blockgrid::catalog::ShapeCatalog;

    fn shape(catalog: &ShapeCatalog, name: &str) -> Shape {
        catalog.find_by_name(name).unwrap().clone()
    }

    #[test]
    fn test_can_place_bounds_and_overlap() {
        let catalog = ShapeCatalog::standard();
        let bar = shape(&catalog, "tromino_i#0");
        let mut board = Board::new();

        assert!(board.can_place(&bar, 0, 6));
        assert!(!board.can_place(&bar, 0, 7));
        assert!(!board.can_place(&bar, -1, 0));

        board.set(4, 5, 3);
        assert!(!board.can_place(&bar, 4, 3));
        assert!(board.can_place(&bar, 4, 6));
    }

    #[test]
    fn test_place_writes_color() {
        let catalog = ShapeCatalog::standard();
        let square = shape(&catalog, "tetromino_o#0");
        let mut board = Board::new();
        let placed = board.place(&square, 2, 3);
        assert_eq!(placed.len(), 4);
        assert_eq!(board.get(2, 3), square.color);
        assert_eq!(board.get(3, 4), square.color);
        assert_eq!(board.occupied_count(), 4);
    }

    #[test]
    fn test_row_clear_detection() {
        let mut board = Board::new();
        for col in 0..8 {
            board.set(0, col, 1);
        }
        assert!(board.find_clears().is_empty());

        board.set(0, 8, 1);
        let clears = board.find_clears();
        assert_eq!(clears.rows, vec![0]);
        assert!(clears.cols.is_empty());
        assert!(clears.boxes.is_empty());
        assert_eq!(clears.cells.len(), 9);

        board.clear(&clears.cells);
        assert_eq!(board.get(0, 0), 0);
        assert_eq!(board.occupied_count(), 0);
    }

    #[test]
    fn test_overlapping_groups_union_cells() {
        let mut board = Board::new();
        for i in 0..BOARD_SIZE {
            board.set(0, i, 1);
            board.set(i, 0, 1);
        }
        for p in box_points(0) {
            board.set(p.row as usize, p.col as usize, 1);
        }
        let clears = board.find_clears();
        assert_eq!(clears.rows, vec![0]);
        assert_eq!(clears.cols, vec![0]);
        assert_eq!(clears.boxes, vec![0]);
        assert_eq!(clears.group_count(), 3);
        // 9 + 9 - 1 for the row/column, plus the 4 box cells off both lines.
        assert_eq!(clears.cells.len(), 21);
        let mut sorted = clears.cells.clone();
        sorted.sort();
        assert_eq!(sorted, clears.cells);
    }

    #[test]
    fn test_box_numbering() {
        let mut board = Board::new();
        for p in box_points(5) {
            board.set(p.row as usize, p.col as usize, 2);
        }
        assert!(board.is_box_full(5));
        assert_eq!(board.get(3, 6), 2);
        assert_eq!(board.get(5, 8), 2);
        assert_eq!(board.find_clears().boxes, vec![5]);
    }

    #[test]
    fn test_fits_anywhere() {
        let catalog = ShapeCatalog::standard();
        let mono = shape(&catalog, "mono#0");
        let square = shape(&catalog, "square_3#0");
        let mut board = Board::from_cells(vec![1; CELL_COUNT]).unwrap();
        assert!(!board.fits_anywhere(&mono));
        board.set(8, 8, 0);
        assert!(board.fits_anywhere(&mono));
        assert!(!board.fits_anywhere(&square));
    }

    #[test]
    fn test_from_cells_rejects_wrong_length() {
        assert!(Board::from_cells(vec![0; 80]).is_err());
    }

    #[test]
    fn test_empty_cells_row_major() {
        let mut board = Board::from_cells(vec![1; CELL_COUNT]).unwrap();
        board.set(7, 2, 0);
        board.set(1, 8, 0);
        let empties: Vec<Point> = board.empty_cells().collect();
        assert_eq!(empties, vec![Point::new(1, 8), Point::new(7, 2)]);
    }
}
