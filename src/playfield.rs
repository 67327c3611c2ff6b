//! Playfield grid and next-piece preview box.
//!
//! The grid is the single source of truth for occupancy. Row 0 is the top border, row
//! `FRAME_HEIGHT` the bottom border; the two outermost columns on each side are border too.
//! Every logical column is `EXPANSION` grid cells wide so blocks look square in a terminal.

use crate::piece::{PieceKind, Rotation};

/// Grid cells per logical column.
pub const EXPANSION: i32 = 2;

/// Frame size: 10 and 9 logical units scaled by 2.3, truncated.
pub const FRAME_WIDTH: usize = 23;
pub const FRAME_HEIGHT: usize = 20;

pub const GRID_WIDTH: usize = FRAME_WIDTH + 1;
pub const GRID_HEIGHT: usize = FRAME_HEIGHT + 1;

/// First and last interior columns.
pub const LEFT_WALL: usize = 2;
pub const RIGHT_WALL: usize = FRAME_WIDTH - 2;

/// Preview box size.
pub const PREVIEW_WIDTH: usize = 16;
pub const PREVIEW_HEIGHT: usize = 6;

/// A single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(PieceKind),
    Border,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Grid cells covered by `kind` in `rotation` anchored at (`row`, `col`).
pub fn footprint(
    row: i32,
    col: i32,
    kind: PieceKind,
    rotation: Rotation,
) -> impl Iterator<Item = (i32, i32)> {
    kind.cells(rotation).iter().flat_map(move |&(dr, dc)| {
        (0..EXPANSION).map(move |j| (row + dr, col + dc * EXPANSION + j))
    })
}

/// The board.
#[derive(Debug, Clone)]
pub struct Playfield {
    cells: [[Cell; GRID_WIDTH]; GRID_HEIGHT],
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new()
    }
}

impl Playfield {
    /// Empty interior surrounded by border.
    pub fn new() -> Self {
        let mut cells = [[Cell::Empty; GRID_WIDTH]; GRID_HEIGHT];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if is_border(y, x) {
                    *cell = Cell::Border;
                }
            }
        }
        Self { cells }
    }

    /// Cell at (`row`, `col`); `None` outside the grid.
    #[inline]
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; GRID_WIDTH]> {
        self.cells.iter()
    }

    /// True if any cell of the piece at the hypothetical anchor lands on a non-empty cell.
    /// Cells outside the grid count as occupied.
    pub fn collides(&self, row: i32, col: i32, kind: PieceKind, rotation: Rotation) -> bool {
        footprint(row, col, kind, rotation)
            .any(|(y, x)| !self.get(y, x).is_some_and(Cell::is_empty))
    }

    /// Writes the piece's colour into its cells.
    pub fn place(&mut self, row: i32, col: i32, kind: PieceKind, rotation: Rotation) {
        for (y, x) in footprint(row, col, kind, rotation) {
            self.write(y, x, Cell::Block(kind));
        }
    }

    /// Empties the piece's cells.
    pub fn clear(&mut self, row: i32, col: i32, kind: PieceKind, rotation: Rotation) {
        for (y, x) in footprint(row, col, kind, rotation) {
            self.write(y, x, Cell::Empty);
        }
    }

    /// Border cells are never overwritten; out-of-grid writes are dropped.
    fn write(&mut self, row: i32, col: i32, value: Cell) {
        if row < 0 || col < 0 {
            return;
        }
        if let Some(cell) = self
            .cells
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        {
            if *cell != Cell::Border {
                *cell = value;
            }
        }
    }

    /// Every border cell still holds the border marker.
    pub fn border_intact(&self) -> bool {
        self.cells.iter().enumerate().all(|(y, row)| {
            row.iter()
                .enumerate()
                .all(|(x, c)| !is_border(y, x) || *c == Cell::Border)
        })
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.cells[row][LEFT_WALL..=RIGHT_WALL]
            .iter()
            .all(|c| !c.is_empty())
    }

    /// Removes every full interior row, shifting the rows above it down by one and emptying the
    /// top interior row. Scans top to bottom. Returns the number of rows removed.
    pub fn clear_full_lines(&mut self) -> u32 {
        let mut cleared = 0;
        for row in 1..FRAME_HEIGHT {
            if !self.is_row_full(row) {
                continue;
            }
            cleared += 1;
            for k in (1..row).rev() {
                let above = self.cells[k];
                self.cells[k + 1][LEFT_WALL..=RIGHT_WALL]
                    .copy_from_slice(&above[LEFT_WALL..=RIGHT_WALL]);
            }
            self.cells[1][LEFT_WALL..=RIGHT_WALL].fill(Cell::Empty);
        }
        cleared
    }

    /// Fills the interior cells of `row` except the listed columns.
    #[cfg(test)]
    pub fn fill_row_except(&mut self, row: usize, gaps: &[usize], kind: PieceKind) {
        for x in LEFT_WALL..=RIGHT_WALL {
            if !gaps.contains(&x) {
                self.cells[row][x] = Cell::Block(kind);
            }
        }
    }
}

fn is_border(row: usize, col: usize) -> bool {
    row == 0
        || row == FRAME_HEIGHT
        || col < LEFT_WALL
        || col > RIGHT_WALL
}

/// Next-piece preview box.
#[derive(Debug, Clone)]
pub struct NextBox {
    cells: [[Cell; PREVIEW_WIDTH]; PREVIEW_HEIGHT],
}

impl NextBox {
    pub fn new(kind: PieceKind) -> Self {
        let mut cells = [[Cell::Empty; PREVIEW_WIDTH]; PREVIEW_HEIGHT];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if y == 0 || y == PREVIEW_HEIGHT - 1 || x < 2 || x >= PREVIEW_WIDTH - 2 {
                    *cell = Cell::Border;
                }
            }
        }
        let mut next_box = Self { cells };
        next_box.show(kind);
        next_box
    }

    /// Wipes the interior and draws `kind` in its display rotation.
    pub fn show(&mut self, kind: PieceKind) {
        for row in &mut self.cells[1..PREVIEW_HEIGHT - 1] {
            row[2..PREVIEW_WIDTH - 2].fill(Cell::Empty);
        }
        let (rotation, nudge_row, nudge_col) = kind.preview_layout();
        for (y, x) in footprint(2 + nudge_row, 4 + nudge_col, kind, rotation) {
            self.cells[y as usize][x as usize] = Cell::Block(kind);
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; PREVIEW_WIDTH]> {
        self.cells.iter()
    }
}
