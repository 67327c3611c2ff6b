//! Piece catalog: seven tetromino kinds, four rotation states each, plus preview-box nudges.

/// Offsets of one rotation state: four (row, column) pairs relative to the anchor.
pub type Cells = [(i32, i32); 4];

/// Tetromino kinds in catalog order (O, I, L, J, S, Z, T).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    O,
    I,
    L,
    J,
    S,
    Z,
    T,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::O, Self::I, Self::L, Self::J, Self::S, Self::Z, Self::T];

    /// Kind for a catalog index in `0..=6`. Out-of-range indices wrap.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind for its letter, case-insensitive.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'O' => Some(Self::O),
            'I' => Some(Self::I),
            'L' => Some(Self::L),
            'J' => Some(Self::J),
            'S' => Some(Self::S),
            'Z' => Some(Self::Z),
            'T' => Some(Self::T),
            _ => None,
        }
    }

    /// The fixed four cells for `rotation`.
    pub fn cells(self, rotation: Rotation) -> &'static Cells {
        &SHAPES[self.index()][rotation.index()]
    }

    /// Rotation and (row, column) nudge used to centre the kind in the preview box.
    pub fn preview_layout(self) -> (Rotation, i32, i32) {
        match self {
            Self::O => (Rotation::new(0), 0, 2),
            Self::I => (Rotation::new(0), -1, 0),
            Self::L => (Rotation::new(1), -1, 1),
            Self::J | Self::S => (Rotation::new(0), -1, 1),
            Self::Z | Self::T => (Rotation::new(0), 0, 1),
        }
    }
}

/// Rotation state index, always in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotation(u8);

impl Rotation {
    pub fn new(index: u8) -> Self {
        Self(index % 4)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 0 → 1 → 2 → 3 → 0.
    pub fn next(self) -> Self {
        Self((self.0 + 1) % 4)
    }

    /// 0 → 3 → 2 → 1 → 0.
    pub fn prev(self) -> Self {
        Self((self.0 + 3) % 4)
    }
}

const SHAPES: [[Cells; 4]; 7] = [
    // O
    [
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
        [(0, 0), (1, 0), (0, 1), (1, 1)],
    ],
    // I
    [
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
        [(1, 0), (1, 1), (1, 2), (1, 3)],
        [(0, 1), (1, 1), (2, 1), (3, 1)],
    ],
    // L
    [
        [(0, 1), (1, 1), (2, 1), (2, 2)],
        [(1, 0), (1, 1), (1, 2), (2, 0)],
        [(0, 0), (0, 1), (1, 1), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (0, 2)],
    ],
    // J
    [
        [(1, 0), (1, 1), (1, 2), (2, 2)],
        [(0, 2), (1, 2), (2, 2), (2, 1)],
        [(0, 0), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (0, 2), (1, 1), (2, 1)],
    ],
    // S
    [
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
        [(1, 1), (1, 2), (2, 0), (2, 1)],
        [(0, 1), (1, 1), (1, 2), (2, 2)],
    ],
    // Z
    [
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 2), (1, 1), (2, 1), (1, 2)],
        [(0, 0), (0, 1), (1, 1), (1, 2)],
        [(0, 2), (1, 1), (2, 1), (1, 2)],
    ],
    // T
    [
        [(0, 1), (1, 0), (1, 1), (1, 2)],
        [(0, 1), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (1, 1), (1, 2), (2, 1)],
        [(1, 0), (0, 1), (1, 1), (2, 1)],
    ],
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_cells_are_distinct_in_every_state() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                let cells = kind.cells(Rotation::new(r));
                let unique: HashSet<_> = cells.iter().collect();
                assert_eq!(unique.len(), 4, "{kind:?} rotation {r} overlaps itself");
            }
        }
    }

    #[test]
    fn test_rotation_cycles_close() {
        for r in 0..4 {
            let start = Rotation::new(r);
            assert_eq!(start.next().next().next().next(), start);
            assert_eq!(start.prev().prev().prev().prev(), start);
            assert_eq!(start.next().prev(), start);
        }
        assert_eq!(Rotation::new(3).next(), Rotation::new(0));
        assert_eq!(Rotation::new(0).prev(), Rotation::new(3));
    }

    #[test]
    fn test_index_and_letter_lookup() {
        for (i, kind) in PieceKind::ALL.iter().enumerate() {
            assert_eq!(PieceKind::from_index(i), *kind);
            assert_eq!(kind.index(), i);
        }
        assert_eq!(PieceKind::from_index(1), PieceKind::I);
        assert_eq!(PieceKind::from_letter('t'), Some(PieceKind::T));
        assert_eq!(PieceKind::from_letter('Z'), Some(PieceKind::Z));
        assert_eq!(PieceKind::from_letter('x'), None);
    }

    #[test]
    fn test_offsets_fit_in_four_by_four_box() {
        for kind in PieceKind::ALL {
            for r in 0..4 {
                for &(dr, dc) in kind.cells(Rotation::new(r)) {
                    assert!((0..4).contains(&dr) && (0..4).contains(&dc));
                }
            }
        }
    }
}
