/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u16;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u32;

/// Two-dimensional coordinates `(x, y)`, column first.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Converts caller-supplied signed coordinates into board coordinates, `None` when outside `bounds`.
pub fn checked_coords(x: i32, y: i32, bounds: Coord2) -> Option<Coord2> {
    let x = Coord::try_from(x).ok()?;
    let y = Coord::try_from(y).ok()?;
    (x < bounds.0 && y < bounds.1).then_some((x, y))
}

/// Yields the in-bounds neighbors of `center` row by row, at most eight.
///
/// Walks the 3x3 window around `center`; `window` is the position inside it, 4 being the center itself.
#[derive(Debug)]
pub struct NeighborIter {
    center: (i32, i32),
    bounds: Coord2,
    window: u8,
}

impl NeighborIter {
    const CENTER: u8 = 4;
    const END: u8 = 9;

    pub fn new((x, y): Coord2, bounds: Coord2) -> Self {
        Self {
            center: (i32::from(x), i32::from(y)),
            bounds,
            window: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while self.window < Self::END {
            let window = self.window;
            self.window += 1;
            if window == Self::CENTER {
                continue;
            }

            let (dx, dy) = (i32::from(window % 3) - 1, i32::from(window / 3) - 1);
            let neighbor = checked_coords(self.center.0 + dx, self.center.1 + dy, self.bounds);
            if neighbor.is_some() {
                return neighbor;
            }
        }
        None
    }
}
