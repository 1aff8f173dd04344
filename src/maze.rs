//! Procedural maze generation.
//!
//! A maze is a rectangular occupancy grid. Interior cells are filled at random
//! (each cell draws from `0..=density_range`, a zero makes it a wall), the outer
//! ring is always wall, and two distinct free cells are chosen as start and exit.
//! The result is a pure function of the random stream handed to [`generate`].

use std::fmt;

use cgmath::Vector3;
use rand::Rng;
use thiserror::Error;

/// Rejection sampling retries before falling back to enumerating the free cells.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1024;

/// World-space height of the floor tile centres; walls sit one unit above.
pub const FLOOR_Y: f32 = 0.0;
pub const WALL_Y: f32 = FLOOR_Y + 1.0;
/// Height of the top face of a floor tile (unit cubes centred on the tile).
pub const FLOOR_TOP: f32 = FLOOR_Y + 0.5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MazeError {
    #[error("a {width}x{height} maze has no room for distinct start and exit cells")]
    TooSmall { width: usize, height: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Wall,
    Floor,
    Start,
    Exit,
}

impl Cell {
    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub x: usize,
    pub y: usize,
}

impl CellPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Centre of the cell in world space at height `y`. Grid rows run along +z.
    pub fn to_world(self, y: f32) -> Vector3<f32> {
        Vector3::new(self.x as f32, y, self.y as f32)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeGrid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl MazeGrid {
    fn filled(width: usize, height: usize, cell: Cell) -> Self {
        Self {
            width,
            height,
            cells: vec![cell; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, pos: CellPos) -> Option<Cell> {
        if pos.x < self.width && pos.y < self.height {
            Some(self.cells[pos.y * self.width + pos.x])
        } else {
            None
        }
    }

    fn set(&mut self, pos: CellPos, cell: Cell) {
        self.cells[pos.y * self.width + pos.x] = cell;
    }

    pub fn is_border(&self, pos: CellPos) -> bool {
        pos.x == 0 || pos.y == 0 || pos.x + 1 == self.width || pos.y + 1 == self.height
    }

    /// All cells in row-major order with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (CellPos::new(i % self.width, i / self.width), *cell))
    }

    fn interior(&self) -> impl Iterator<Item = CellPos> + '_ {
        (1..self.height - 1).flat_map(move |y| (1..self.width - 1).map(move |x| CellPos::new(x, y)))
    }
}

impl fmt::Display for MazeGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width) {
            for cell in row {
                let c = match cell {
                    Cell::Wall => '#',
                    Cell::Floor => '.',
                    Cell::Start => 'S',
                    Cell::Exit => 'E',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    pub grid: MazeGrid,
    pub start: CellPos,
    pub exit: CellPos,
}

impl Maze {
    /// One floor tile per cell, walls included.
    pub fn floor_positions(&self) -> Vec<Vector3<f32>> {
        self.grid.iter().map(|(pos, _)| pos.to_world(FLOOR_Y)).collect()
    }

    pub fn wall_positions(&self) -> Vec<Vector3<f32>> {
        self.grid
            .iter()
            .filter(|(_, cell)| cell.is_wall())
            .map(|(pos, _)| pos.to_world(WALL_Y))
            .collect()
    }

    /// The free cell closest to the grid centre, preferring plain floor over start/exit.
    pub fn central_free_cell(&self) -> CellPos {
        let cx = (self.grid.width as f32 - 1.0) * 0.5;
        let cy = (self.grid.height as f32 - 1.0) * 0.5;
        let score = |(pos, cell): &(CellPos, Cell)| {
            let d = (pos.x as f32 - cx).powi(2) + (pos.y as f32 - cy).powi(2);
            let penalty = if *cell == Cell::Floor { 0.0 } else { 1.0e6 };
            d + penalty
        };
        self.grid
            .iter()
            .filter(|(_, cell)| !cell.is_wall())
            .min_by(|a, b| score(a).total_cmp(&score(b)))
            .map(|(pos, _)| pos)
            .unwrap_or(self.start)
    }
}

/// Generate a `width` x `height` maze.
///
/// Every interior cell draws uniformly from `0..=density_range` and becomes a wall on
/// zero, so `density_range == 15` yields roughly one wall in sixteen cells. A
/// `density_range` of zero produces a solid interior; start and exit cells are then
/// carved out of it.
pub fn generate<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    density_range: u32,
    rng: &mut R,
) -> Result<Maze, MazeError> {
    if width < 3 || height < 3 || (width - 2) * (height - 2) < 2 {
        return Err(MazeError::TooSmall { width, height });
    }

    let mut grid = MazeGrid::filled(width, height, Cell::Wall);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let cell = if rng.gen_range(0..=density_range) == 0 {
                Cell::Wall
            } else {
                Cell::Floor
            };
            grid.set(CellPos::new(x, y), cell);
        }
    }

    let start = place(&mut grid, None, rng);
    grid.set(start, Cell::Start);
    let exit = place(&mut grid, Some(start), rng);
    grid.set(exit, Cell::Exit);

    Ok(Maze { grid, start, exit })
}

fn place<R: Rng + ?Sized>(grid: &mut MazeGrid, exclude: Option<CellPos>, rng: &mut R) -> CellPos {
    let usable = |grid: &MazeGrid, pos: CellPos| {
        grid.get(pos).is_some_and(|cell| !cell.is_wall()) && Some(pos) != exclude
    };

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let pos = CellPos::new(
            rng.gen_range(1..grid.width - 1),
            rng.gen_range(1..grid.height - 1),
        );
        if usable(grid, pos) {
            return pos;
        }
    }

    let view: &MazeGrid = grid;
    let free: Vec<CellPos> = view.interior().filter(|pos| usable(view, *pos)).collect();
    if !free.is_empty() {
        return free[rng.gen_range(0..free.len())];
    }

    // Solid interior: carve a cell. The size check guarantees one besides `exclude`.
    let candidates: Vec<CellPos> = grid.interior().filter(|pos| Some(*pos) != exclude).collect();
    let pos = candidates[rng.gen_range(0..candidates.len())];
    log::warn!("maze interior is solid, carving a free cell at {pos:?}");
    grid.set(pos, Cell::Floor);
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn assert_invariants(maze: &Maze) {
        let grid = &maze.grid;
        for (pos, cell) in grid.iter() {
            if grid.is_border(pos) {
                assert_eq!(cell, Cell::Wall, "border cell {pos:?} is not a wall");
            }
        }
        assert_eq!(grid.iter().filter(|(_, c)| *c == Cell::Start).count(), 1);
        assert_eq!(grid.iter().filter(|(_, c)| *c == Cell::Exit).count(), 1);
        assert_ne!(maze.start, maze.exit);
        assert_eq!(grid.get(maze.start), Some(Cell::Start));
        assert_eq!(grid.get(maze.exit), Some(Cell::Exit));
    }

    #[test]
    fn invariants_hold_across_seeds_and_densities() {
        for seed in 0..50 {
            for density in [0, 1, 2, 15, 100] {
                let mut rng = StdRng::seed_from_u64(seed);
                let maze = generate(9 + seed as usize % 7, 7, density, &mut rng).unwrap();
                assert_invariants(&maze);
            }
        }
    }

    #[test]
    fn solid_interior_still_gets_start_and_exit() {
        let mut rng = StdRng::seed_from_u64(3);
        let maze = generate(5, 5, 0, &mut rng).unwrap();
        assert_invariants(&maze);
        let free = maze.grid.iter().filter(|(_, c)| !c.is_wall()).count();
        assert_eq!(free, 2);
    }

    #[test]
    fn smallest_valid_interior_is_two_cells() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate(4, 3, 15, &mut rng).is_ok());
        assert_eq!(
            generate(3, 3, 15, &mut rng),
            Err(MazeError::TooSmall { width: 3, height: 3 })
        );
        assert!(generate(2, 10, 15, &mut rng).is_err());
    }

    #[test]
    fn wall_tiles_sit_one_unit_above_floor() {
        let mut rng = StdRng::seed_from_u64(11);
        let maze = generate(6, 6, 15, &mut rng).unwrap();
        assert_eq!(maze.floor_positions().len(), 36);
        let walls = maze.wall_positions();
        assert!(walls.len() >= 20);
        assert!(walls.iter().all(|p| p.y == FLOOR_Y + 1.0));
    }

    #[test]
    fn central_cell_is_free() {
        let mut rng = StdRng::seed_from_u64(5);
        let maze = generate(15, 15, 15, &mut rng).unwrap();
        let centre = maze.central_free_cell();
        assert!(!maze.grid.get(centre).unwrap().is_wall());
    }

    #[test]
    fn display_draws_one_row_per_line() {
        let mut rng = StdRng::seed_from_u64(1);
        let maze = generate(5, 4, 15, &mut rng).unwrap();
        let text = maze.grid.to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().all(|l| l.len() == 5));
        assert!(text.contains('S') && text.contains('E'));
    }
}
