use maze_ngin::maze::{self, Cell, CellPos};

use crate::common::test_utils::seeded;

mod common;

#[test]
fn same_seed_reproduces_the_same_maze() {
    let first = maze::generate(15, 15, 15, &mut seeded(1234)).unwrap();
    let second = maze::generate(15, 15, 15, &mut seeded(1234)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.grid.to_string(), second.grid.to_string());
    assert_eq!((first.start, first.exit), (second.start, second.exit));
}

#[test]
fn different_seeds_produce_different_layouts() {
    let reference = maze::generate(15, 15, 15, &mut seeded(0)).unwrap();
    let differs = (1..10).any(|seed| maze::generate(15, 15, 15, &mut seeded(seed)).unwrap() != reference);
    assert!(differs);
}

#[test]
fn generated_grids_keep_their_invariants() {
    for seed in 0..50 {
        for density in [0, 1, 3, 15] {
            let maze = maze::generate(15, 11, density, &mut seeded(seed)).unwrap();
            let grid = &maze.grid;
            let mut starts = 0;
            let mut exits = 0;
            for (pos, cell) in grid.iter() {
                if grid.is_border(pos) {
                    assert_eq!(cell, Cell::Wall, "border cell {pos:?} is open");
                }
                starts += usize::from(cell == Cell::Start);
                exits += usize::from(cell == Cell::Exit);
            }
            assert_eq!((starts, exits), (1, 1));
            assert_ne!(maze.start, maze.exit);
            assert_eq!(grid.get(maze.start), Some(Cell::Start));
            assert_eq!(grid.get(maze.exit), Some(Cell::Exit));
        }
    }
}

#[test]
fn grids_without_room_for_two_cells_are_rejected() {
    assert!(maze::generate(3, 3, 15, &mut seeded(0)).is_err());
    assert!(maze::generate(2, 40, 15, &mut seeded(0)).is_err());
    let smallest = maze::generate(4, 3, 0, &mut seeded(0)).unwrap();
    let free: Vec<CellPos> = smallest
        .grid
        .iter()
        .filter(|(_, c)| !c.is_wall())
        .map(|(p, _)| p)
        .collect();
    assert_eq!(free.len(), 2);
}
