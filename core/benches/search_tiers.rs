//! Path search and move analysis on freshly dealt boards of each difficulty.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tilepair_core::*;

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for difficulty in Difficulty::ALL {
        let board = difficulty.onet().board;
        let grid = RandomBoardGenerator::new(7).generate(board);
        let tiles = grid.tiles();
        let pairs: Vec<(Pos, Pos)> = tiles
            .iter()
            .enumerate()
            .flat_map(|(i, &a)| tiles[i + 1..].iter().map(move |&b| (a, b)))
            .take(512)
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(difficulty),
            &pairs,
            |b, pairs| {
                b.iter(|| {
                    for &(start, end) in pairs {
                        black_box(find_path(&grid, start, end));
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("moves");
    for difficulty in Difficulty::ALL {
        let grid = RandomBoardGenerator::new(7).generate(difficulty.onet().board);

        group.bench_with_input(
            BenchmarkId::new("has_any_move", difficulty),
            &grid,
            |b, grid| b.iter(|| black_box(has_any_move(grid))),
        );
        group.bench_with_input(
            BenchmarkId::new("all_moves", difficulty),
            &grid,
            |b, grid| b.iter(|| black_box(all_moves(grid))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_find_path, bench_moves);
criterion_main!(benches);
