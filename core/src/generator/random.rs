use alloc::vec::Vec;

use super::*;

/// Generation strategy that lays out palette pairs and shuffles them uniformly over the interior.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomBoardGenerator {
    seed: u64,
}

impl RandomBoardGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl BoardGenerator for RandomBoardGenerator {
    fn generate(self, config: BoardConfig) -> Grid {
        use rand::prelude::*;

        let mut tiles: Vec<Kind> = (0..config.pair_count())
            .flat_map(|pair| {
                let kind = palette_kind(pair);
                [kind, kind]
            })
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        tiles.shuffle(&mut rng);

        let mut grid = Grid::empty(config);
        let mut tiles = tiles.into_iter();
        for y in 1..=config.rows {
            for x in 1..=config.cols {
                if let Some(kind) = tiles.next() {
                    grid[(x, y)] = kind;
                }
            }
        }

        // double check tile count
        let count = grid.tile_count();
        if count != config.total_tiles() {
            log::warn!(
                "Generated board tile count mismatch, actual: {}, requested: {}",
                count,
                config.total_tiles()
            );
        }
        grid
    }
}
