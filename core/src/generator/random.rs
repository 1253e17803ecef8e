use super::*;

/// Places mines by sampling uniformly over every cell and resampling on collision, which yields a uniformly random
/// subset of the requested size.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMineGenerator {
    seed: u64,
}

impl RandomMineGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl MineGenerator for RandomMineGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;

        let total_cells = config.total_cells();
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());

        // terminates because at least one cell stays safe
        if config.mines < total_cells {
            let mut rng = SmallRng::seed_from_u64(self.seed);
            let cells = mines
                .as_slice_memory_order_mut()
                .expect("freshly allocated array is contiguous");
            let mut mines_placed = 0;
            while mines_placed < config.mines {
                let place = rng.random_range(0..cells.len());
                if !cells[place] {
                    cells[place] = true;
                    mines_placed += 1;
                }
            }
        } else {
            log::warn!(
                "Refusing to fill board, requested {} mines but only {} cells",
                config.mines,
                total_cells
            );
        }

        let layout = MineLayout::from_mine_mask(mines);
        log::debug!(
            "Generated {}x{} layout with {} mines from seed {}",
            config.size.0,
            config.size.1,
            layout.mine_count(),
            self.seed
        );
        layout
    }
}
