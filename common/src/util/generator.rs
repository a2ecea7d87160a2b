use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::Write;

/// Emits a random, internally valid input file in the plain-text routing
/// format: header, obstacles, then nets with 2..=`max_pins_per_net` pins
/// each. Obstacles and pins are placed so that no net's own pins collide
/// with an obstacle or with each other, but two different nets' pins may
/// legally land on the same cell's neighbourhood (routing itself decides
/// who gets there first).
pub fn generate_random_design(
    filename: &str,
    width: u32,
    height: u32,
    bend_penalty: u32,
    via_penalty: u32,
    num_obstacles: usize,
    num_nets: usize,
    max_pins_per_net: usize,
    seed: u64,
) -> std::io::Result<()> {
    let mut file = File::create(filename)?;
    let mut rng = StdRng::seed_from_u64(seed);

    log::info!(
        "Generating random design: {}x{} grid, {} obstacles, {} nets (seed={})",
        width,
        height,
        num_obstacles,
        num_nets,
        seed
    );

    writeln!(file, "{},{},{},{}", width, height, bend_penalty, via_penalty)?;

    let mut used = std::collections::HashSet::new();
    let mut random_cell = |rng: &mut StdRng| -> (u8, u32, u32) {
        (rng.gen_range(0..2), rng.gen_range(0..width), rng.gen_range(0..height))
    };

    for _ in 0..num_obstacles {
        let mut cell = random_cell(&mut rng);
        while !used.insert(cell) {
            cell = random_cell(&mut rng);
        }
        writeln!(file, "OBS({},{},{})", cell.0, cell.1, cell.2)?;
    }

    for i in 0..num_nets {
        let pin_count = rng.gen_range(2..=max_pins_per_net.max(2));
        let mut pins = Vec::with_capacity(pin_count);
        for _ in 0..pin_count {
            let mut cell = random_cell(&mut rng);
            while used.contains(&cell) {
                cell = random_cell(&mut rng);
            }
            used.insert(cell);
            pins.push(cell);
        }

        write!(file, "net{}", i)?;
        for (layer, x, y) in pins {
            write!(file, " ({},{},{})", layer, x, y)?;
        }
        writeln!(file)?;
    }

    Ok(())
}
