use crate::algo::astar::AStar;
use crate::error::RouteError;
use crate::grid::{DenseGrid, PinReservations, RoutingGrid};
use gridroute_common::db::core::Design;
use gridroute_common::db::indices::NetId;
use gridroute_common::util::config::RouterConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

/// Mixes a base seed with an attempt index into a fresh per-attempt
/// seed, so each attempt's shuffle is deterministic given `(seed,
/// attempt)` without the mutable global-PRNG-advancement the reference
/// implementation relied on. Standard splitmix64 finalizer.
fn attempt_seed(seed: u64, attempt: usize) -> u64 {
    let mut z = seed
        .wrapping_add(attempt as u64)
        .wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// One attempt: clears every net's route/occupancy, shuffles the net
/// order with `rng`, and routes each net serially in that order. Returns
/// `Ok(())` if every net routed, or the first `RouteError` encountered
/// (the caller abandons the whole attempt on failure, never partially).
fn run_attempt(design: &mut Design, grid: &mut DenseGrid, rng: &mut StdRng) -> Result<(), RouteError> {
    for net in &mut design.nets {
        grid.clear_path(&net.route);
        net.clear_route();
    }

    let mut order: Vec<usize> = (0..design.nets.len()).collect();
    order.shuffle(rng);

    // Pin positions don't change across attempts, only occupancy does,
    // so the reservation bitmap can be rebuilt once per attempt from the
    // (always-unrouted-at-this-point) net list.
    let reservations = PinReservations::build(design);
    let mut astar = AStar::new(grid.width(), grid.height());

    for idx in order {
        let net_id = NetId::new(idx);
        crate::single_net_router::route_net(
            grid,
            &mut design.nets[idx],
            net_id,
            &reservations,
            &mut astar,
        )?;
    }

    Ok(())
}

/// Routes every net in `design`, retrying up to `config.max_attempts`
/// times with a reshuffled net order on failure. Single-threaded: each
/// attempt reuses the same `Grid` and is fully reset before the next.
///
/// Determinism: the same `design` and `config.seed` always produce the
/// same sequence of attempts and therefore the same final result.
pub fn route_all_nets(design: &mut Design, config: &RouterConfig) -> Result<(), RouteError> {
    log::info!(
        "Starting route-all-nets: {} nets on a {}x{} grid, max_attempts={}",
        design.nets.len(),
        design.width,
        design.height,
        config.max_attempts
    );

    let mut grid = DenseGrid::from_design(design);

    for attempt in 0..config.max_attempts {
        let mut rng = StdRng::seed_from_u64(attempt_seed(config.seed, attempt));
        match run_attempt(design, &mut grid, &mut rng) {
            Ok(()) => {
                log::info!("Routing succeeded on attempt {}/{}", attempt + 1, config.max_attempts);
                return Ok(());
            }
            Err(RouteError::UnroutableNet { net }) => {
                log::warn!(
                    "Attempt {}/{} abandoned: net '{}' unroutable",
                    attempt + 1,
                    config.max_attempts,
                    net
                );
            }
            Err(other) => return Err(other),
        }
    }

    log::error!("All {} attempt(s) exhausted", config.max_attempts);
    Err(RouteError::AttemptsExhausted {
        attempts: config.max_attempts,
    })
}

/// Parallel-attempts variant: runs batches of independent attempts
/// concurrently, each against its own cloned `Design` and freshly built
/// `Grid` (never sharing mutable grid state across threads, per the
/// concurrency model), and returns the first successful attempt's
/// `Design`. Among attempts that succeed within the same batch, the one
/// with the lowest attempt index wins, so results stay reproducible even
/// though wall-clock scheduling isn't.
///
/// Trades determinism of *which* attempt is reported (multiple may
/// succeed in the same batch) for wall-clock speed; `route_all_nets` is
/// the only path with full single-threaded reproducibility.
pub fn route_all_nets_parallel(design: &Design, config: &RouterConfig) -> Result<Design, RouteError> {
    log::info!(
        "Starting parallel route-all-nets: {} nets, max_attempts={}",
        design.nets.len(),
        config.max_attempts
    );

    let batch_size = rayon::current_num_threads().max(1);
    let attempts: Vec<usize> = (0..config.max_attempts).collect();

    for chunk in attempts.chunks(batch_size) {
        let mut results: Vec<(usize, Option<Design>)> = chunk
            .par_iter()
            .map(|&attempt| {
                let mut candidate = design.clone();
                let mut grid = DenseGrid::from_design(&candidate);
                let mut rng = StdRng::seed_from_u64(attempt_seed(config.seed, attempt));
                match run_attempt(&mut candidate, &mut grid, &mut rng) {
                    Ok(()) => (attempt, Some(candidate)),
                    Err(_) => (attempt, None),
                }
            })
            .collect();

        results.sort_by_key(|(attempt, _)| *attempt);
        if let Some((attempt, winner)) = results.into_iter().find_map(|(a, d)| d.map(|d| (a, d))) {
            log::info!("Parallel routing succeeded on attempt {}", attempt + 1);
            return Ok(winner);
        }
    }

    log::error!("All {} attempt(s) exhausted", config.max_attempts);
    Err(RouteError::AttemptsExhausted {
        attempts: config.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridroute_common::geom::coord::Coordinate;

    fn config(seed: u64, max_attempts: usize) -> RouterConfig {
        RouterConfig {
            bend_penalty: 0,
            via_penalty: 0,
            max_attempts,
            seed,
            parallel: false,
        }
    }

    #[test]
    fn routes_a_single_net_deterministically() {
        let mut design = Design::new(5, 5, 0, 0);
        design.add_pin("n1", Coordinate::new(0, 0, 0));
        design.add_pin("n1", Coordinate::new(0, 3, 0));

        let cfg = config(42, 5);
        route_all_nets(&mut design, &cfg).unwrap();
        assert_eq!(design.nets[0].cost, Some(3));
    }

    #[test]
    fn same_seed_reproduces_the_same_route() {
        let make = || {
            let mut design = Design::new(8, 8, 1, 1);
            design.add_pin("a", Coordinate::new(0, 0, 0));
            design.add_pin("a", Coordinate::new(0, 7, 7));
            design.add_pin("b", Coordinate::new(0, 7, 0));
            design.add_pin("b", Coordinate::new(0, 0, 7));
            design
        };
        let cfg = config(7, 10);

        let mut d1 = make();
        route_all_nets(&mut d1, &cfg).unwrap();
        let mut d2 = make();
        route_all_nets(&mut d2, &cfg).unwrap();

        for (n1, n2) in d1.nets.iter().zip(d2.nets.iter()) {
            assert_eq!(n1.route, n2.route);
            assert_eq!(n1.cost, n2.cost);
        }
    }

    #[test]
    fn disjoint_routes_for_two_nets() {
        let mut design = Design::new(10, 10, 0, 0);
        design.add_pin("a", Coordinate::new(0, 0, 5));
        design.add_pin("a", Coordinate::new(0, 9, 5));
        design.add_pin("b", Coordinate::new(0, 5, 0));
        design.add_pin("b", Coordinate::new(0, 5, 9));

        let cfg = config(1, 10);
        route_all_nets(&mut design, &cfg).unwrap();

        let mut seen = std::collections::HashSet::new();
        for net in &design.nets {
            for c in &net.route {
                assert!(seen.insert(*c), "cell {c} claimed by two nets");
            }
        }
    }

    #[test]
    fn reports_attempts_exhausted_when_nets_cannot_coexist() {
        // A wall at y=1 blocked on both layers except a single gap cell
        // at (layer 0, x=1, y=1); two nets on either side of the wall
        // both need that one cell to cross, so no shuffle can route both.
        let mut design = Design::new(3, 3, 0, 0);
        for c in [
            Coordinate::new(0, 0, 1),
            Coordinate::new(0, 2, 1),
            Coordinate::new(1, 0, 1),
            Coordinate::new(1, 1, 1),
            Coordinate::new(1, 2, 1),
        ] {
            design.add_obstacle(c);
        }
        design.add_pin("a", Coordinate::new(0, 0, 0));
        design.add_pin("a", Coordinate::new(0, 0, 2));
        design.add_pin("b", Coordinate::new(0, 2, 0));
        design.add_pin("b", Coordinate::new(0, 2, 2));

        let cfg = config(3, 4);
        let result = route_all_nets(&mut design, &cfg);
        assert!(matches!(
            result,
            Err(RouteError::AttemptsExhausted { attempts: 4 })
        ));
    }

    #[test]
    fn crossing_nets_still_resolve_to_disjoint_routes() {
        // Net `a` runs straight through row y=1; net `b` crosses that row
        // vertically at x=2, contending for the same cell whichever net
        // routes first. Whichever net loses the contended cell has a via
        // escape onto the other layer, so the attempt loop succeeds and
        // both routes come out disjoint.
        let mut design = Design::new(6, 3, 0, 0);
        design.add_pin("a", Coordinate::new(0, 0, 1));
        design.add_pin("a", Coordinate::new(0, 5, 1));
        design.add_pin("b", Coordinate::new(0, 2, 0));
        design.add_pin("b", Coordinate::new(0, 2, 2));

        let cfg = config(11, 20);
        let result = route_all_nets(&mut design, &cfg);
        assert!(result.is_ok());

        let mut seen = std::collections::HashSet::new();
        for net in &design.nets {
            for c in &net.route {
                assert!(seen.insert(*c));
            }
        }
    }
}
