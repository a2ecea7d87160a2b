use crate::grid::{PinReservations, RoutingGrid};
use gridroute_common::db::indices::NetId;
use gridroute_common::geom::coord::Coordinate;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A single open-set entry. `BinaryHeap` is a max-heap, so `Ord` is
/// inverted on `f_score` to make it behave as a min-heap; ties break on
/// ascending `g_score`, then on the packed coordinate so that expansion
/// order (and therefore the path found) is deterministic for a fixed
/// input and seed.
#[derive(Copy, Clone, Eq, PartialEq)]
struct State {
    f_score: u64,
    g_score: u64,
    coord_key: u32,
    index: u32,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| other.coord_key.cmp(&self.coord_key))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One step of a reconstructed path: the A* engine, reused across all of
/// a net's sub-searches via `parents`/`g_score` dense arrays addressed by
/// the same `(layer, y, x)` index as `DenseGrid`, plus a "visited
/// generation" tag so arrays don't need clearing between sub-searches.
pub struct AStar {
    width: u32,
    height: u32,
    parents: Vec<u32>,
    g_score: Vec<u64>,
    visited_tag: Vec<u32>,
    current_tag: u32,
}

const NO_PARENT: u32 = u32::MAX;

impl AStar {
    pub fn new(width: u32, height: u32) -> Self {
        let size = (width as usize) * (height as usize) * 2;
        Self {
            width,
            height,
            parents: vec![NO_PARENT; size],
            g_score: vec![u64::MAX; size],
            visited_tag: vec![0; size],
            current_tag: 0,
        }
    }

    #[inline(always)]
    fn index(&self, c: Coordinate) -> usize {
        (c.layer as usize) * (self.width as usize) * (self.height as usize)
            + (c.y as usize) * (self.width as usize)
            + (c.x as usize)
    }

    #[inline(always)]
    fn coord_at(&self, idx: usize) -> Coordinate {
        let plane = (self.width as usize) * (self.height as usize);
        let layer = (idx / plane) as u8;
        let rem = idx % plane;
        let y = (rem / self.width as usize) as u32;
        let x = (rem % self.width as usize) as u32;
        Coordinate::new(layer, x, y)
    }

    fn next_generation(&mut self) {
        self.current_tag = self.current_tag.wrapping_add(1);
        if self.current_tag == 0 {
            self.visited_tag.fill(0);
            self.current_tag = 1;
        }
    }

    fn heuristic(coord: Coordinate, targets: &[Coordinate]) -> u64 {
        targets
            .iter()
            .map(|t| coord.manhattan(*t) as u64)
            .min()
            .unwrap_or(0)
    }

    /// Runs one A* sub-search: open set seeded from every coordinate in
    /// `sources` at `g = 0`, goal is any coordinate in `targets`. Returns
    /// the reconstructed path from whichever source reached whichever
    /// target first, and its cost, or `None` if the open set empties
    /// first (the net fails).
    pub fn search<G: RoutingGrid + ?Sized>(
        &mut self,
        grid: &G,
        net: NetId,
        reservations: &PinReservations,
        sources: &[Coordinate],
        targets: &[Coordinate],
    ) -> Option<(Vec<Coordinate>, u64)> {
        if sources.is_empty() || targets.is_empty() {
            return None;
        }

        self.next_generation();
        let mut heap = BinaryHeap::new();

        for &s in sources {
            let idx = self.index(s);
            self.g_score[idx] = 0;
            self.visited_tag[idx] = self.current_tag;
            self.parents[idx] = NO_PARENT;
            heap.push(State {
                f_score: Self::heuristic(s, targets),
                g_score: 0,
                coord_key: s.pack(),
                index: idx as u32,
            });
        }

        while let Some(State {
            f_score,
            g_score,
            index,
            ..
        }) = heap.pop()
        {
            // Stale entry: a cheaper path to this cell was already found
            // and pushed after this one.
            if self.visited_tag[index as usize] != self.current_tag
                || self.g_score[index as usize] != g_score
            {
                continue;
            }
            let _ = f_score;

            let pos = self.coord_at(index as usize);
            if targets.contains(&pos) {
                return Some((self.reconstruct_path(index as usize), g_score));
            }

            for (next, step_cost) in grid.neighbours(pos, net, reservations) {
                let next_idx = self.index(next);
                let tentative_g = g_score + step_cost as u64;
                if self.visited_tag[next_idx] != self.current_tag
                    || tentative_g < self.g_score[next_idx]
                {
                    self.visited_tag[next_idx] = self.current_tag;
                    self.g_score[next_idx] = tentative_g;
                    self.parents[next_idx] = index;
                    heap.push(State {
                        f_score: tentative_g + Self::heuristic(next, targets),
                        g_score: tentative_g,
                        coord_key: next.pack(),
                        index: next_idx as u32,
                    });
                }
            }
        }

        None
    }

    fn reconstruct_path(&self, goal_idx: usize) -> Vec<Coordinate> {
        let mut path = Vec::new();
        let mut idx = goal_idx as u32;
        loop {
            path.push(self.coord_at(idx as usize));
            let parent = self.parents[idx as usize];
            if parent == NO_PARENT {
                break;
            }
            idx = parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DenseGrid;
    use gridroute_common::db::core::Design;

    fn reservations_for(design: &Design) -> PinReservations {
        PinReservations::build(design)
    }

    #[test]
    fn finds_straight_line_on_clear_grid() {
        let design = Design::new(5, 5, 0, 0);
        let grid = DenseGrid::from_design(&design);
        let reservations = reservations_for(&design);
        let mut astar = AStar::new(5, 5);
        let (path, cost) = astar
            .search(
                &grid,
                NetId::new(0),
                &reservations,
                &[Coordinate::new(0, 0, 0)],
                &[Coordinate::new(0, 3, 0)],
            )
            .unwrap();
        assert_eq!(cost, 3);
        assert_eq!(path.first(), Some(&Coordinate::new(0, 0, 0)));
        assert_eq!(path.last(), Some(&Coordinate::new(0, 3, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn detours_around_an_obstacle() {
        let mut design = Design::new(5, 5, 0, 0);
        design.add_obstacle(Coordinate::new(0, 2, 0));
        let grid = DenseGrid::from_design(&design);
        let reservations = reservations_for(&design);
        let mut astar = AStar::new(5, 5);
        let (_path, cost) = astar
            .search(
                &grid,
                NetId::new(0),
                &reservations,
                &[Coordinate::new(0, 0, 0)],
                &[Coordinate::new(0, 4, 0)],
            )
            .unwrap();
        assert_eq!(cost, 6);
    }

    #[test]
    fn via_cheaper_than_repeated_bend_penalty() {
        let design = Design::new(5, 5, 10, 1);
        let grid = DenseGrid::from_design(&design);
        let reservations = reservations_for(&design);
        let mut astar = AStar::new(5, 5);
        let (_path, cost) = astar
            .search(
                &grid,
                NetId::new(0),
                &reservations,
                &[Coordinate::new(0, 0, 0)],
                &[Coordinate::new(0, 0, 3)],
            )
            .unwrap();
        assert_eq!(cost, 5);
    }

    #[test]
    fn fails_when_fully_enclosed_by_obstacles() {
        let mut design = Design::new(3, 3, 0, 0);
        for c in [
            Coordinate::new(0, 0, 1),
            Coordinate::new(0, 2, 1),
            Coordinate::new(0, 1, 0),
            Coordinate::new(0, 1, 2),
            Coordinate::new(1, 0, 1),
            Coordinate::new(1, 2, 1),
            Coordinate::new(1, 1, 0),
            Coordinate::new(1, 1, 2),
        ] {
            design.add_obstacle(c);
        }
        let grid = DenseGrid::from_design(&design);
        let reservations = reservations_for(&design);
        let mut astar = AStar::new(3, 3);
        let result = astar.search(
            &grid,
            NetId::new(0),
            &reservations,
            &[Coordinate::new(0, 1, 1)],
            &[Coordinate::new(0, 0, 0)],
        );
        assert!(result.is_none());
    }

    #[test]
    fn reuses_engine_across_sub_searches_without_stale_state() {
        let design = Design::new(6, 6, 0, 0);
        let grid = DenseGrid::from_design(&design);
        let reservations = reservations_for(&design);
        let mut astar = AStar::new(6, 6);

        let (first, _) = astar
            .search(
                &grid,
                NetId::new(0),
                &reservations,
                &[Coordinate::new(0, 0, 0)],
                &[Coordinate::new(0, 5, 0)],
            )
            .unwrap();

        let (second, cost) = astar
            .search(
                &grid,
                NetId::new(0),
                &reservations,
                &first,
                &[Coordinate::new(0, 0, 5)],
            )
            .unwrap();
        assert_eq!(second.first(), Some(&Coordinate::new(0, 0, 0)));
        assert_eq!(cost, 5);
    }
}
