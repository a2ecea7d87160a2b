use super::RoutingGrid;
use gridroute_common::db::core::Design;
use gridroute_common::db::indices::NetId;
use gridroute_common::geom::coord::Coordinate;

/// Flat `W * H * 2` occupancy grid. Obstacles are set once at construction
/// and never mutated; occupancy is rewritten by `mark_path`/`clear_path`
/// once per net per attempt.
pub struct DenseGrid {
    width: u32,
    height: u32,
    bend_penalty: u32,
    via_penalty: u32,
    obstacles: Vec<bool>,
    occupancy: Vec<Option<NetId>>,
}

impl DenseGrid {
    pub fn new(width: u32, height: u32, bend_penalty: u32, via_penalty: u32) -> Self {
        let size = (width as usize) * (height as usize) * 2;
        Self {
            width,
            height,
            bend_penalty,
            via_penalty,
            obstacles: vec![false; size],
            occupancy: vec![None; size],
        }
    }

    /// Builds a grid from a parsed design, setting obstacles from
    /// `design.obstacles`. Occupancy starts empty; nets are marked as they
    /// are routed.
    pub fn from_design(design: &Design) -> Self {
        let mut grid = Self::new(
            design.width,
            design.height,
            design.bend_penalty,
            design.via_penalty,
        );
        for obstacle in &design.obstacles {
            let idx = grid.index(*obstacle);
            grid.obstacles[idx] = true;
        }
        grid
    }

    #[inline(always)]
    fn index(&self, c: Coordinate) -> usize {
        (c.layer as usize) * (self.width as usize) * (self.height as usize)
            + (c.y as usize) * (self.width as usize)
            + (c.x as usize)
    }
}

impl RoutingGrid for DenseGrid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bend_penalty(&self) -> u32 {
        self.bend_penalty
    }

    fn via_penalty(&self) -> u32 {
        self.via_penalty
    }

    fn is_obstacle(&self, coord: Coordinate) -> bool {
        if coord.x >= self.width || coord.y >= self.height {
            return true;
        }
        self.obstacles[self.index(coord)]
    }

    fn owner(&self, coord: Coordinate) -> Option<NetId> {
        self.occupancy[self.index(coord)]
    }

    fn mark_path(&mut self, cells: &[Coordinate], net: NetId) {
        for c in cells {
            let idx = self.index(*c);
            self.occupancy[idx] = Some(net);
        }
    }

    fn clear_path(&mut self, cells: &[Coordinate]) {
        for c in cells {
            let idx = self.index(*c);
            self.occupancy[idx] = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::reservations::PinReservations;

    #[test]
    fn obstacle_outside_bounds_is_treated_as_blocked() {
        let grid = DenseGrid::new(4, 4, 0, 0);
        assert!(grid.is_obstacle(Coordinate::new(0, 10, 10)));
    }

    #[test]
    fn mark_and_clear_round_trip() {
        let mut grid = DenseGrid::new(4, 4, 0, 0);
        let net = NetId::new(0);
        let cells = vec![Coordinate::new(0, 1, 1), Coordinate::new(0, 2, 1)];
        grid.mark_path(&cells, net);
        assert_eq!(grid.owner(cells[0]), Some(net));
        grid.clear_path(&cells);
        assert_eq!(grid.owner(cells[0]), None);
    }

    #[test]
    fn from_design_sets_obstacles() {
        let mut design = Design::new(5, 5, 0, 0);
        design.add_obstacle(Coordinate::new(1, 2, 3));
        let grid = DenseGrid::from_design(&design);
        assert!(grid.is_obstacle(Coordinate::new(1, 2, 3)));
        assert!(!grid.is_obstacle(Coordinate::new(0, 2, 3)));
    }

    #[test]
    fn neighbours_on_m0_prefer_horizontal_first() {
        let grid = DenseGrid::new(5, 5, 3, 1);
        let design = Design::new(5, 5, 3, 1);
        let reservations = PinReservations::build(&design);
        let net = NetId::new(0);
        let ns = grid.neighbours(Coordinate::new(0, 2, 2), net, &reservations);
        // x-1, x+1, y-1, y+1, via — in that order, all legal here.
        assert_eq!(ns[0].0, Coordinate::new(0, 1, 2));
        assert_eq!(ns[0].1, 1);
        assert_eq!(ns[1].0, Coordinate::new(0, 3, 2));
        assert_eq!(ns[2].0, Coordinate::new(0, 2, 1));
        assert_eq!(ns[2].1, 1 + 3);
        assert_eq!(ns[4].0, Coordinate::new(1, 2, 2));
        assert_eq!(ns[4].1, 1);
    }

    #[test]
    fn neighbours_excludes_obstacles_and_foreign_occupancy() {
        let mut design = Design::new(5, 5, 0, 0);
        design.add_obstacle(Coordinate::new(0, 3, 2));
        let mut grid = DenseGrid::from_design(&design);
        let other = NetId::new(1);
        grid.mark_path(&[Coordinate::new(0, 2, 1)], other);
        let reservations = PinReservations::build(&design);

        let mine = NetId::new(0);
        let ns = grid.neighbours(Coordinate::new(0, 2, 2), mine, &reservations);
        assert!(!ns.iter().any(|(c, _)| *c == Coordinate::new(0, 3, 2)));
        assert!(!ns.iter().any(|(c, _)| *c == Coordinate::new(0, 2, 1)));
    }
}
