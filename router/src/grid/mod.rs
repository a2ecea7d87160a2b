pub mod dense;
pub mod reservations;

pub use dense::DenseGrid;
pub use reservations::PinReservations;

use gridroute_common::db::indices::NetId;
use gridroute_common::geom::coord::Coordinate;

/// Exclusive two-layer occupancy grid. Unlike a congestion-aware grid, a
/// cell is either free, an obstacle, or owned by exactly one net: there is
/// no soft capacity, no history cost, no negotiated congestion.
pub trait RoutingGrid: Sync + Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn bend_penalty(&self) -> u32;
    fn via_penalty(&self) -> u32;

    fn is_obstacle(&self, coord: Coordinate) -> bool;

    /// The net currently owning `coord`, if any.
    fn owner(&self, coord: Coordinate) -> Option<NetId>;

    /// Marks every cell in `cells` as owned by `net`. Cells are expected to
    /// already be free; callers route one net at a time within an attempt.
    fn mark_path(&mut self, cells: &[Coordinate], net: NetId);

    /// Clears every cell in `cells` from occupancy.
    fn clear_path(&mut self, cells: &[Coordinate]);

    /// True iff `coord` is in bounds, not an obstacle, not owned by a net
    /// other than `net`, and not a pin reserved by a net other than `net`.
    fn is_legal_for(&self, coord: Coordinate, net: NetId, reservations: &PinReservations) -> bool {
        if coord.x >= self.width() || coord.y >= self.height() {
            return false;
        }
        if self.is_obstacle(coord) {
            return false;
        }
        match self.owner(coord) {
            Some(owner) if owner != net => return false,
            _ => {}
        }
        match reservations.owner(coord) {
            Some(owner) if owner != net => false,
            _ => true,
        }
    }

    /// Legal next coordinates from `pos` for `net`, with their step cost.
    /// Same-layer moves come first in preferred-direction order (M0: ±x
    /// then ±y; M1: ±y then ±x), followed by the via. Order isn't
    /// semantically required by A* but stabilises tie-breaking.
    fn neighbours(
        &self,
        pos: Coordinate,
        net: NetId,
        reservations: &PinReservations,
    ) -> Vec<(Coordinate, u32)> {
        let preferred_horizontal = pos.layer == 0;
        let steps: [(i64, i64); 4] = if preferred_horizontal {
            [(-1, 0), (1, 0), (0, -1), (0, 1)]
        } else {
            [(0, -1), (0, 1), (-1, 0), (1, 0)]
        };

        let mut out = Vec::with_capacity(5);
        for (dx, dy) in steps {
            let nx = pos.x as i64 + dx;
            let ny = pos.y as i64 + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let candidate = Coordinate::new(pos.layer, nx as u32, ny as u32);
            if !self.is_legal_for(candidate, net, reservations) {
                continue;
            }
            let moved_horizontal = dx != 0;
            let cost = if moved_horizontal == preferred_horizontal {
                1
            } else {
                1 + self.bend_penalty()
            };
            out.push((candidate, cost));
        }

        let via = Coordinate::new(pos.other_layer(), pos.x, pos.y);
        if self.is_legal_for(via, net, reservations) {
            out.push((via, self.via_penalty()));
        }
        out
    }
}
