use gridroute_common::db::core::Design;
use gridroute_common::db::indices::NetId;
use gridroute_common::geom::coord::Coordinate;

/// Precomputed "this coordinate is a pin of net N" map, built once per
/// routing attempt from every net's declared pins. Replaces scanning all
/// other nets' pins on every neighbour check with an O(1) lookup: the
/// grid no longer needs a back-reference to the net list.
///
/// Only *other* nets' pins are reserved against a given net (see
/// `RoutingGrid::is_legal_for`); a net may freely route through its own
/// pins, including ones it hasn't reached yet.
pub struct PinReservations {
    width: u32,
    height: u32,
    owner: Vec<Option<NetId>>,
}

impl PinReservations {
    pub fn build(design: &Design) -> Self {
        let size = (design.width as usize) * (design.height as usize) * 2;
        let mut owner = vec![None; size];
        for (net_idx, net) in design.nets.iter().enumerate() {
            let net_id = NetId::new(net_idx);
            for &pin in &net.pins {
                let idx = Self::index(design.width, design.height, pin);
                owner[idx] = Some(net_id);
            }
        }
        Self {
            width: design.width,
            height: design.height,
            owner,
        }
    }

    #[inline(always)]
    fn index(width: u32, height: u32, c: Coordinate) -> usize {
        (c.layer as usize) * (width as usize) * (height as usize)
            + (c.y as usize) * (width as usize)
            + (c.x as usize)
    }

    /// The net whose pin occupies `coord`, if any.
    pub fn owner(&self, coord: Coordinate) -> Option<NetId> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        self.owner[Self::index(self.width, self.height, coord)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridroute_common::geom::coord::Coordinate;

    #[test]
    fn reserves_every_pin_of_every_net() {
        let mut design = Design::new(10, 10, 0, 0);
        design.add_pin("n1", Coordinate::new(0, 1, 1));
        design.add_pin("n1", Coordinate::new(0, 5, 5));
        design.add_pin("n2", Coordinate::new(0, 9, 9));

        let reservations = PinReservations::build(&design);
        assert_eq!(reservations.owner(Coordinate::new(0, 1, 1)), Some(NetId::new(0)));
        assert_eq!(reservations.owner(Coordinate::new(0, 9, 9)), Some(NetId::new(1)));
        assert_eq!(reservations.owner(Coordinate::new(0, 3, 3)), None);
    }

    #[test]
    fn out_of_bounds_coordinate_is_unreserved() {
        let design = Design::new(4, 4, 0, 0);
        let reservations = PinReservations::build(&design);
        assert_eq!(reservations.owner(Coordinate::new(0, 40, 40)), None);
    }
}
