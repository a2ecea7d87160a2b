use crate::geom::coord::Coordinate;
use std::collections::HashMap;

/// One net as given by the input file: a stable name and its pins, in the
/// order they were declared. `route`/`cost` are populated by the router
/// on success and cleared on rip-up; both start empty/undefined.
#[derive(Clone, Debug)]
pub struct Net {
    pub name: String,
    pub pins: Vec<Coordinate>,
    pub route: Vec<Coordinate>,
    pub cost: Option<u64>,
}

impl Net {
    pub fn new(name: String, pins: Vec<Coordinate>) -> Self {
        Self {
            name,
            pins,
            route: Vec::new(),
            cost: None,
        }
    }

    pub fn is_routed(&self) -> bool {
        !self.route.is_empty() || self.pins.len() < 2
    }

    /// Rip-up: discard the route and cost so the net can be re-routed.
    pub fn clear_route(&mut self) {
        self.route.clear();
        self.cost = None;
    }
}

/// The fully parsed input: grid extents, penalties, obstacles and nets.
/// This is what the parser produces and the router consumes; it owns no
/// occupancy state of its own (that belongs to the `Grid`).
#[derive(Clone, Debug)]
pub struct Design {
    pub width: u32,
    pub height: u32,
    pub bend_penalty: u32,
    pub via_penalty: u32,
    pub obstacles: Vec<Coordinate>,
    pub nets: Vec<Net>,
    pub net_name_map: HashMap<String, usize>,
}

impl Design {
    pub fn new(width: u32, height: u32, bend_penalty: u32, via_penalty: u32) -> Self {
        Self {
            width,
            height,
            bend_penalty,
            via_penalty,
            obstacles: Vec::new(),
            nets: Vec::new(),
            net_name_map: HashMap::new(),
        }
    }

    pub fn add_obstacle(&mut self, c: Coordinate) {
        self.obstacles.push(c);
    }

    /// Adds a pin to the named net, creating the net on first mention.
    pub fn add_pin(&mut self, net_name: &str, pin: Coordinate) {
        let idx = match self.net_name_map.get(net_name) {
            Some(&idx) => idx,
            None => {
                let idx = self.nets.len();
                self.nets.push(Net::new(net_name.to_string(), Vec::new()));
                self.net_name_map.insert(net_name.to_string(), idx);
                idx
            }
        };
        self.nets[idx].pins.push(pin);
    }

    pub fn in_bounds(&self, c: Coordinate) -> bool {
        c.x < self.width && c.y < self.height && c.layer < 2
    }

    pub fn is_obstacle(&self, c: Coordinate) -> bool {
        self.obstacles.contains(&c)
    }
}
