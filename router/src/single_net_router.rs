use crate::algo::astar::AStar;
use crate::error::RouteError;
use crate::grid::{PinReservations, RoutingGrid};
use gridroute_common::db::core::Net;
use gridroute_common::db::indices::NetId;
use gridroute_common::geom::coord::Coordinate;
use std::collections::HashSet;

/// Routes one net's pins into a single connected cell sequence via
/// incremental multi-source, multi-goal A*: starting from a source set
/// `S = {p0}` and a target set `T = {p1, .., pm-1}`, each step runs one
/// A* sub-search from all of `S` toward the nearest cell of `T`, then
/// folds the reached path into `S` and drops every pin of `T` the path
/// happened to pass through.
///
/// This is a Steiner-like heuristic, not a minimum Steiner tree: later
/// sub-searches start cheaply from any cell the net has already claimed,
/// which tends to grow a shared trunk, but the result depends on pin
/// order and is not guaranteed optimal. Preserve this shape rather than
/// "improving" it into a true Steiner solver.
///
/// On success, marks `grid.mark_path` with the full route and returns
/// `Ok(())`; the net's `route`/`cost` are filled in directly. On failure
/// the grid is left untouched — no partial marking.
pub fn route_net(
    grid: &mut impl RoutingGrid,
    net: &mut Net,
    net_id: NetId,
    reservations: &PinReservations,
    astar: &mut AStar,
) -> Result<(), RouteError> {
    if net.pins.len() < 2 {
        // A single-pin net is trivially routed: it already connects all
        // (one) of its pins. Give it a one-cell route so it shows up as
        // routed in output/occupancy rather than being mistaken for an
        // unrouted net.
        let route = net.pins.clone();
        grid.mark_path(&route, net_id);
        net.route = route;
        net.cost = Some(0);
        return Ok(());
    }

    let mut sources = vec![net.pins[0]];
    let mut in_source: HashSet<Coordinate> = sources.iter().copied().collect();
    let mut targets: Vec<Coordinate> = net.pins[1..]
        .iter()
        .copied()
        .filter(|p| !in_source.contains(p))
        .collect();

    let mut route = vec![net.pins[0]];
    let mut total_cost: u64 = 0;
    let mut first_segment = true;

    while !targets.is_empty() {
        let (path, cost) = astar
            .search(grid, net_id, reservations, &sources, &targets)
            .ok_or_else(|| RouteError::UnroutableNet {
                net: net.name.clone(),
            })?;
        total_cost += cost;

        let new_cells = if first_segment {
            first_segment = false;
            &path[..]
        } else {
            &path[1..]
        };
        for &c in new_cells {
            if in_source.insert(c) {
                route.push(c);
                sources.push(c);
            }
        }

        targets.retain(|t| !in_source.contains(t));
    }

    grid.mark_path(&route, net_id);
    net.route = route;
    net.cost = Some(total_cost);
    Ok(())
}
