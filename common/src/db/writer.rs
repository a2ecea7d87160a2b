use crate::db::core::Design;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

/// Renders one line per successfully routed net: `name (layer,x,y) ...`.
/// Unrouted nets (no route found, or a trivial single-pin net that never
/// needed one) are omitted entirely, matching the router's output contract.
pub fn render(design: &Design) -> String {
    let mut out = String::new();
    for net in &design.nets {
        if net.route.is_empty() {
            continue;
        }
        write!(out, "{}", net.name).unwrap();
        for c in &net.route {
            write!(out, " {}", c).unwrap();
        }
        out.push('\n');
    }
    out
}

pub fn write_to_path(design: &Design, path: impl AsRef<Path>) -> io::Result<()> {
    fs::write(path, render(design))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::core::Net;
    use crate::geom::coord::Coordinate;

    #[test]
    fn omits_unrouted_nets() {
        let mut design = Design::new(10, 10, 1, 1);
        let mut routed = Net::new("a".into(), vec![Coordinate::new(0, 0, 0), Coordinate::new(0, 2, 0)]);
        routed.route = vec![Coordinate::new(0, 0, 0), Coordinate::new(0, 1, 0), Coordinate::new(0, 2, 0)];
        routed.cost = Some(2);
        let unrouted = Net::new("b".into(), vec![Coordinate::new(0, 5, 5), Coordinate::new(0, 9, 9)]);
        design.nets.push(routed);
        design.nets.push(unrouted);

        let rendered = render(&design);
        assert!(rendered.contains("a (0,0,0) (0,1,0) (0,2,0)"));
        assert!(!rendered.contains('b'));
    }

    #[test]
    fn empty_design_renders_empty_string() {
        let design = Design::new(4, 4, 0, 0);
        assert_eq!(render(&design), "");
    }
}
