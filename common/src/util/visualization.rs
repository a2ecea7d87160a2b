use crate::db::core::Design;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as ImageRect;
use std::path::Path;

const LAYER_COLORS: [Rgba<u8>; 2] = [
    // M0, horizontal-preferred: red
    Rgba([255, 20, 80, 200]),
    // M1, vertical-preferred: blue
    Rgba([0, 110, 255, 200]),
];

/// Renders a per-layer overlay of obstacles and routed nets onto a single
/// PNG, one `cell_px`-sized square per grid cell. Nets with no route are
/// skipped; obstacles are drawn on both layers where set.
pub fn draw_routed_design(design: &Design, filename: &str, cell_px: u32) {
    let w = design.width * cell_px;
    let h = design.height * cell_px;
    if w == 0 || h == 0 {
        return;
    }
    let mut img = RgbaImage::from_pixel(w, h, Rgba([20, 20, 20, 255]));

    for obstacle in &design.obstacles {
        let rect = cell_rect(obstacle.x, obstacle.y, cell_px);
        draw_filled_rect_mut(&mut img, rect, Rgba([120, 120, 120, 255]));
    }

    for net in &design.nets {
        if net.route.is_empty() {
            continue;
        }
        let color = net_color(net);
        for c in &net.route {
            let rect = cell_rect(c.x, c.y, cell_px);
            let base = LAYER_COLORS[c.layer as usize];
            let blended = Rgba([
                ((base[0] as u16 + color[0] as u16) / 2) as u8,
                ((base[1] as u16 + color[1] as u16) / 2) as u8,
                ((base[2] as u16 + color[2] as u16) / 2) as u8,
                220,
            ]);
            draw_filled_rect_mut(&mut img, rect, blended);
        }
        for pin in &net.pins {
            let rect = cell_rect(pin.x, pin.y, cell_px);
            draw_filled_rect_mut(&mut img, rect, Rgba([255, 255, 255, 255]));
        }
    }

    let _ = img.save(Path::new(filename));
}

fn cell_rect(x: u32, y: u32, cell_px: u32) -> ImageRect {
    ImageRect::at((x * cell_px) as i32, (y * cell_px) as i32).of_size(cell_px, cell_px)
}

/// Deterministic, visually distinct-ish color derived from the net name so
/// repeated renders of the same design look the same.
fn net_color(net: &crate::db::core::Net) -> [u8; 3] {
    let mut hash: u32 = 2166136261;
    for b in net.name.bytes() {
        hash ^= b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    [
        100 + (hash & 0x7f) as u8,
        100 + ((hash >> 7) & 0x7f) as u8,
        100 + ((hash >> 14) & 0x7f) as u8,
    ]
}
