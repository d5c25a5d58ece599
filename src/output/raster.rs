use crate::output::geometry::{BoardGeometry, Poly};

pub const DEFAULT_DPI: u32 = 300;
const MM_PER_INCH: f64 = 25.4;

// 8-bit single-channel byte plane, row-major, top row first. PNG encoding is
// a concern of the thin adapter, not the engine.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Mask {
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }
}

// Scan-converts the conductor polygons into a positive mask (copper = 255 on
// black) and a negative mask (copper = 0 on white) at the given DPI.
pub fn render_masks(
    geom: &BoardGeometry,
    board_width: f64,
    board_height: f64,
    dpi: u32,
) -> (Mask, Mask) {
    let width = (board_width / MM_PER_INCH * dpi as f64).ceil() as usize;
    let height = (board_height / MM_PER_INCH * dpi as f64).ceil() as usize;
    let mut positive = Mask::filled(width, height, 0);
    let mut negative = Mask::filled(width, height, 255);
    for poly in &geom.conductors {
        fill_polygon(&mut positive, &mut negative, poly, board_width, board_height);
    }
    (positive, negative)
}

// Even-odd scanline fill. World y points up; pixel y points down.
fn fill_polygon(positive: &mut Mask, negative: &mut Mask, poly: &Poly, bw: f64, bh: f64) {
    let n = poly.pts.len();
    if n < 3 {
        return;
    }
    let (w, h) = (positive.width as f64, positive.height as f64);
    let px: Vec<(f64, f64)> =
        poly.pts.iter().map(|p| (p.x / bw * w, (1.0 - p.y / bh) * h)).collect();

    let y_min = px.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let y_max = px.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let y0 = (y_min.ceil().max(0.0)) as i64;
    let y1 = (y_max.floor().min(h - 1.0)) as i64;

    let mut xs: Vec<f64> = Vec::new();
    for y in y0..=y1 {
        xs.clear();
        let fy = y as f64;
        for i in 0..n {
            let a = px[i];
            let b = px[(i + 1) % n];
            // Half-open span [lo.y, hi.y) so shared vertices count once;
            // horizontal edges contribute nothing.
            let (lo, hi) = if a.1 <= b.1 { (a, b) } else { (b, a) };
            if fy >= lo.1 && fy < hi.1 {
                let t = (fy - lo.1) / (hi.1 - lo.1);
                xs.push(lo.0 + t * (hi.0 - lo.0));
            }
        }
        xs.sort_by(f64::total_cmp);
        for span in xs.chunks_exact(2) {
            let x0 = (span[0].ceil().max(0.0)) as i64;
            let x1 = (span[1].floor().min(w - 1.0)) as i64;
            for x in x0..=x1 {
                positive.set(x as usize, y as usize, 255);
                negative.set(x as usize, y as usize, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pcb::{Board, Constraints, Trace};
    use crate::model::pt::{pt, pti};
    use crate::output::geometry::{generate_geometry, Poly};

    // Bounding box of lit pixels in the positive mask, mapped back to
    // millimetres: (min_x, min_y, max_x, max_y) in world coordinates.
    fn lit_bbox_mm(mask: &Mask, bw: f64, bh: f64) -> (f64, f64, f64, f64) {
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
        for y in 0..mask.height {
            for x in 0..mask.width {
                if mask.get(x, y) == 255 {
                    x0 = x0.min(x);
                    y0 = y0.min(y);
                    x1 = x1.max(x);
                    y1 = y1.max(y);
                }
            }
        }
        assert!(x0 <= x1, "mask has no lit pixels");
        let to_x = |x: usize| x as f64 / mask.width as f64 * bw;
        let to_y = |y: usize| (1.0 - y as f64 / mask.height as f64) * bh;
        (to_x(x0), to_y(y1 + 1), to_x(x1 + 1), to_y(y0))
    }

    #[test]
    fn test_mask_extents() {
        let geom = BoardGeometry::default();
        let (pos, neg) = render_masks(&geom, 40.0, 40.0, 100);
        // 40mm at 100dpi: ceil(40 / 25.4 * 100) = 158.
        assert_eq!((pos.width, pos.height), (158, 158));
        assert!(pos.data.iter().all(|&v| v == 0));
        assert!(neg.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_rect_bbox_round_trip() {
        // A 2mm-wide horizontal run from x=10 to x=30 at y=20.
        let rect =
            Poly { pts: vec![pt(10.0, 19.0), pt(30.0, 19.0), pt(30.0, 21.0), pt(10.0, 21.0)] };
        let geom = BoardGeometry { outline: Vec::new(), conductors: vec![rect] };
        let (pos, _) = render_masks(&geom, 40.0, 40.0, 100);
        let px_mm = 40.0 / pos.width as f64;
        let (x0, y0, x1, y1) = lit_bbox_mm(&pos, 40.0, 40.0);
        assert!((x0 - 10.0).abs() <= px_mm + 1e-9, "left edge at {x0}");
        assert!((y0 - 19.0).abs() <= px_mm + 1e-9, "bottom edge at {y0}");
        assert!((x1 - 30.0).abs() <= px_mm + 1e-9, "right edge at {x1}");
        assert!((y1 - 21.0).abs() <= px_mm + 1e-9, "top edge at {y1}");
    }

    #[test]
    fn test_full_trace_bbox_includes_endcaps() {
        let board = Board { width: 40.0, height: 40.0, resolution: 0.5, outline: None };
        let constraints = Constraints { trace_width: 2.0, trace_clearance: 1.5 };
        let path = (20..=60).map(|x| pti(x, 40)).collect();
        let trace = Trace { net: "SIG".to_owned(), path };
        let geom = generate_geometry(&board, &constraints, &[trace], &[]);
        let (pos, _) = render_masks(&geom, 40.0, 40.0, 100);
        let px_mm = 40.0 / pos.width as f64;
        let (x0, y0, x1, y1) = lit_bbox_mm(&pos, 40.0, 40.0);
        // Cell centres run (10.25, 20.25) to (30.25, 20.25); the endcaps add
        // a trace half-width on each end.
        assert!((x0 - 9.25).abs() <= px_mm + 1e-9, "left edge at {x0}");
        assert!((x1 - 31.25).abs() <= px_mm + 1e-9, "right edge at {x1}");
        assert!((y0 - 19.25).abs() <= px_mm + 1e-9, "bottom edge at {y0}");
        assert!((y1 - 21.25).abs() <= px_mm + 1e-9, "top edge at {y1}");
    }

    #[test]
    fn test_masks_are_complements() {
        let rect = Poly { pts: vec![pt(5.0, 5.0), pt(20.0, 5.0), pt(20.0, 12.0), pt(5.0, 12.0)] };
        let geom = BoardGeometry { outline: Vec::new(), conductors: vec![rect] };
        let (pos, neg) = render_masks(&geom, 40.0, 40.0, 100);
        for (p, n) in pos.data.iter().zip(neg.data.iter()) {
            assert_eq!(*p as u16 + *n as u16, 255);
        }
    }

    #[test]
    fn test_y_axis_flip() {
        // Copper near the world bottom lands near the image bottom rows.
        let rect = Poly { pts: vec![pt(0.0, 0.0), pt(40.0, 0.0), pt(40.0, 4.0), pt(0.0, 4.0)] };
        let geom = BoardGeometry { outline: Vec::new(), conductors: vec![rect] };
        let (pos, _) = render_masks(&geom, 40.0, 40.0, 100);
        assert_eq!(pos.get(79, pos.height - 2), 255);
        assert_eq!(pos.get(79, 1), 0);
    }

    #[test]
    fn test_render_deterministic() {
        let tri = Poly { pts: vec![pt(5.0, 5.0), pt(30.0, 8.0), pt(12.0, 33.0)] };
        let geom = BoardGeometry { outline: Vec::new(), conductors: vec![tri] };
        let a = render_masks(&geom, 40.0, 40.0, 150);
        let b = render_masks(&geom, 40.0, 40.0, 150);
        assert_eq!(a, b);
    }
}
