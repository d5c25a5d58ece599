use approx::{relative_eq, relative_ne};

use crate::model::pt::Pt;

pub const EP: f64 = 1e-6;

pub fn eq(a: f64, b: f64) -> bool {
    relative_eq!(a, b, epsilon = EP)
}

pub fn ne(a: f64, b: f64) -> bool {
    relative_ne!(a, b, epsilon = EP)
}

pub fn gt(a: f64, b: f64) -> bool {
    ne(a, b) && a > b
}

pub fn ge(a: f64, b: f64) -> bool {
    eq(a, b) || a > b
}

pub fn le(a: f64, b: f64) -> bool {
    eq(a, b) || a < b
}

pub fn lt(a: f64, b: f64) -> bool {
    ne(a, b) && a < b
}

// Minimum distance from |p| to the segment [a, b].
pub fn pt_seg_dist(p: Pt, a: Pt, b: Pt) -> f64 {
    let d = b - a;
    let len2 = d.x * d.x + d.y * d.y;
    if eq(len2, 0.0) {
        return p.dist(a);
    }
    let t = ((p - a).dot(d) / len2).clamp(0.0, 1.0);
    p.dist(a + t * d)
}

// Even-odd crossing test. Points exactly on an edge may land on either side;
// callers that care use pt_seg_dist as well.
pub fn pt_in_polygon(p: Pt, poly: &[Pt]) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
