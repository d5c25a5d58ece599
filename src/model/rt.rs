use derive_more::Display;

use crate::model::math::{ge, le, lt};
use crate::model::pt::{pt, pti, Pt, PtI};

// Rt covers the range [l, r] x [b, t]. Empty rectangles have r < l or t < b.
#[derive(Debug, Copy, Clone, Display)]
#[display(fmt = "({}, {}, {}, {})", l, b, r, t)]
pub struct Rt {
    l: f64,
    b: f64,
    r: f64,
    t: f64,
}

impl Default for Rt {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rt {
    #[must_use]
    pub const fn new(l: f64, b: f64, r: f64, t: f64) -> Self {
        Self { l, b, r, t }
    }

    #[must_use]
    pub const fn empty() -> Self {
        rt(0.0, 0.0, -1.0, -1.0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lt(self.r, self.l) || lt(self.t, self.b)
    }

    #[must_use]
    pub fn w(&self) -> f64 {
        self.r - self.l
    }

    #[must_use]
    pub fn h(&self) -> f64 {
        self.t - self.b
    }

    #[must_use]
    pub const fn l(&self) -> f64 {
        self.l
    }

    #[must_use]
    pub const fn t(&self) -> f64 {
        self.t
    }

    #[must_use]
    pub const fn r(&self) -> f64 {
        self.r
    }

    #[must_use]
    pub const fn b(&self) -> f64 {
        self.b
    }

    #[must_use]
    pub const fn bl(&self) -> Pt {
        pt(self.l, self.b)
    }

    #[must_use]
    pub const fn tr(&self) -> Pt {
        pt(self.r, self.t)
    }

    #[must_use]
    pub fn center(&self) -> Pt {
        pt((self.l + self.r) / 2.0, (self.b + self.t) / 2.0)
    }

    // Corners in counterclockwise order.
    #[must_use]
    pub const fn pts(&self) -> [Pt; 4] {
        [pt(self.l, self.b), pt(self.r, self.b), pt(self.r, self.t), pt(self.l, self.t)]
    }

    #[must_use]
    pub fn contains(&self, p: Pt) -> bool {
        ge(p.x, self.l) && ge(p.y, self.b) && le(p.x, self.r) && le(p.y, self.t)
    }

    #[must_use]
    pub fn contains_rt(&self, o: &Rt) -> bool {
        self.contains(o.bl()) && self.contains(o.tr())
    }

    #[must_use]
    pub fn inflate(&self, dx: f64, dy: f64) -> Rt {
        rt(self.l - dx, self.b - dy, self.r + dx, self.t + dy)
    }

    #[must_use]
    pub fn centered(center: Pt, half_w: f64, half_h: f64) -> Rt {
        rt(center.x - half_w, center.y - half_h, center.x + half_w, center.y + half_h)
    }

    #[must_use]
    pub fn enclosing(pa: Pt, pb: Pt) -> Rt {
        let l = pa.x.min(pb.x);
        let b = pa.y.min(pb.y);
        let r = pa.x.max(pb.x);
        let t = pa.y.max(pb.y);
        rt(l, b, r, t)
    }
}

impl PartialEq for Rt {
    fn eq(&self, o: &Self) -> bool {
        self.bl() == o.bl() && self.tr() == o.tr()
    }
}

// Grid-space rectangle covering cells [l, r) x [b, t).
#[derive(Debug, Default, PartialEq, Eq, Copy, Clone, Display)]
#[display(fmt = "({}, {}, {}, {})", l, b, r, t)]
pub struct RtI {
    l: i64,
    b: i64,
    r: i64,
    t: i64,
}

impl RtI {
    #[must_use]
    pub const fn new(l: i64, b: i64, r: i64, t: i64) -> Self {
        Self { l, b, r, t }
    }

    #[must_use]
    pub const fn l(&self) -> i64 {
        self.l
    }

    #[must_use]
    pub const fn b(&self) -> i64 {
        self.b
    }

    #[must_use]
    pub const fn r(&self) -> i64 {
        self.r
    }

    #[must_use]
    pub const fn t(&self) -> i64 {
        self.t
    }

    #[must_use]
    pub fn enclosing(pa: PtI, pb: PtI) -> RtI {
        let l = pa.x.min(pb.x);
        let b = pa.y.min(pb.y);
        let r = pa.x.max(pb.x);
        let t = pa.y.max(pb.y);
        RtI::new(l, b, r, t)
    }

    pub fn cells(&self) -> impl Iterator<Item = PtI> + '_ {
        (self.b..self.t).flat_map(move |y| (self.l..self.r).map(move |x| pti(x, y)))
    }
}

#[must_use]
pub const fn rt(l: f64, b: f64, r: f64, t: f64) -> Rt {
    Rt::new(l, b, r, t)
}
