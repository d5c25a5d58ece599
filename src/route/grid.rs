use rust_dense_bitset::{BitSet as _, DenseBitSetExtended};

use crate::model::math::{pt_in_polygon, pt_seg_dist};
use crate::model::pcb::Board;
use crate::model::pt::{pt, pti, Pt, PtI};
use crate::model::rt::{Rt, RtI};

const BLOCKED: u8 = 0b01;
const PERMANENT: u8 = 0b10;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CellState {
    Free,
    Blocked,
}

// Dense membership set over grid cells, keyed by y * w + x.
#[must_use]
#[derive(Debug, Clone)]
pub struct CellSet {
    bits: DenseBitSetExtended,
    cap: usize,
}

impl CellSet {
    pub fn new(cap: usize) -> Self {
        Self { bits: DenseBitSetExtended::with_capacity(cap), cap }
    }

    pub fn insert(&mut self, idx: usize) {
        if idx < self.cap {
            self.bits.set_bit(idx, true);
        }
    }

    pub fn remove(&mut self, idx: usize) {
        if idx < self.cap {
            self.bits.set_bit(idx, false);
        }
    }

    #[must_use]
    pub fn contains(&self, idx: usize) -> bool {
        idx < self.cap && self.bits.get_bit(idx)
    }
}

// Quantized occupancy map over the board area. Tracks per-cell state plus a
// permanent flag for cells that may never be released (board exterior, edge
// keep-out, component bodies).
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    w: i64,
    h: i64,
    resolution: f64,
    cells: Vec<u8>,
}

impl Grid {
    pub fn new(w: i64, h: i64, resolution: f64) -> Self {
        Self { w, h, resolution, cells: vec![0; (w * h) as usize] }
    }

    // Builds the grid for a board: all cells start free, then the boundary
    // is permanently blocked. With an outline polygon, exterior cells and
    // cells within the edge keep-out distance are blocked; otherwise a
    // rectangular rim of |blocked_radius| cells.
    pub fn from_board(board: &Board, blocked_radius: i64) -> Self {
        let (w, h) = board.grid_size();
        let mut g = Self::new(w, h, board.resolution);

        if let Some(outline) = &board.outline {
            let margin = blocked_radius as f64 * board.resolution;
            for y in 0..h {
                for x in 0..w {
                    let p = pti(x, y);
                    let c = g.grid_to_world(p);
                    if !pt_in_polygon(c, outline) {
                        g.block_cell_permanent(p);
                        continue;
                    }
                    let n = outline.len();
                    for i in 0..n {
                        if pt_seg_dist(c, outline[i], outline[(i + 1) % n]) <= margin {
                            g.block_cell_permanent(p);
                            break;
                        }
                    }
                }
            }
        } else {
            for y in 0..h {
                for x in 0..w {
                    if x < blocked_radius
                        || y < blocked_radius
                        || x >= w - blocked_radius
                        || y >= h - blocked_radius
                    {
                        g.block_cell_permanent(pti(x, y));
                    }
                }
            }
        }
        g
    }

    #[must_use]
    pub const fn w(&self) -> i64 {
        self.w
    }

    #[must_use]
    pub const fn h(&self) -> i64 {
        self.h
    }

    #[must_use]
    pub const fn resolution(&self) -> f64 {
        self.resolution
    }

    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_in_bounds(&self, p: PtI) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.w && p.y < self.h
    }

    // Integer encoding of a cell for set membership. Caller ensures bounds.
    #[must_use]
    pub fn idx(&self, p: PtI) -> usize {
        (p.y * self.w + p.x) as usize
    }

    // Out-of-bounds reads as blocked.
    #[must_use]
    pub fn state(&self, p: PtI) -> CellState {
        if !self.is_in_bounds(p) || self.cells[self.idx(p)] & (BLOCKED | PERMANENT) != 0 {
            CellState::Blocked
        } else {
            CellState::Free
        }
    }

    #[must_use]
    pub fn is_free(&self, p: PtI) -> bool {
        self.state(p) == CellState::Free
    }

    #[must_use]
    pub fn is_blocked(&self, p: PtI) -> bool {
        !self.is_free(p)
    }

    #[must_use]
    pub fn is_permanent(&self, p: PtI) -> bool {
        self.is_in_bounds(p) && self.cells[self.idx(p)] & PERMANENT != 0
    }

    pub fn block_cell(&mut self, p: PtI) {
        if self.is_in_bounds(p) {
            let i = self.idx(p);
            self.cells[i] |= BLOCKED;
        }
    }

    // Releasing a permanently blocked cell is a no-op.
    pub fn free_cell(&mut self, p: PtI) {
        if self.is_in_bounds(p) {
            let i = self.idx(p);
            if self.cells[i] & PERMANENT == 0 {
                self.cells[i] &= !BLOCKED;
            }
        }
    }

    pub fn block_cell_permanent(&mut self, p: PtI) {
        if self.is_in_bounds(p) {
            let i = self.idx(p);
            self.cells[i] |= BLOCKED | PERMANENT;
        }
    }

    // Blocks the axis-aligned square of Chebyshev radius |r| around |c|.
    pub fn block_area(&mut self, c: PtI, r: i64) {
        for y in (c.y - r)..=(c.y + r) {
            for x in (c.x - r)..=(c.x + r) {
                self.block_cell(pti(x, y));
            }
        }
    }

    // Permanently blocks every cell whose centre lies within the AABB around
    // |center|, expanded by |extra_cells| cells in each direction.
    pub fn block_rectangular_body(&mut self, center: Pt, half_w: f64, half_h: f64, extra_cells: i64) {
        let pad = extra_cells as f64 * self.resolution;
        let r = Rt::centered(center, half_w, half_h).inflate(pad, pad);
        let lo = self.world_to_grid(r.bl());
        let hi = self.world_to_grid(r.tr()) + pti(1, 1);
        for p in RtI::enclosing(lo, hi).cells() {
            if self.is_in_bounds(p) && r.contains(self.grid_to_world(p)) {
                self.block_cell_permanent(p);
            }
        }
    }

    // Clears every transient block, leaving only permanent ones. Used to
    // reset the grid to its post-placement state between routing attempts.
    pub fn clear_transient(&mut self) {
        for c in &mut self.cells {
            if *c & PERMANENT == 0 {
                *c &= !BLOCKED;
            }
        }
    }

    // Approximate Chebyshev distance to the nearest permanently blocked cell
    // (or the board exterior), scanning expanding rings up to |max|.
    #[must_use]
    pub fn quick_edge_dist(&self, p: PtI, max: i64) -> i64 {
        for r in 0..=max {
            if self.ring_has_permanent(p, r) {
                return r;
            }
        }
        max
    }

    #[must_use]
    pub fn dist_to_edge(&self, p: PtI) -> i64 {
        self.quick_edge_dist(p, 32)
    }

    // Whole-grid Chebyshev distance to the nearest permanently blocked cell,
    // capped at |max|. Multi-source BFS over the 8-neighbourhood; agrees with
    // quick_edge_dist at every cell but costs one pass for the whole grid,
    // which is what the perimeter cost function wants.
    #[must_use]
    pub fn edge_dist_field(&self, max: i64) -> Vec<i64> {
        let mut dist = vec![max; self.cells.len()];
        let mut queue = std::collections::VecDeque::new();
        for y in 0..self.h {
            for x in 0..self.w {
                let p = pti(x, y);
                let i = self.idx(p);
                if self.is_permanent(p) {
                    dist[i] = 0;
                    queue.push_back(p);
                } else if x == 0 || y == 0 || x == self.w - 1 || y == self.h - 1 {
                    // The board exterior counts as permanently blocked.
                    dist[i] = 1i64.min(max);
                    queue.push_back(p);
                }
            }
        }
        while let Some(p) = queue.pop_front() {
            let d = dist[self.idx(p)];
            if d >= max {
                continue;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let n = pti(p.x + dx, p.y + dy);
                    if self.is_in_bounds(n) && dist[self.idx(n)] > d + 1 {
                        dist[self.idx(n)] = d + 1;
                        queue.push_back(n);
                    }
                }
            }
        }
        dist
    }

    fn ring_has_permanent(&self, c: PtI, r: i64) -> bool {
        let perm = |p: PtI| !self.is_in_bounds(p) || self.is_permanent(p);
        if r == 0 {
            return perm(c);
        }
        for x in (c.x - r)..=(c.x + r) {
            if perm(pti(x, c.y - r)) || perm(pti(x, c.y + r)) {
                return true;
            }
        }
        for y in (c.y - r + 1)..(c.y + r) {
            if perm(pti(c.x - r, y)) || perm(pti(c.x + r, y)) {
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn world_to_grid(&self, p: Pt) -> PtI {
        pti((p.x / self.resolution).floor() as i64, (p.y / self.resolution).floor() as i64)
    }

    // Cell centre in world coordinates.
    #[must_use]
    pub fn grid_to_world(&self, p: PtI) -> Pt {
        pt((p.x as f64 + 0.5) * self.resolution, (p.y as f64 + 0.5) * self.resolution)
    }
}

// Immutable base grid plus a small overlay of temporary edits. Per-net
// routing queries this instead of mutating the grid, so undoing the scratch
// state is just dropping the view. Temporary blocks take precedence over
// temporary frees; permanent blocks are never overridden.
#[must_use]
#[derive(Debug, Clone)]
pub struct GridView<'a> {
    grid: &'a Grid,
    freed: CellSet,
    blocked: CellSet,
}

impl<'a> GridView<'a> {
    pub fn new(grid: &'a Grid) -> Self {
        let n = grid.num_cells();
        Self { grid, freed: CellSet::new(n), blocked: CellSet::new(n) }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.grid
    }

    pub fn free(&mut self, p: PtI) {
        if self.grid.is_in_bounds(p) {
            self.freed.insert(self.grid.idx(p));
        }
    }

    pub fn block(&mut self, p: PtI) {
        if self.grid.is_in_bounds(p) {
            self.blocked.insert(self.grid.idx(p));
        }
    }

    // Frees |p| and withdraws any earlier overlay block on it. Blocks added
    // afterwards win again.
    pub fn release(&mut self, p: PtI) {
        if self.grid.is_in_bounds(p) {
            let i = self.grid.idx(p);
            self.blocked.remove(i);
            self.freed.insert(i);
        }
    }

    pub fn block_area(&mut self, c: PtI, r: i64) {
        for y in (c.y - r)..=(c.y + r) {
            for x in (c.x - r)..=(c.x + r) {
                self.block(pti(x, y));
            }
        }
    }

    #[must_use]
    pub fn is_free(&self, p: PtI) -> bool {
        if !self.grid.is_in_bounds(p) {
            return false;
        }
        let i = self.grid.idx(p);
        if self.blocked.contains(i) {
            return false;
        }
        if self.freed.contains(i) {
            return !self.grid.is_permanent(p);
        }
        self.grid.is_free(p)
    }
}
