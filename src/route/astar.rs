use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::NotNan;

use crate::model::pt::{pti, PtI};
use crate::route::grid::{CellSet, GridView};

// Extra cost for changing direction. Point-to-point searches prefer very
// straight runs; tree searches are allowed to bend more so they can wrap
// around existing copper.
const POINT_TURN_PENALTY: f64 = 10.0;
const TREE_TURN_PENALTY: f64 = 5.0;

// Neighbour order: right, left, down, up.
const DIRS: [PtI; 4] = [PtI::new(1, 0), PtI::new(-1, 0), PtI::new(0, -1), PtI::new(0, 1)];
const NO_DIR: u8 = 4;

pub type CellCost<'a> = dyn Fn(PtI) -> f64 + 'a;

// Minimum-cost orthogonal path from |src| to |sink|. Fast-paths the two
// L-shaped routes when one is fully free; otherwise falls back to A*. The
// sink is admissible even if blocked so a search can terminate on a pad
// whose centre cell carries keep-out bookkeeping.
#[must_use]
pub fn find_path(view: &GridView<'_>, src: PtI, sink: PtI) -> Option<Vec<PtI>> {
    for corner in [pti(sink.x, src.y), pti(src.x, sink.y)] {
        let path = l_path(src, corner, sink);
        if path.iter().all(|&p| view.is_free(p)) {
            return Some(path);
        }
    }
    astar(view, src, &Target::Point(sink), POINT_TURN_PENALTY, None)
}

// Least-cost path from |src| to any cell of |tree|. Returns just the source
// when it is already part of the tree.
#[must_use]
pub fn find_path_to_tree(
    view: &GridView<'_>,
    src: PtI,
    tree: &[PtI],
    cell_cost: Option<&CellCost<'_>>,
) -> Option<Vec<PtI>> {
    if tree.is_empty() {
        return None;
    }
    let grid = view.grid();
    let mut members = CellSet::new(grid.num_cells());
    for &p in tree {
        if grid.is_in_bounds(p) {
            members.insert(grid.idx(p));
        }
    }
    if grid.is_in_bounds(src) && members.contains(grid.idx(src)) {
        return Some(vec![src]);
    }
    astar(view, src, &Target::Tree(tree, members), TREE_TURN_PENALTY, cell_cost)
}

enum Target<'a> {
    Point(PtI),
    Tree(&'a [PtI], CellSet),
}

impl Target<'_> {
    fn heuristic(&self, p: PtI) -> f64 {
        match self {
            Target::Point(sink) => p.manhattan_dist(*sink) as f64,
            Target::Tree(cells, _) => {
                cells.iter().map(|&c| p.manhattan_dist(c)).min().unwrap_or(0) as f64
            }
        }
    }

    fn is_goal(&self, idx: usize, p: PtI) -> bool {
        match self {
            Target::Point(sink) => p == *sink,
            Target::Tree(_, members) => members.contains(idx),
        }
    }

    // Whether |p| may be stepped onto even when blocked.
    fn blocked_goal_ok(&self, p: PtI) -> bool {
        match self {
            Target::Point(sink) => p == *sink,
            Target::Tree(..) => false,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Node {
    f: NotNan<f64>,
    seq: u64,
    g: f64,
    p: PtI,
    dir: u8,
    prev: u32,
}

impl PartialEq for Node {
    fn eq(&self, o: &Self) -> bool {
        self.f == o.f && self.seq == o.seq
    }
}

impl Eq for Node {}

impl PartialOrd for Node {
    fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
        Some(self.cmp(o))
    }
}

impl Ord for Node {
    fn cmp(&self, o: &Self) -> Ordering {
        // Reversed so the max-heap pops the lowest f; among equal f the
        // earlier-enqueued entry wins.
        o.f.cmp(&self.f).then_with(|| o.seq.cmp(&self.seq))
    }
}

fn astar(
    view: &GridView<'_>,
    src: PtI,
    target: &Target<'_>,
    turn_penalty: f64,
    cell_cost: Option<&CellCost<'_>>,
) -> Option<Vec<PtI>> {
    let grid = view.grid();
    if !grid.is_in_bounds(src) {
        return None;
    }
    let n = grid.num_cells();
    let mut open = BinaryHeap::new();
    let mut closed = CellSet::new(n);
    let mut g_score = vec![f64::INFINITY; n];
    let mut parent = vec![u32::MAX; n];
    let mut seq: u64 = 0;

    let f0 = NotNan::new(target.heuristic(src)).ok()?;
    g_score[grid.idx(src)] = 0.0;
    open.push(Node { f: f0, seq, g: 0.0, p: src, dir: NO_DIR, prev: u32::MAX });

    while let Some(node) = open.pop() {
        let idx = grid.idx(node.p);
        if closed.contains(idx) {
            continue; // Lazy deletion: a cheaper entry was already expanded.
        }
        closed.insert(idx);
        parent[idx] = node.prev;

        if target.is_goal(idx, node.p) {
            return Some(reconstruct(grid.w(), &parent, idx));
        }

        for (d, &dir) in DIRS.iter().enumerate() {
            let np = node.p + dir;
            if !grid.is_in_bounds(np) {
                continue;
            }
            let nidx = grid.idx(np);
            if closed.contains(nidx) {
                continue;
            }
            if !view.is_free(np) && !target.blocked_goal_ok(np) {
                continue;
            }
            let mut step = 1.0;
            if node.dir != NO_DIR && node.dir != d as u8 {
                step += turn_penalty;
            }
            if let Some(cost) = cell_cost {
                step += cost(np);
            }
            let ng = node.g + step;
            if ng < g_score[nidx] {
                g_score[nidx] = ng;
                seq += 1;
                let nf = NotNan::new(ng + target.heuristic(np)).ok()?;
                open.push(Node { f: nf, seq, g: ng, p: np, dir: d as u8, prev: idx as u32 });
            }
        }
    }
    None
}

fn reconstruct(w: i64, parent: &[u32], goal: usize) -> Vec<PtI> {
    let mut path = Vec::new();
    let mut idx = goal;
    loop {
        path.push(pti(idx as i64 % w, idx as i64 / w));
        let prev = parent[idx];
        if prev == u32::MAX {
            break;
        }
        idx = prev as usize;
    }
    path.reverse();
    path
}

// Cells from |src| through |corner| to |sink| inclusive, following the two
// axis-aligned legs.
fn l_path(src: PtI, corner: PtI, sink: PtI) -> Vec<PtI> {
    let mut path = straight(src, corner);
    path.pop();
    path.extend(straight(corner, sink));
    path
}

fn straight(a: PtI, b: PtI) -> Vec<PtI> {
    let mut path = vec![a];
    let d = pti((b.x - a.x).signum(), (b.y - a.y).signum());
    let mut p = a;
    while p != b {
        p += d;
        path.push(p);
    }
    path
}
