use std::collections::BTreeMap;

use enumset::{enum_set, EnumSet};
use itertools::Itertools;
use log::{debug, info};
use petgraph::algo::min_spanning_tree;
use petgraph::data::Element;
use petgraph::graphmap::UnGraphMap;
use rand::prelude::SliceRandom;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::model::pcb::{FailedNet, Net, NetClass, Pad, Pcb, PlacementError, RoutingResult, Trace};
use crate::model::pt::PtI;
use crate::route::astar::find_path_to_tree;
use crate::route::grid::{CellSet, Grid, GridView};
use crate::route::place::{place_components, Placement};

pub const NO_PATH: &str = "No path found";
pub const POWER_NO_PATH: &str = "Power net could not reach all pads";
pub const NO_PATH_AFTER_RIPUP: &str = "No path found after rip-up attempts";
pub const INTERNAL: &str = "internal";

#[derive(Debug, Clone)]
pub struct RouterConfig {
    // Bound on orderings tried per clearance level.
    pub max_ripup_attempts: usize,
    // Net classes routed with the perimeter cost bias.
    pub perimeter_classes: EnumSet<NetClass>,
    // Enables extra shuffled orderings. Off by default; identical inputs and
    // seed produce identical traces.
    pub shuffle_seed: Option<u64>,
    // Cap for edge-distance scans; also scales the perimeter cost falloff.
    pub edge_cost_radius: i64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_ripup_attempts: 40,
            perimeter_classes: enum_set!(NetClass::Gnd | NetClass::Vcc),
            shuffle_seed: None,
            edge_cost_radius: 12,
        }
    }
}

// Clearances in cells, derived once per design.
#[derive(Debug, Clone, Copy)]
struct Clearances {
    // Keep-out ring applied around component bodies.
    body_keepout_cells: i64,
    // Width of the released approach zone around a net's own pads.
    trace_padding: i64,
    // Normal keep-out between conductors of different nets.
    trace_block_padding: i64,
}

impl Clearances {
    fn derive(pcb: &Pcb) -> Self {
        let res = pcb.board().resolution;
        let pin_spacing = pcb.footprints().controller.pin_spacing;
        Self {
            body_keepout_cells: (pin_spacing / res).round() as i64,
            trace_padding: (pcb.constraints().trace_clearance / res).ceil() as i64,
            trace_block_padding: (pin_spacing / res).round() as i64,
        }
    }

    // Fallback keep-out once the normal one exhausts the attempt budget.
    // Never relaxes below one cell of separation.
    fn relaxed(&self) -> i64 {
        (self.trace_block_padding - 1).max(1)
    }
}

struct NetOutcome {
    traces: Vec<Trace>,
    cells: Vec<PtI>,
    failed: Vec<FailedNet>,
}

#[must_use]
#[derive(Debug, Clone)]
pub struct Router {
    pcb: Pcb,
    cfg: RouterConfig,
    // Post-placement state: permanent blocks only. Cloned per attempt.
    grid: Grid,
    clearances: Clearances,
    pads: Vec<Pad>,
    nets: Vec<Net>,
    placement_errors: Vec<PlacementError>,
    attempts: usize,
}

impl Router {
    pub fn new(pcb: Pcb) -> Self {
        Self::with_config(pcb, RouterConfig::default())
    }

    pub fn with_config(pcb: Pcb, cfg: RouterConfig) -> Self {
        let clearances = Clearances::derive(&pcb);
        let blocked_radius = pcb.constraints().blocked_radius(pcb.board().resolution);
        let mut grid = Grid::from_board(pcb.board(), blocked_radius);
        let Placement { pads, errors } =
            place_components(&pcb, &mut grid, clearances.body_keepout_cells);
        let nets = extract_nets(&pads);
        Self { pcb, cfg, grid, clearances, pads, nets, placement_errors: errors, attempts: 0 }
    }

    #[must_use]
    pub fn pcb(&self) -> &Pcb {
        &self.pcb
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[must_use]
    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    #[must_use]
    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    #[must_use]
    pub fn placement_errors(&self) -> &[PlacementError] {
        &self.placement_errors
    }

    // Orderings routed by the last route() call.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    // Routes every net, ripping up and reordering until an attempt connects
    // everything or the budget runs out. Always returns a result; the best
    // failing attempt is reported when no attempt fully succeeds.
    pub fn route(&mut self) -> RoutingResult {
        self.attempts = 0;
        if self.nets.is_empty() {
            return RoutingResult { success: true, traces: Vec::new(), failed: Vec::new() };
        }
        let orderings = self.orderings();
        let paddings = [self.clearances.trace_block_padding, self.clearances.relaxed()];
        let mut best: Option<(Vec<Trace>, Vec<FailedNet>)> = None;

        'search: for (pass, &padding) in paddings.iter().enumerate() {
            if pass == 1 {
                info!("relaxing conductor keep-out to {padding} cells and retrying");
            }
            for order in &orderings {
                self.attempts += 1;
                let (traces, failed) = self.route_attempt(order, padding);
                info!(
                    "attempt {} ({}): {} failed connections",
                    self.attempts,
                    order.iter().join(","),
                    failed.len()
                );
                let solved = failed.is_empty();
                if best.as_ref().map_or(true, |(_, b)| failed.len() < b.len()) {
                    best = Some((traces, failed));
                }
                if solved {
                    break 'search;
                }
            }
        }

        let (traces, mut failed) = best.unwrap_or_default();
        let success = failed.is_empty();
        if !success && self.attempts > 1 {
            for f in &mut failed {
                if f.reason == NO_PATH {
                    f.reason = NO_PATH_AFTER_RIPUP.to_owned();
                }
            }
        }
        RoutingResult { success, traces, failed }
    }

    // Routes all nets once in the given order on a fresh grid.
    fn route_attempt(&self, order: &[String], padding: i64) -> (Vec<Trace>, Vec<FailedNet>) {
        let mut grid = self.grid.clone();
        let mut completed: Vec<(String, Vec<PtI>)> = Vec::new();
        let mut traces = Vec::new();
        let mut failed = Vec::new();
        for name in order {
            let Some(net) = self.nets.iter().find(|n| &n.name == name) else { continue };
            let perimeter = self.cfg.perimeter_classes.contains(net.class);
            let outcome = self.route_net(&mut grid, net, &completed, padding, perimeter);
            completed.push((net.name.clone(), outcome.cells));
            traces.extend(outcome.traces);
            failed.extend(outcome.failed);
        }
        (traces, failed)
    }

    // Connects one net pad by pad: each step searches from every unconnected
    // pad to the tree routed so far and commits the shortest path found.
    fn route_net(
        &self,
        grid: &mut Grid,
        net: &Net,
        completed: &[(String, Vec<PtI>)],
        padding: i64,
        perimeter: bool,
    ) -> NetOutcome {
        let pads = &net.pads;
        let edge_dist = if perimeter {
            Some(grid.edge_dist_field(self.cfg.edge_cost_radius))
        } else {
            None
        };
        // Power nets anchor at the pad nearest the board edge so the tree
        // grows along the rim.
        let anchor = if perimeter {
            (0..pads.len())
                .min_by_key(|&i| grid.quick_edge_dist(pads[i].p, self.cfg.edge_cost_radius))
                .unwrap_or(0)
        } else {
            0
        };
        let mut routed = vec![pads[anchor].p];
        let mut routed_set = CellSet::new(grid.num_cells());
        if grid.is_in_bounds(pads[anchor].p) {
            routed_set.insert(grid.idx(pads[anchor].p));
        }
        let mut connected = vec![false; pads.len()];
        connected[anchor] = true;
        let mut count = 1;
        let mut traces = Vec::new();
        let mut failed = Vec::new();
        let mut internal = false;

        while count < pads.len() {
            let view = self.scratch_view(grid, net, &routed, completed, padding);
            let mut chosen: Option<(usize, Vec<PtI>)> = None;
            for (i, pad) in pads.iter().enumerate() {
                if connected[i] {
                    continue;
                }
                let path = if let Some(field) = &edge_dist {
                    let g: &Grid = grid;
                    let r = self.cfg.edge_cost_radius;
                    let cost = move |p: PtI| {
                        let d = field[g.idx(p)];
                        if d <= 1 { 0.0 } else { ((d as f64) / (r as f64)).min(1.0) * 8.0 }
                    };
                    find_path_to_tree(&view, pad.p, &routed, Some(&cost))
                } else {
                    find_path_to_tree(&view, pad.p, &routed, None)
                };
                if let Some(path) = path {
                    if chosen.as_ref().map_or(true, |(_, c)| path.len() < c.len()) {
                        chosen = Some((i, path));
                    }
                }
            }

            let Some((i, path)) = chosen else { break };
            if path.windows(2).any(|w| w[0].manhattan_dist(w[1]) != 1) {
                // A produced path must be 4-connected; treat a breach as fatal
                // for the net.
                failed.push(FailedNet {
                    net: net.name.clone(),
                    source_pin: pads[i].pin.to_string(),
                    destination_pin: pads[anchor].pin.to_string(),
                    reason: INTERNAL.to_owned(),
                });
                internal = true;
                break;
            }
            for &c in &path {
                grid.block_cell(c);
                if grid.is_in_bounds(c) {
                    let idx = grid.idx(c);
                    if !routed_set.contains(idx) {
                        routed_set.insert(idx);
                        routed.push(c);
                    }
                }
            }
            debug!("net {}: connected {} with {} cells", net.name, pads[i].pin, path.len());
            traces.push(Trace { net: net.name.clone(), path });
            connected[i] = true;
            count += 1;
        }

        if !internal {
            for (i, pad) in pads.iter().enumerate() {
                if !connected[i] {
                    failed.push(FailedNet {
                        net: net.name.clone(),
                        source_pin: pad.pin.to_string(),
                        destination_pin: pads[anchor].pin.to_string(),
                        reason: if perimeter { POWER_NO_PATH } else { NO_PATH }.to_owned(),
                    });
                }
            }
        }
        NetOutcome { traces, cells: routed, failed }
    }

    // The temporary edits a single tree search runs under. Foreign pads
    // close down, then the committed tree and the net's own pad approaches
    // open back up, then foreign copper closes down for good. The release
    // radius is the larger of the two clearances so a pad keep-out can never
    // strand its own net.
    fn scratch_view<'a>(
        &self,
        grid: &'a Grid,
        net: &Net,
        routed: &[PtI],
        completed: &[(String, Vec<PtI>)],
        padding: i64,
    ) -> GridView<'a> {
        let mut view = GridView::new(grid);
        let own: Vec<PtI> = net.pads.iter().map(|p| p.p).collect();
        let foreign: Vec<PtI> =
            self.pads.iter().filter(|p| p.net != net.name).map(|p| p.p).collect();

        // Square keep-out around every foreign pad, NC pads included. The
        // net's own pad centres are never blocked by it.
        for &f in &foreign {
            for y in (f.y - padding)..=(f.y + padding) {
                for x in (f.x - padding)..=(f.x + padding) {
                    let p = PtI::new(x, y);
                    if !own.contains(&p) {
                        view.block(p);
                    }
                }
            }
        }

        // The committed tree must be enterable so new paths can land on it.
        for &c in routed {
            view.release(c);
        }

        // Approach zones: traces may reach their own pad, but never through
        // cells strictly closer than the keep-out to a foreign pin.
        let release = self.clearances.trace_padding.max(padding);
        for &o in &own {
            for y in (o.y - release)..=(o.y + release) {
                for x in (o.x - release)..=(o.x + release) {
                    let p = PtI::new(x, y);
                    if foreign.iter().all(|f| f.chebyshev_dist(p) >= padding) {
                        view.release(p);
                    }
                }
            }
        }

        // Clearance around committed copper of other nets. Applied last:
        // this one wins even inside approach zones.
        for (name, cells) in completed {
            if name == &net.name {
                continue;
            }
            for &c in cells {
                view.block_area(c, padding);
            }
        }
        view
    }

    // Deterministic enumeration of net orderings: the static priority order,
    // reversals, alphabetical orders, every cyclic rotation of the signal
    // list, the power placement variants, then optional seeded shuffles.
    // De-duplicated, bounded by the attempt budget.
    fn orderings(&self) -> Vec<Vec<String>> {
        let name = |n: &Net| n.name.clone();
        let signals: Vec<String> =
            self.nets.iter().filter(|n| n.class == NetClass::Signal).map(name).collect();
        let gnd: Vec<String> =
            self.nets.iter().filter(|n| n.class == NetClass::Gnd).map(name).collect();
        let vcc: Vec<String> =
            self.nets.iter().filter(|n| n.class == NetClass::Vcc).map(name).collect();
        let powers: Vec<String> = gnd.iter().chain(vcc.iter()).cloned().collect();

        let rev: Vec<String> = signals.iter().rev().cloned().collect();
        let mut alpha = signals.clone();
        alpha.sort();
        let alpha_rev: Vec<String> = alpha.iter().rev().cloned().collect();

        let cat = |parts: &[&[String]]| -> Vec<String> {
            parts.iter().flat_map(|p| p.iter().cloned()).collect()
        };

        let mut orders = vec![
            cat(&[&signals, &powers]),
            cat(&[&rev, &powers]),
            cat(&[&alpha, &powers]),
            cat(&[&alpha_rev, &powers]),
        ];
        for k in 1..signals.len() {
            let mut rot = signals.clone();
            rot.rotate_left(k);
            orders.push(cat(&[&rot, &powers]));
        }
        orders.push(cat(&[&signals, &gnd, &vcc]));
        orders.push(cat(&[&signals, &vcc, &gnd]));
        orders.push(cat(&[&rev, &gnd, &vcc]));
        orders.push(cat(&[&rev, &vcc, &gnd]));

        if let Some(seed) = self.cfg.shuffle_seed {
            let mut rng = SmallRng::seed_from_u64(seed);
            for _ in 0..self.cfg.max_ripup_attempts {
                let mut s = signals.clone();
                s.shuffle(&mut rng);
                orders.push(cat(&[&s, &powers]));
            }
        }

        let mut seen: Vec<String> = Vec::new();
        let mut out: Vec<Vec<String>> = Vec::new();
        for o in orders {
            let key = o.iter().join("\u{1f}");
            if !seen.contains(&key) {
                seen.push(key);
                out.push(o);
            }
        }
        out.truncate(self.cfg.max_ripup_attempts.max(1));
        out
    }
}

// Groups non-NC pads by net name, drops degenerate nets, and measures each
// net's minimum spanning tree for priority ordering.
fn extract_nets(pads: &[Pad]) -> Vec<Net> {
    let mut groups: BTreeMap<String, Vec<Pad>> = BTreeMap::new();
    for pad in pads {
        if !pad.is_nc() {
            groups.entry(pad.net.clone()).or_default().push(pad.clone());
        }
    }
    let mut nets: Vec<Net> = groups
        .into_iter()
        .filter_map(|(name, pads)| {
            if pads.len() < 2 {
                debug!("dropping net {name}: fewer than two pads");
                return None;
            }
            let mst_len = mst_len(&pads);
            let class = NetClass::from_name(&name);
            Some(Net { name, class, pads, mst_len })
        })
        .collect();
    nets.sort_by(|a, b| {
        (a.class.rank(), a.mst_len, &a.name).cmp(&(b.class.rank(), b.mst_len, &b.name))
    });
    nets
}

// Kruskal over the complete pad graph with Manhattan edge weights.
fn mst_len(pads: &[Pad]) -> i64 {
    let mut g: UnGraphMap<usize, i64> = UnGraphMap::new();
    for i in 0..pads.len() {
        g.add_node(i);
    }
    for (i, j) in (0..pads.len()).tuple_combinations() {
        g.add_edge(i, j, pads[i].p.manhattan_dist(pads[j].p));
    }
    min_spanning_tree(&g)
        .filter_map(|e| if let Element::Edge { weight, .. } = e { Some(weight) } else { None })
        .sum()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::pcb::{
        Board, Button, Component, Constraints, Controller, Footprints, PinRef, Rotation,
    };
    use crate::model::pt::{pt, pti, Pt};

    fn board(w: f64, h: f64) -> Board {
        Board { width: w, height: h, resolution: 0.5, outline: None }
    }

    fn button(id: &str, x: f64, y: f64, net: &str) -> Component {
        Component::Button(Button {
            id: id.to_owned(),
            p: pt(x, y),
            signal_net: net.to_owned(),
            rotation: Rotation::R0,
        })
    }

    fn controller(id: &str, x: f64, y: f64, pins: &[(&str, &str)]) -> Component {
        Component::Controller(Controller {
            id: id.to_owned(),
            p: pt(x, y),
            pins: pins.iter().map(|(p, n)| ((*p).to_owned(), (*n).to_owned())).collect(),
            rotation: Rotation::R0,
        })
    }

    fn check_traces(r: &Router, res: &RoutingResult) {
        let grid = r.grid();
        for t in &res.traces {
            for w in t.path.windows(2) {
                assert_eq!(w[0].manhattan_dist(w[1]), 1, "kinked path in {}", t.net);
            }
            for &c in &t.path {
                assert!(grid.is_in_bounds(c), "cell out of bounds in {}", t.net);
                assert!(!grid.is_permanent(c), "trace {} over permanent block at {}", t.net, c);
            }
        }
        // Conductors of different nets keep their distance even under the
        // relaxed fallback. Each path starts on a pad centre, which the
        // approach release allows to sit exactly at the keep-out boundary,
        // so first cells are exempt.
        let relaxed = r.clearances.relaxed();
        for (i, a) in res.traces.iter().enumerate() {
            for b in res.traces.iter().skip(i + 1) {
                if a.net == b.net {
                    continue;
                }
                for &ca in a.path.iter().skip(1) {
                    for &cb in b.path.iter().skip(1) {
                        assert!(
                            ca.chebyshev_dist(cb) > relaxed,
                            "nets {} and {} within {} cells",
                            a.net,
                            b.net,
                            relaxed
                        );
                    }
                }
            }
        }
        // Every net is closed: its pads all lie on one 4-connected blob of
        // its own trace cells.
        for net in r.nets() {
            if !res.success {
                continue;
            }
            let cells: HashSet<PtI> = res
                .traces
                .iter()
                .filter(|t| t.net == net.name)
                .flat_map(|t| t.path.iter().copied())
                .collect();
            for pad in &net.pads {
                assert!(cells.contains(&pad.p), "pad {} not on net {}", pad.pin, net.name);
            }
            let start = *cells.iter().next().unwrap();
            let mut seen = HashSet::from([start]);
            let mut stack = vec![start];
            while let Some(c) = stack.pop() {
                for d in [pti(1, 0), pti(-1, 0), pti(0, 1), pti(0, -1)] {
                    let n = c + d;
                    if cells.contains(&n) && seen.insert(n) {
                        stack.push(n);
                    }
                }
            }
            assert_eq!(seen.len(), cells.len(), "net {} not connected", net.name);
        }
    }

    #[test]
    fn test_two_pad_signal() {
        let mut pcb = Pcb::new(board(40.0, 40.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN", 10.0, 20.0, "SIG1"));
        pcb.add_component(controller("CTRL", 30.0, 20.0, &[("PD1", "SIG1")]));
        let mut r = Router::new(pcb);
        let res = r.route();
        assert!(res.success, "failed: {:?}", res.failed);
        assert_eq!(res.traces.len(), 1);
        assert_eq!(res.traces[0].net, "SIG1");

        let net = &r.nets()[0];
        let pad_cells: HashSet<PtI> = net.pads.iter().map(|p| p.p).collect();
        let path = &res.traces[0].path;
        assert!(pad_cells.contains(path.first().unwrap()));
        assert!(pad_cells.contains(path.last().unwrap()));
        // Endpoints land within half a cell of the true pad positions.
        for pad in &net.pads {
            let world = r.grid().grid_to_world(pad.p);
            let target = match pad.pin.component.as_str() {
                "BTN" => pt(10.0 - 4.5, 20.0 + 3.0),
                _ => pt(30.0 - 7.62 / 2.0, 20.0),
            };
            assert!((world.x - target.x).abs() <= 0.25 + 1e-9);
            assert!((world.y - target.y).abs() <= 0.25 + 1e-9);
        }
        check_traces(&r, &res);
    }

    #[test]
    fn test_unreachable_pad() {
        let pcb = Pcb::new(board(40.0, 40.0), Constraints::default(), Footprints::default());
        let grid = Grid::from_board(pcb.board(), 5);
        let mk = |comp: &str, pin: &str, p: PtI, net: &str| Pad {
            pin: PinRef::new(comp, pin),
            p,
            net: net.to_owned(),
            origin: Pt::zero(),
        };
        // The controller pin is walled in by NC pads one cell away.
        let pads = vec![
            mk("BTN", "A1", pti(20, 40), "SIG1"),
            mk("CTRL", "PD1", pti(60, 40), "SIG1"),
            mk("CTRL", "N1", pti(59, 39), "NC"),
            mk("CTRL", "N2", pti(61, 39), "NC"),
            mk("CTRL", "N3", pti(59, 41), "NC"),
            mk("CTRL", "N4", pti(61, 41), "NC"),
        ];
        let nets = extract_nets(&pads);
        let clearances = Clearances::derive(&pcb);
        let mut r = Router {
            pcb,
            cfg: RouterConfig::default(),
            grid,
            clearances,
            pads,
            nets,
            placement_errors: Vec::new(),
            attempts: 0,
        };
        let res = r.route();
        assert!(!res.success);
        assert_eq!(res.failed.len(), 1);
        assert_eq!(res.failed[0].net, "SIG1");
        assert_eq!(res.failed[0].source_pin, "CTRL.PD1");
        assert_eq!(res.failed[0].destination_pin, "BTN.A1");
        assert_eq!(res.failed[0].reason, NO_PATH_AFTER_RIPUP);
        // Both clearance levels were tried.
        assert!(r.attempts() >= 2);
    }

    #[test]
    fn test_power_hugs_perimeter() {
        let mut pcb = Pcb::new(board(80.0, 40.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN1", 20.0, 10.0, "SIGA"));
        pcb.add_component(button("BTN2", 60.0, 10.0, "SIGB"));
        pcb.add_component(controller("CTRL", 40.0, 8.0, &[("GPIN", "GND")]));
        let mut r = Router::new(pcb);
        let res = r.route();
        assert!(res.success, "failed: {:?}", res.failed);
        // SIGA/SIGB have a single pad each and are dropped; GND remains.
        assert_eq!(r.nets().len(), 1);
        assert_eq!(r.nets()[0].class, NetClass::Gnd);

        let grid = r.grid();
        let cells: Vec<PtI> = res.traces.iter().flat_map(|t| t.path.iter().copied()).collect();
        let near = cells.iter().filter(|&&c| grid.dist_to_edge(c) <= 4).count();
        assert!(
            near * 10 >= cells.len() * 7,
            "only {near} of {} GND cells near the edge",
            cells.len()
        );
        check_traces(&r, &res);
    }

    #[test]
    fn test_multi_net_board() {
        // Two signals, ground and power share one board; the orchestrator may
        // reorder or fall back to the relaxed keep-out, but every net must
        // close and all clearances must hold.
        let mut pcb = Pcb::new(board(80.0, 80.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN1", 20.0, 25.0, "SIG1"));
        pcb.add_component(button("BTN2", 20.0, 55.0, "SIG2"));
        pcb.add_component(controller(
            "CTRL",
            55.0,
            40.0,
            &[("PD1", "SIG1"), ("PD2", "SIG2"), ("X1", "NC"), ("GND", "GND"), ("VCC", "VCC")],
        ));
        pcb.add_component(Component::Battery(crate::model::pcb::Battery {
            id: "BAT".to_owned(),
            p: pt(40.0, 68.0),
        }));
        let mut r = Router::new(pcb);
        let res = r.route();
        assert!(res.success, "failed: {:?}", res.failed);
        assert!(r.attempts() >= 1);
        // SIG1, SIG2, GND, VCC all routed.
        assert_eq!(r.nets().len(), 4);
        check_traces(&r, &res);
    }

    #[test]
    fn test_outline_excluded_pad() {
        // L-shaped outline: the upper right quadrant does not exist. A button
        // placed there is diagnosed and its net reported unroutable.
        let mut b = board(40.0, 40.0);
        b.outline = Some(vec![
            pt(0.0, 0.0),
            pt(40.0, 0.0),
            pt(40.0, 20.0),
            pt(20.0, 20.0),
            pt(20.0, 40.0),
            pt(0.0, 40.0),
        ]);
        let mut pcb = Pcb::new(b, Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN", 30.0, 30.0, "SIG1"));
        pcb.add_component(controller("CTRL", 10.0, 10.0, &[("PD1", "SIG1")]));
        let mut r = Router::new(pcb);
        assert!(
            r.placement_errors().iter().any(|e| e.component == "BTN"),
            "missing diagnosis: {:?}",
            r.placement_errors()
        );
        let res = r.route();
        assert!(!res.success);
        assert!(res.failed.iter().any(|f| f.net == "SIG1"));
    }

    #[test]
    fn test_empty_design() {
        let pcb = Pcb::new(board(40.0, 40.0), Constraints::default(), Footprints::default());
        let mut r = Router::new(pcb);
        let res = r.route();
        assert!(res.success);
        assert!(res.traces.is_empty());
        assert!(res.failed.is_empty());
    }

    #[test]
    fn test_extract_nets() {
        let mk = |comp: &str, p: PtI, net: &str| Pad {
            pin: PinRef::new(comp, "P"),
            p,
            net: net.to_owned(),
            origin: Pt::zero(),
        };
        let pads = vec![
            mk("A", pti(0, 0), "GND"),
            mk("B", pti(10, 0), "GND"),
            mk("C", pti(0, 5), "SIG"),
            mk("D", pti(3, 5), "SIG"),
            mk("E", pti(9, 9), "LONELY"),
            mk("F", pti(1, 1), "NC"),
            mk("G", pti(2, 2), "NC"),
        ];
        let nets = extract_nets(&pads);
        // LONELY has one pad, NC is not a net.
        assert_eq!(nets.len(), 2);
        // Signals order before ground.
        assert_eq!(nets[0].name, "SIG");
        assert_eq!(nets[0].mst_len, 3);
        assert_eq!(nets[1].name, "GND");
        assert_eq!(nets[1].mst_len, 10);
    }

    #[test]
    fn test_mst_len() {
        let mk = |p: PtI| Pad {
            pin: PinRef::new("X", "P"),
            p,
            net: "N".to_owned(),
            origin: Pt::zero(),
        };
        // Chain 0-5-11: MST picks the two short edges, not 0-11.
        let pads = vec![mk(pti(0, 0)), mk(pti(5, 0)), mk(pti(11, 0))];
        assert_eq!(mst_len(&pads), 11);
    }

    #[test]
    fn test_orderings() {
        let mut pcb = Pcb::new(board(80.0, 80.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN1", 20.0, 20.0, "SIG1"));
        pcb.add_component(button("BTN2", 20.0, 50.0, "SIG2"));
        pcb.add_component(controller(
            "CTRL",
            55.0,
            40.0,
            &[("PD1", "SIG1"), ("PD2", "SIG2"), ("GND", "GND")],
        ));
        let r = Router::new(pcb);
        let orders = r.orderings();
        assert!(!orders.is_empty());
        assert!(orders.len() <= r.cfg.max_ripup_attempts);
        // No duplicates.
        let keys: HashSet<String> = orders.iter().map(|o| o.join(",")).collect();
        assert_eq!(keys.len(), orders.len());
        // Every ordering covers every net exactly once.
        for o in &orders {
            assert_eq!(o.len(), r.nets().len());
            let s: HashSet<&String> = o.iter().collect();
            assert_eq!(s.len(), o.len());
        }
        // The first ordering is the static priority order.
        let first = &orders[0];
        assert_eq!(first.last().unwrap(), "GND");
        // A reversed-signals variant exists.
        let rev: Vec<String> = first[..2].iter().rev().cloned().chain(["GND".to_owned()]).collect();
        assert!(orders.contains(&rev));
    }

    #[test]
    fn test_orderings_with_seed_are_deterministic() {
        let mut pcb = Pcb::new(board(80.0, 80.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN1", 20.0, 20.0, "SIG1"));
        pcb.add_component(button("BTN2", 20.0, 50.0, "SIG2"));
        pcb.add_component(button("BTN3", 50.0, 20.0, "SIG3"));
        pcb.add_component(controller(
            "CTRL",
            60.0,
            55.0,
            &[("PD1", "SIG1"), ("PD2", "SIG2"), ("PD3", "SIG3")],
        ));
        let cfg = RouterConfig { shuffle_seed: Some(7), ..RouterConfig::default() };
        let a = Router::with_config(pcb.clone(), cfg.clone()).orderings();
        let b = Router::with_config(pcb, cfg).orderings();
        assert_eq!(a, b);
    }

    #[test]
    fn test_route_determinism() {
        let mut pcb = Pcb::new(board(40.0, 40.0), Constraints::default(), Footprints::default());
        pcb.add_component(button("BTN", 10.0, 20.0, "SIG1"));
        pcb.add_component(controller("CTRL", 30.0, 20.0, &[("PD1", "SIG1")]));
        let a = Router::new(pcb.clone()).route();
        let b = Router::new(pcb).route();
        assert_eq!(a, b);
    }
}
