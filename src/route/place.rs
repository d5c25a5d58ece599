use std::collections::HashMap;

use log::warn;

use crate::model::pcb::{
    Battery, Button, Component, Controller, Diode, Pad, Pcb, PinRef, PlacementError, PAD_SIZE,
};
use crate::model::pt::{Pt, PtI};
use crate::model::rt::Rt;
use crate::route::grid::Grid;

// Side length of the square button body.
const BUTTON_BODY: f64 = 6.0;

#[must_use]
#[derive(Debug, Default, Clone)]
pub struct Placement {
    pub pads: Vec<Pad>,
    pub errors: Vec<PlacementError>,
}

// Realises every component: pads become grid anchors, bodies become
// permanently blocked regions. Placement problems are diagnosed but never
// abort routing; the offending cells stay blocked and nearby nets simply
// become harder (or impossible) to route.
pub fn place_components(pcb: &Pcb, grid: &mut Grid, body_keepout_cells: i64) -> Placement {
    let mut p = Placement::default();

    // Bodies first so pad diagnostics see the final permanent state.
    for c in pcb.components() {
        if let Some(body) = component_body(pcb, c) {
            let extra = match c {
                Component::Battery(_) => body_keepout_cells,
                _ => 0,
            };
            grid.block_rectangular_body(body.center(), body.w() / 2.0, body.h() / 2.0, extra);
            let bounds = Rt::new(0.0, 0.0, pcb.board().width, pcb.board().height);
            if !bounds.contains_rt(&body) {
                p.errors.push(PlacementError {
                    component: c.id().to_owned(),
                    reason: "body extends outside the board".to_owned(),
                });
            }
        }
    }

    for c in pcb.components() {
        match c {
            Component::Button(b) => place_button(pcb, grid, b, &mut p),
            Component::Controller(b) => place_controller(pcb, grid, b, &mut p),
            Component::Battery(b) => place_battery(pcb, grid, b, body_keepout_cells, &mut p),
            Component::Diode(b) => place_diode(pcb, grid, b, &mut p),
        }
    }

    diagnose_collisions(&mut p);
    for e in &p.errors {
        warn!("placement: {e}");
    }
    p
}

fn component_body(pcb: &Pcb, c: &Component) -> Option<Rt> {
    match c {
        Component::Button(b) => {
            Some(Rt::centered(b.p, BUTTON_BODY / 2.0, BUTTON_BODY / 2.0))
        }
        Component::Controller(b) => {
            let fp = &pcb.footprints().controller;
            let th = row_height(b.pins.len(), fp.pin_spacing);
            let (half_w, half_h) = ((fp.row_spacing - PAD_SIZE) / 2.0, (th + 2.0 * PAD_SIZE) / 2.0);
            let (half_w, half_h) = match b.rotation {
                crate::model::pcb::Rotation::R0 => (half_w, half_h),
                crate::model::pcb::Rotation::R90 => (half_h, half_w),
            };
            Some(Rt::centered(b.p, half_w, half_h))
        }
        Component::Battery(b) => {
            let fp = &pcb.footprints().battery;
            Some(Rt::centered(b.p, fp.body_width / 2.0, fp.body_height / 2.0))
        }
        Component::Diode(_) => None,
    }
}

// Height of a DIP pin row: the span between the first and last pin of the
// longer (left) row.
fn row_height(num_pins: usize, pin_spacing: f64) -> f64 {
    let left = (num_pins + 1) / 2;
    left.saturating_sub(1) as f64 * pin_spacing
}

fn add_pad(grid: &Grid, out: &mut Placement, pin: PinRef, world: Pt, net: &str, origin: Pt) {
    let cell = grid.world_to_grid(world);
    if !grid.is_in_bounds(cell) || grid.is_permanent(cell) {
        out.errors.push(PlacementError {
            component: pin.component.clone(),
            reason: format!("pad {pin} lies outside the routable area"),
        });
    }
    out.pads.push(Pad { pin, p: cell, net: net.to_owned(), origin });
}

// Four pads at the footprint corners. Upper-left carries the signal,
// lower-right carries ground; the other two corners are not connected but
// still claim keep-out.
fn place_button(pcb: &Pcb, grid: &Grid, b: &Button, out: &mut Placement) {
    let fp = &pcb.footprints().button;
    let (hx, hy) = (fp.pin_spacing_x / 2.0, fp.pin_spacing_y / 2.0);
    let pads = [
        ("A1", -hx, hy, b.signal_net.as_str()),
        ("A2", hx, hy, crate::model::pcb::NC_NET),
        ("B1", -hx, -hy, crate::model::pcb::NC_NET),
        ("B2", hx, -hy, "GND"),
    ];
    for (name, dx, dy, net) in pads {
        let (dx, dy) = b.rotation.apply(dx, dy);
        add_pad(grid, out, PinRef::new(&b.id, name), b.p.offset(dx, dy), net, b.p);
    }
}

// DIP convention: the first ceil(N/2) pins run up the left row, the rest
// come back down the right row.
fn place_controller(pcb: &Pcb, grid: &Grid, c: &Controller, out: &mut Placement) {
    let fp = &pcb.footprints().controller;
    let n = c.pins.len();
    let left = (n + 1) / 2;
    let th = row_height(n, fp.pin_spacing);
    for (i, (pin, net)) in c.pins.iter().enumerate() {
        let (dx, dy) = if i < left {
            (-fp.row_spacing / 2.0, -th / 2.0 + i as f64 * fp.pin_spacing)
        } else {
            (fp.row_spacing / 2.0, -th / 2.0 + (n - 1 - i) as f64 * fp.pin_spacing)
        };
        let (dx, dy) = c.rotation.apply(dx, dy);
        add_pad(grid, out, PinRef::new(&c.id, pin), c.p.offset(dx, dy), net, c.p);
    }
}

// Both terminals sit on a single row below the compartment, clear of its
// keep-out, so the lid stays free of copper.
fn place_battery(pcb: &Pcb, grid: &Grid, b: &Battery, body_keepout_cells: i64, out: &mut Placement) {
    let fp = &pcb.footprints().battery;
    let pad_offset_cells = body_keepout_cells + fp.pad_offset_extra;
    let dy = -(fp.body_height / 2.0 + pad_offset_cells as f64 * grid.resolution());
    add_pad(
        grid,
        out,
        PinRef::new(&b.id, "VCC"),
        b.p.offset(-fp.pad_spacing / 2.0, dy),
        "VCC",
        b.p,
    );
    add_pad(grid, out, PinRef::new(&b.id, "GND"), b.p.offset(fp.pad_spacing / 2.0, dy), "GND", b.p);
}

fn place_diode(pcb: &Pcb, grid: &Grid, d: &Diode, out: &mut Placement) {
    let fp = &pcb.footprints().diode;
    add_pad(
        grid,
        out,
        PinRef::new(&d.id, "A"),
        d.p.offset(-fp.pad_spacing / 2.0, 0.0),
        &d.signal_net,
        d.p,
    );
    add_pad(grid, out, PinRef::new(&d.id, "K"), d.p.offset(fp.pad_spacing / 2.0, 0.0), "GND", d.p);
}

// Two pads on the same cell cannot both be reached. Reported once per
// component involved.
fn diagnose_collisions(p: &mut Placement) {
    let mut seen: HashMap<PtI, &Pad> = HashMap::new();
    let mut flagged: Vec<String> = Vec::new();
    for pad in &p.pads {
        if let Some(other) = seen.get(&pad.p) {
            for id in [&pad.pin.component, &other.pin.component] {
                if !flagged.contains(id) {
                    flagged.push(id.clone());
                }
            }
        } else {
            seen.insert(pad.p, pad);
        }
    }
    for component in flagged {
        p.errors.push(PlacementError {
            component,
            reason: "pads collide with another component".to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pcb::{
        Board, Constraints, Footprints, NetClass, Rotation,
    };
    use crate::model::pt::{pt, pti};

    fn pcb(components: Vec<Component>) -> Pcb {
        let board = Board { width: 40.0, height: 40.0, resolution: 1.0, outline: None };
        let mut footprints = Footprints::default();
        footprints.controller.pin_spacing = 2.0;
        footprints.controller.row_spacing = 6.0;
        footprints.button.pin_spacing_x = 9.0;
        footprints.button.pin_spacing_y = 6.0;
        let mut pcb = Pcb::new(board, Constraints::default(), footprints);
        for c in components {
            pcb.add_component(c);
        }
        pcb
    }

    fn grid_for(pcb: &Pcb) -> Grid {
        Grid::from_board(pcb.board(), 1)
    }

    #[test]
    fn test_controller_dip_layout() {
        let pcb = pcb(vec![Component::Controller(Controller {
            id: "U1".into(),
            p: pt(20.0, 20.0),
            pins: vec![
                ("P1".into(), "A".into()),
                ("P2".into(), "B".into()),
                ("P3".into(), "C".into()),
                ("P4".into(), "D".into()),
            ],
            rotation: Rotation::R0,
        })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        assert!(p.errors.is_empty());
        // Left row bottom-up: P1, P2. Right row comes back down: P3 above P4.
        assert_eq!(p.pads[0].p, pti(17, 19));
        assert_eq!(p.pads[1].p, pti(17, 21));
        assert_eq!(p.pads[2].p, pti(23, 21));
        assert_eq!(p.pads[3].p, pti(23, 19));
        // The package interior is permanently blocked.
        assert!(grid.is_permanent(pti(20, 20)));
        // The pads themselves are not.
        assert!(!grid.is_permanent(pti(17, 19)));
    }

    #[test]
    fn test_button_pads() {
        let pcb = pcb(vec![Component::Button(Button {
            id: "BTN1".into(),
            p: pt(20.0, 20.0),
            signal_net: "SIG1".into(),
            rotation: Rotation::R0,
        })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        let by_pin: Vec<_> = p.pads.iter().map(|v| (v.pin.pin.as_str(), v.net.as_str())).collect();
        assert_eq!(by_pin, vec![("A1", "SIG1"), ("A2", "NC"), ("B1", "NC"), ("B2", "GND")]);
        // Upper-left signal pad.
        assert_eq!(p.pads[0].p, pti(15, 23));
        // Body blocked, pads clear of it.
        assert!(grid.is_permanent(pti(20, 20)));
        assert!(!grid.is_permanent(p.pads[0].p));
        assert_eq!(NetClass::from_name(&p.pads[3].net), NetClass::Gnd);
    }

    #[test]
    fn test_battery_pads_below_body() {
        let pcb = pcb(vec![Component::Battery(Battery { id: "BAT1".into(), p: pt(20.0, 25.0) })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        assert_eq!(p.pads.len(), 2);
        assert_eq!(p.pads[0].net, "VCC");
        assert_eq!(p.pads[1].net, "GND");
        assert!(p.pads[0].p.x < p.pads[1].p.x);
        // Pads sit below the body keep-out.
        for pad in &p.pads {
            assert!(!grid.is_permanent(pad.p), "pad {} buried in keep-out", pad.pin);
            assert!(grid.grid_to_world(pad.p).y < 25.0 - 6.0);
        }
    }

    #[test]
    fn test_diode_pads() {
        let pcb = pcb(vec![Component::Diode(Diode {
            id: "D1".into(),
            p: pt(20.0, 20.0),
            signal_net: "ROW1".into(),
        })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        assert_eq!(p.pads[0].net, "ROW1");
        assert_eq!(p.pads[1].net, "GND");
        assert_eq!(p.pads[0].pin.to_string(), "D1.A");
        assert!(p.pads[0].p.x < p.pads[1].p.x);
    }

    #[test]
    fn test_body_outside_board() {
        let pcb = pcb(vec![Component::Battery(Battery { id: "BAT1".into(), p: pt(3.0, 3.0) })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        assert!(p.errors.iter().any(|e| e.component == "BAT1"));
    }

    #[test]
    fn test_pad_collision() {
        let pcb = pcb(vec![
            Component::Diode(Diode { id: "D1".into(), p: pt(20.0, 20.0), signal_net: "A".into() }),
            Component::Diode(Diode { id: "D2".into(), p: pt(20.0, 20.0), signal_net: "B".into() }),
        ]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        assert!(p.errors.iter().any(|e| e.component == "D1"));
        assert!(p.errors.iter().any(|e| e.component == "D2"));
        // Reported once per component.
        assert_eq!(p.errors.len(), 2);
    }

    #[test]
    fn test_rotated_button() {
        let pcb = pcb(vec![Component::Button(Button {
            id: "BTN1".into(),
            p: pt(20.0, 20.0),
            signal_net: "SIG1".into(),
            rotation: Rotation::R90,
        })]);
        let mut grid = grid_for(&pcb);
        let p = place_components(&pcb, &mut grid, 2);
        // (-4.5, 3.0) rotates to (-3.0, -4.5).
        assert_eq!(p.pads[0].p, pti(17, 15));
    }
}
