use std::f64::consts::PI;

use serde::Serialize;

use crate::model::pcb::{Board, Constraints, Pad, Trace, PAD_RADIUS};
use crate::model::pt::{pt, Pt, PtI};
use crate::model::rt::Rt;

// Vertex counts for the round approximations: corners and trace ends get
// coarse caps, pad lands get smoother rings.
const ENDCAP_SEGMENTS: usize = 8;
const PAD_SEGMENTS: usize = 16;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Poly {
    pub pts: Vec<Pt>,
}

// World-space conductor geometry for a routed board: everything in |conductors|
// is copper, everything else is void.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BoardGeometry {
    pub outline: Vec<Pt>,
    pub conductors: Vec<Poly>,
}

// Converts grid-space traces and pads into filled world-space polygons:
// a rectangle per path segment, an endcap per path vertex, a round land per
// pad.
pub fn generate_geometry(
    board: &Board,
    constraints: &Constraints,
    traces: &[Trace],
    pads: &[Pad],
) -> BoardGeometry {
    let outline = board
        .outline
        .clone()
        .unwrap_or_else(|| Rt::new(0.0, 0.0, board.width, board.height).pts().to_vec());

    let mut conductors = Vec::new();
    for trace in traces {
        for seg in trace.path.windows(2) {
            conductors.push(segment_rect(board, seg[0], seg[1], constraints.trace_width));
        }
        for &c in &trace.path {
            conductors.push(ngon(
                cell_centre(board, c),
                constraints.trace_width / 2.0,
                ENDCAP_SEGMENTS,
            ));
        }
    }
    for pad in pads {
        conductors.push(ngon(cell_centre(board, pad.p), PAD_RADIUS, PAD_SEGMENTS));
    }
    BoardGeometry { outline, conductors }
}

// Axis-aligned rectangle of length |a|..|b| and thickness |width|, extruded
// perpendicular to the dominant axis.
pub fn segment_rect(board: &Board, a: PtI, b: PtI, width: f64) -> Poly {
    let wa = cell_centre(board, a);
    let wb = cell_centre(board, b);
    let perp = if (wb.x - wa.x).abs() > (wb.y - wa.y).abs() {
        pt(0.0, width / 2.0)
    } else {
        pt(width / 2.0, 0.0)
    };
    Poly { pts: vec![wa - perp, wb - perp, wb + perp, wa + perp] }
}

fn cell_centre(board: &Board, p: PtI) -> Pt {
    pt((p.x as f64 + 0.5) * board.resolution, (p.y as f64 + 0.5) * board.resolution)
}

fn ngon(centre: Pt, radius: f64, segments: usize) -> Poly {
    let pts = (0..segments)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / segments as f64;
            pt(centre.x + radius * theta.cos(), centre.y + radius * theta.sin())
        })
        .collect();
    Poly { pts }
}
