use eyre::{bail, ensure, eyre, Result};

use crate::io::types::{CellDoc, ControllerDoc, FailedNetDoc, InputDoc, ResultDoc, TraceDoc};
use crate::model::math::eq;
use crate::model::pcb::{
    Battery, BatteryFootprint, Board, Button, ButtonFootprint, Component, Constraints, Controller,
    ControllerFootprint, Diode, DiodeFootprint, Footprints, Pcb, Rotation, RoutingResult,
};
use crate::model::pt::{pt, Pt};
use crate::route::router::RouterConfig;

// Validates the input document and builds the PCB model plus the router
// configuration. All input problems surface here, before the engine runs.
pub fn parse_input(json: &str) -> Result<(Pcb, RouterConfig)> {
    let doc: InputDoc = serde_json::from_str(json)?;
    doc_to_pcb(&doc)
}

pub fn doc_to_pcb(doc: &InputDoc) -> Result<(Pcb, RouterConfig)> {
    let b = &doc.board;
    ensure_positive("boardWidth", b.board_width)?;
    ensure_positive("boardHeight", b.board_height)?;
    ensure_positive("gridResolution", b.grid_resolution)?;
    ensure_positive("traceWidth", doc.manufacturing.trace_width)?;
    ensure_finite("traceClearance", doc.manufacturing.trace_clearance)?;

    let outline = match &b.board_outline {
        Some(pts) => {
            ensure!(pts.len() >= 3, "boardOutline needs at least 3 vertices, got {}", pts.len());
            let outline: Vec<Pt> = pts.iter().map(|&[x, y]| pt(x, y)).collect();
            for v in &outline {
                ensure!(v.is_finite(), "boardOutline vertex {v} is not finite");
                ensure!(
                    v.x >= 0.0 && v.x <= b.board_width && v.y >= 0.0 && v.y <= b.board_height,
                    "boardOutline vertex {v} lies outside the board"
                );
            }
            Some(outline)
        }
        None => None,
    };

    let board = Board {
        width: b.board_width,
        height: b.board_height,
        resolution: b.grid_resolution,
        outline,
    };
    let constraints = Constraints {
        trace_width: doc.manufacturing.trace_width,
        trace_clearance: doc.manufacturing.trace_clearance,
    };

    let f = &doc.footprints;
    let battery_defaults = BatteryFootprint::default();
    let footprints = Footprints {
        button: ButtonFootprint {
            pin_spacing_x: f.button.pin_spacing_x,
            pin_spacing_y: f.button.pin_spacing_y,
        },
        controller: ControllerFootprint {
            pin_spacing: f.controller.pin_spacing,
            row_spacing: f.controller.row_spacing,
        },
        battery: match &f.battery {
            Some(v) => BatteryFootprint {
                pad_spacing: v.pad_spacing,
                body_width: v.body_width.unwrap_or(battery_defaults.body_width),
                body_height: v.body_height.unwrap_or(battery_defaults.body_height),
                pad_offset_extra: v.pad_offset_extra.unwrap_or(battery_defaults.pad_offset_extra),
            },
            None => battery_defaults,
        },
        diode: match &f.diode {
            Some(v) => DiodeFootprint { pad_spacing: v.pad_spacing },
            None => DiodeFootprint::default(),
        },
    };

    let mut pcb = Pcb::new(board, constraints, footprints);
    for v in &doc.placement.buttons {
        ensure_position(&v.id, v.x, v.y)?;
        pcb.add_component(Component::Button(Button {
            id: v.id.clone(),
            p: pt(v.x, v.y),
            signal_net: v.net.clone(),
            rotation: parse_rotation(&v.id, v.rotation)?,
        }));
    }
    for v in &doc.placement.controllers {
        ensure_position(&v.id, v.x, v.y)?;
        pcb.add_component(Component::Controller(Controller {
            id: v.id.clone(),
            p: pt(v.x, v.y),
            pins: parse_pins(v)?,
            rotation: parse_rotation(&v.id, v.rotation)?,
        }));
    }
    for v in &doc.placement.batteries {
        ensure_position(&v.id, v.x, v.y)?;
        pcb.add_component(Component::Battery(Battery { id: v.id.clone(), p: pt(v.x, v.y) }));
    }
    for v in &doc.placement.diodes {
        ensure_position(&v.id, v.x, v.y)?;
        pcb.add_component(Component::Diode(Diode {
            id: v.id.clone(),
            p: pt(v.x, v.y),
            signal_net: v.net.clone(),
        }));
    }

    let mut cfg = RouterConfig::default();
    if let Some(n) = doc.max_attempts {
        ensure!(n > 0, "maxAttempts must be positive");
        cfg.max_ripup_attempts = n;
    }
    Ok((pcb, cfg))
}

pub fn result_to_doc(res: &RoutingResult) -> ResultDoc {
    ResultDoc {
        success: res.success,
        traces: res
            .traces
            .iter()
            .map(|t| TraceDoc {
                net: t.net.clone(),
                path: t.path.iter().map(|c| CellDoc { x: c.x, y: c.y }).collect(),
            })
            .collect(),
        failed_nets: res
            .failed
            .iter()
            .map(|f| FailedNetDoc {
                net_name: f.net.clone(),
                source_pin: f.source_pin.clone(),
                destination_pin: f.destination_pin.clone(),
                reason: f.reason.clone(),
            })
            .collect(),
    }
}

fn parse_pins(doc: &ControllerDoc) -> Result<Vec<(String, String)>> {
    let mut pins = Vec::with_capacity(doc.pins.len());
    for (pin, net) in &doc.pins {
        let net = net
            .as_str()
            .ok_or_else(|| eyre!("controller {}: pin {pin} net must be a string", doc.id))?;
        pins.push((pin.clone(), net.to_owned()));
    }
    ensure!(!pins.is_empty(), "controller {} has no pins", doc.id);
    Ok(pins)
}

fn parse_rotation(id: &str, rotation: Option<f64>) -> Result<Rotation> {
    match rotation {
        None => Ok(Rotation::R0),
        Some(r) if eq(r, 0.0) => Ok(Rotation::R0),
        Some(r) if eq(r, 90.0) => Ok(Rotation::R90),
        Some(r) => bail!("component {id}: unsupported rotation {r} (use 0 or 90)"),
    }
}

fn ensure_finite(name: &str, v: f64) -> Result<()> {
    ensure!(v.is_finite(), "{name} must be finite, got {v}");
    Ok(())
}

fn ensure_positive(name: &str, v: f64) -> Result<()> {
    ensure_finite(name, v)?;
    ensure!(v > 0.0, "{name} must be positive, got {v}");
    Ok(())
}

fn ensure_position(id: &str, x: f64, y: f64) -> Result<()> {
    ensure!(x.is_finite() && y.is_finite(), "component {id} position is not finite");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pcb::NetClass;
    use crate::route::router::Router;

    const DOC: &str = r#"{
        "board": { "boardWidth": 40.0, "boardHeight": 40.0, "gridResolution": 0.5 },
        "manufacturing": { "traceWidth": 1.2, "traceClearance": 1.5 },
        "footprints": {
            "button": { "pinSpacingX": 9.0, "pinSpacingY": 6.0 },
            "controller": { "pinSpacing": 2.54, "rowSpacing": 7.62 },
            "battery": { "padSpacing": 10.0, "bodyWidth": 12.0, "bodyHeight": 12.0 },
            "diode": { "padSpacing": 7.62 }
        },
        "placement": {
            "buttons": [ { "id": "BTN", "x": 10.0, "y": 20.0, "net": "SIG1" } ],
            "controllers": [
                { "id": "CTRL", "x": 30.0, "y": 20.0, "pins": { "PD1": "SIG1", "PD2": "SIG2" } }
            ]
        },
        "maxAttempts": 12
    }"#;

    #[test]
    fn test_parse_round_trip() {
        let (pcb, cfg) = parse_input(DOC).unwrap();
        assert_eq!(pcb.components().len(), 2);
        assert_eq!(cfg.max_ripup_attempts, 12);
        let Component::Controller(c) = &pcb.components()[1] else { panic!() };
        // Document order of the pin mapping is preserved.
        assert_eq!(c.pins[0], ("PD1".to_owned(), "SIG1".to_owned()));
        assert_eq!(c.pins[1], ("PD2".to_owned(), "SIG2".to_owned()));
    }

    #[test]
    fn test_parse_and_route() {
        let (pcb, cfg) = parse_input(DOC).unwrap();
        let mut router = Router::with_config(pcb, cfg);
        let res = router.route();
        assert!(res.success);
        let doc = result_to_doc(&res);
        assert!(doc.success);
        assert_eq!(doc.traces.len(), 1);
        assert_eq!(doc.traces[0].net, "SIG1");
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"failedNets\":[]"));
    }

    #[test]
    fn test_outline_too_short() {
        let doc = DOC.replace(
            "\"gridResolution\": 0.5 }",
            "\"gridResolution\": 0.5, \"boardOutline\": [[0,0],[40,0]] }",
        );
        assert!(parse_input(&doc).is_err());
    }

    #[test]
    fn test_outline_vertex_outside_board() {
        let doc = DOC.replace(
            "\"gridResolution\": 0.5 }",
            "\"gridResolution\": 0.5, \"boardOutline\": [[0,0],[80,0],[0,40]] }",
        );
        assert!(parse_input(&doc).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let doc = DOC.replace("\"boardWidth\": 40.0", "\"boardWidth\": -5.0");
        assert!(parse_input(&doc).is_err());
    }

    #[test]
    fn test_bad_rotation_rejected() {
        let doc = DOC.replace("\"net\": \"SIG1\" }", "\"net\": \"SIG1\", \"rotation\": 45.0 }");
        assert!(parse_input(&doc).is_err());
    }

    #[test]
    fn test_missing_field_rejected() {
        let doc = DOC.replace("\"manufacturing\": { \"traceWidth\": 1.2, ", "\"manufacturing\": { ");
        assert!(parse_input(&doc).is_err());
    }

    #[test]
    fn test_net_classes_from_doc() {
        let (pcb, _) = parse_input(DOC).unwrap();
        let Component::Button(b) = &pcb.components()[0] else { panic!() };
        assert_eq!(NetClass::from_name(&b.signal_net), NetClass::Signal);
    }
}
