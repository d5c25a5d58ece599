use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Document model for the design records exchanged with the upstream
// pipeline. Field names follow the wire format; conversion and validation
// into the PCB model live in convert.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDoc {
    pub board: BoardDoc,
    pub manufacturing: ManufacturingDoc,
    pub footprints: FootprintsDoc,
    pub placement: PlacementDoc,
    #[serde(default)]
    pub max_attempts: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDoc {
    pub board_width: f64,
    pub board_height: f64,
    pub grid_resolution: f64,
    #[serde(default)]
    pub board_outline: Option<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingDoc {
    pub trace_width: f64,
    pub trace_clearance: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootprintsDoc {
    pub button: ButtonFootprintDoc,
    pub controller: ControllerFootprintDoc,
    #[serde(default)]
    pub battery: Option<BatteryFootprintDoc>,
    #[serde(default)]
    pub diode: Option<DiodeFootprintDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonFootprintDoc {
    pub pin_spacing_x: f64,
    pub pin_spacing_y: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerFootprintDoc {
    pub pin_spacing: f64,
    pub row_spacing: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryFootprintDoc {
    pub pad_spacing: f64,
    #[serde(default)]
    pub body_width: Option<f64>,
    #[serde(default)]
    pub body_height: Option<f64>,
    #[serde(default)]
    pub pad_offset_extra: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiodeFootprintDoc {
    pub pad_spacing: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDoc {
    #[serde(default)]
    pub buttons: Vec<ButtonDoc>,
    #[serde(default)]
    pub controllers: Vec<ControllerDoc>,
    #[serde(default)]
    pub batteries: Vec<BatteryDoc>,
    #[serde(default)]
    pub diodes: Vec<DiodeDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonDoc {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub net: String,
    #[serde(default)]
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerDoc {
    pub id: String,
    pub x: f64,
    pub y: f64,
    // Pin name to net name; serde_json preserves the document order.
    pub pins: Map<String, Value>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryDoc {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiodeDoc {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub net: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDoc {
    pub success: bool,
    pub traces: Vec<TraceDoc>,
    pub failed_nets: Vec<FailedNetDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceDoc {
    pub net: String,
    pub path: Vec<CellDoc>,
}

// Grid cell coordinates; world positions are (x + 0.5, y + 0.5) times the
// grid resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellDoc {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedNetDoc {
    pub net_name: String,
    pub source_pin: String,
    pub destination_pin: String,
    pub reason: String,
}
