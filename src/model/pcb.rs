use derive_more::Display;

use crate::model::pt::{Pt, PtI};

// File-format independent representation of a single-layer PCB design.
// Units are in millimetres. All copper lives on one layer; traces are
// orthogonal paths of grid cells realised as conductive ink.

// Net name marking a pad that must never be connected.
pub const NC_NET: &str = "NC";

// Radius of the round pad land in the generated output geometry.
pub const PAD_RADIUS: f64 = 1.0;

// Pad land diameter, used when sizing component body keep-outs.
pub const PAD_SIZE: f64 = 2.0 * PAD_RADIUS;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Board {
    pub width: f64,
    pub height: f64,
    pub resolution: f64, // mm per grid cell.
    pub outline: Option<Vec<Pt>>,
}

impl Board {
    #[must_use]
    pub fn grid_size(&self) -> (i64, i64) {
        ((self.width / self.resolution).ceil() as i64, (self.height / self.resolution).ceil() as i64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    pub trace_width: f64,
    pub trace_clearance: f64,
}

impl Constraints {
    // Board-edge keep-out in cells: half a trace plus clearance must fit.
    #[must_use]
    pub fn blocked_radius(&self, resolution: f64) -> i64 {
        ((self.trace_width / 2.0 + self.trace_clearance) / resolution).ceil() as i64
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self { trace_width: 1.2, trace_clearance: 1.5 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonFootprint {
    pub pin_spacing_x: f64,
    pub pin_spacing_y: f64,
}

impl Default for ButtonFootprint {
    fn default() -> Self {
        Self { pin_spacing_x: 9.0, pin_spacing_y: 6.0 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerFootprint {
    pub pin_spacing: f64, // Pin pitch within a row.
    pub row_spacing: f64, // Distance between the two rows.
}

impl Default for ControllerFootprint {
    fn default() -> Self {
        Self { pin_spacing: 2.54, row_spacing: 7.62 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatteryFootprint {
    pub pad_spacing: f64,
    pub body_width: f64,
    pub body_height: f64,
    // Extra cells between the body keep-out and the pad row.
    pub pad_offset_extra: i64,
}

impl Default for BatteryFootprint {
    fn default() -> Self {
        Self { pad_spacing: 10.0, body_width: 12.0, body_height: 12.0, pad_offset_extra: 5 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiodeFootprint {
    pub pad_spacing: f64,
}

impl Default for DiodeFootprint {
    fn default() -> Self {
        Self { pad_spacing: 7.62 }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Footprints {
    pub button: ButtonFootprint,
    pub controller: ControllerFootprint,
    pub battery: BatteryFootprint,
    pub diode: DiodeFootprint,
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub enum Rotation {
    #[default]
    R0,
    R90,
}

impl Rotation {
    // Rotates a centre-relative offset counterclockwise.
    #[must_use]
    pub fn apply(&self, dx: f64, dy: f64) -> (f64, f64) {
        match self {
            Rotation::R0 => (dx, dy),
            Rotation::R90 => (-dy, dx),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Button {
    pub id: String,
    pub p: Pt,
    pub signal_net: String,
    pub rotation: Rotation,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Controller {
    pub id: String,
    pub p: Pt,
    // Pin name to net name, in pin order (DIP numbering).
    pub pins: Vec<(String, String)>,
    pub rotation: Rotation,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Battery {
    pub id: String,
    pub p: Pt,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diode {
    pub id: String,
    pub p: Pt,
    pub signal_net: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Button(Button),
    Controller(Controller),
    Battery(Battery),
    Diode(Diode),
}

impl Component {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Component::Button(c) => &c.id,
            Component::Controller(c) => &c.id,
            Component::Battery(c) => &c.id,
            Component::Diode(c) => &c.id,
        }
    }

    #[must_use]
    pub fn p(&self) -> Pt {
        match self {
            Component::Button(c) => c.p,
            Component::Controller(c) => c.p,
            Component::Battery(c) => c.p,
            Component::Diode(c) => c.p,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Display)]
#[display(fmt = "{}.{}", component, pin)]
pub struct PinRef {
    pub component: String,
    pub pin: String,
}

impl PinRef {
    #[must_use]
    pub fn new(component: &str, pin: &str) -> Self {
        Self { component: component.to_owned(), pin: pin.to_owned() }
    }
}

// The grid cell anchoring a component pin, generated deterministically from
// the component position and footprint.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pad {
    pub pin: PinRef,
    pub p: PtI,     // Centre cell.
    pub net: String,
    pub origin: Pt, // Component centre, for diagnostics.
}

impl Pad {
    #[must_use]
    pub fn is_nc(&self) -> bool {
        self.net == NC_NET
    }
}

#[derive(Debug, Hash, enumset::EnumSetType, strum::EnumString, strum::Display)]
pub enum NetClass {
    #[strum(serialize = "SIGNAL")]
    Signal,
    #[strum(serialize = "GND")]
    Gnd,
    #[strum(serialize = "VCC")]
    Vcc,
}

impl NetClass {
    #[must_use]
    pub fn from_name(net: &str) -> NetClass {
        use std::str::FromStr;
        NetClass::from_str(net).unwrap_or(NetClass::Signal)
    }

    // Routing priority: signals claim the interior before power fills the rim.
    #[must_use]
    pub fn rank(&self) -> u8 {
        match self {
            NetClass::Signal => 0,
            NetClass::Gnd => 1,
            NetClass::Vcc => 2,
        }
    }
}

// The equivalence class of all pads sharing a net name.
#[derive(Debug, Clone, PartialEq)]
pub struct Net {
    pub name: String,
    pub class: NetClass,
    pub pads: Vec<Pad>,
    // Minimum spanning tree length over pad centres in cells. Used only to
    // order nets, not to route them.
    pub mst_len: i64,
}

// An orthogonal path of cells connecting two pads of a single net.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trace {
    pub net: String,
    pub path: Vec<PtI>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedNet {
    pub net: String,
    pub source_pin: String,
    pub destination_pin: String,
    pub reason: String,
}

#[must_use]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RoutingResult {
    pub success: bool,
    pub traces: Vec<Trace>,
    pub failed: Vec<FailedNet>,
}

#[derive(Debug, Clone, PartialEq, Display)]
#[display(fmt = "{}: {}", component, reason)]
pub struct PlacementError {
    pub component: String,
    pub reason: String,
}

// Describes an overall PCB design: the board, its manufacturing constraints,
// the footprint library and the placed components.
#[must_use]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pcb {
    board: Board,
    constraints: Constraints,
    footprints: Footprints,
    components: Vec<Component>,
}

impl Pcb {
    pub fn new(board: Board, constraints: Constraints, footprints: Footprints) -> Self {
        Self { board, constraints, footprints, components: Vec::new() }
    }

    pub fn add_component(&mut self, c: Component) {
        self.components.push(c);
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    #[must_use]
    pub fn footprints(&self) -> &Footprints {
        &self.footprints
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }
}
