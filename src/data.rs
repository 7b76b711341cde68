//!
//! # Def Data Model
//!
//! The design is a set of per-category entity arenas addressed by typed
//! integer identifiers. Cross-references between entities (instance to net,
//! net to terminal, group to region) are stored as index fields rather than
//! managed pointers; the arena index doubles as the stable numeric identity
//! used by the compact-id naming mode (`I<id>`, `N<id>`, `M<id>`).
//!
//! Writing a design never mutates it; see [crate::write].
//!

// Crates.io Imports
use derive_builder::Builder;
use derive_more::{Add, AddAssign, Sub, SubAssign};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::utils::enumstr;

///
/// # DefDecimal
///
/// Internal type alias for decimal-valued data (REAL-typed property values).
/// Uses [rust_decimal](https://crates.io/crates/rust_decimal) internally.
///
pub type DefDecimal = rust_decimal::Decimal;

/// Database-unit coordinate type. DEF coordinates are integers; the writer
/// rescales them to output units on emission.
pub type Dbu = i64;

// Typed arena indices, one per entity category.
macro_rules! defid {
    ( $(#[$meta: meta])* $name: ident ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema,
            PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        pub struct $name(pub usize);
    };
}
defid!(
    /// Index into [DefDesign::layers]
    DefLayerId
);
defid!(
    /// Index into [DefDesign::masters]
    DefMasterId
);
defid!(
    /// Index into [DefDesign::tech_vias]
    DefTechViaId
);
defid!(
    /// Index into [DefDesign::vias]
    DefViaId
);
defid!(
    /// Index into [DefDesign::non_default_rules]
    DefNdrId
);
defid!(
    /// Index into [DefDesign::regions]
    DefRegionId
);
defid!(
    /// Index into [DefDesign::insts]
    DefInstId
);
defid!(
    /// Index into [DefDesign::iterms]
    DefITermId
);
defid!(
    /// Index into [DefDesign::bterms]
    DefBTermId
);
defid!(
    /// Index into [DefDesign::nets]
    DefNetId
);

/// # Def X-Y Spatial Point
///
/// Integer database-unit coordinates.
/// Supports common mathematical operations (Add, Sub, increment, etc.).
#[derive(
    Clone,
    Copy,
    Default,
    Debug,
    Deserialize,
    Serialize,
    JsonSchema,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Add,
    AddAssign,
    Sub,
    SubAssign,
)]
pub struct DefPoint {
    pub x: Dbu,
    pub y: Dbu,
}
impl DefPoint {
    /// Create a new [DefPoint]
    pub fn new(x: Dbu, y: Dbu) -> Self {
        Self { x, y }
    }
}

/// # Def Rectangle
///
/// Stored min-corner/max-corner. Derived ordering is lexicographic over
/// `(x1, y1, x2, y2)`, used for the deterministic blockage sort.
#[derive(
    Clone,
    Copy,
    Default,
    Debug,
    Deserialize,
    Serialize,
    JsonSchema,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
)]
pub struct DefRect {
    pub x1: Dbu,
    pub y1: Dbu,
    pub x2: Dbu,
    pub y2: Dbu,
}
impl DefRect {
    pub fn new(x1: Dbu, y1: Dbu, x2: Dbu, y2: Dbu) -> Self {
        Self { x1, y1, x2, y2 }
    }
    /// Horizontal span
    pub fn dx(&self) -> Dbu {
        self.x2 - self.x1
    }
    /// Vertical span
    pub fn dy(&self) -> Dbu {
        self.y2 - self.y1
    }
}

/// # Def Octilinear Shape Descriptor
///
/// Two centerline endpoints plus a width, as carried by octilinear
/// special-net segments.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefOct {
    pub center_low: DefPoint,
    pub center_high: DefPoint,
    pub width: Dbu,
}

/// # Def Format Version
///
/// The six supported DEF dialects. Derived ordering is ascending by release,
/// so version gates read as `version >= DefVersion::V5_6`.
#[derive(
    Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum DefVersion {
    V5_3,
    V5_4,
    V5_5,
    V5_6,
    V5_7,
    V5_8,
}
impl std::fmt::Display for DefVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::V5_3 => "5.3",
            Self::V5_4 => "5.4",
            Self::V5_5 => "5.5",
            Self::V5_6 => "5.6",
            Self::V5_7 => "5.7",
            Self::V5_8 => "5.8",
        };
        write!(f, "{}", s)
    }
}
impl Default for DefVersion {
    fn default() -> Self {
        Self::V5_8
    }
}

enumstr!(
    /// # Def Placement Orientations
    ///
    /// Variants are named for the rotation/mirror they apply; string values
    /// are the DEF keywords (N, W, S, E, FN, FE, FS, FW).
    DefOrient {
        R0: "N",
        R90: "W",
        R180: "S",
        R270: "E",
        MY: "FN",
        MYR90: "FE",
        MX: "FS",
        MXR90: "FW",
    }
);
impl Default for DefOrient {
    fn default() -> Self {
        Self::R0
    }
}

enumstr!(
    /// # Def Signal Types, the `USE` classification of nets and pins
    DefSigType {
        Signal: "SIGNAL",
        Power: "POWER",
        Ground: "GROUND",
        Clock: "CLOCK",
        Analog: "ANALOG",
        Reset: "RESET",
        Scan: "SCAN",
        Tieoff: "TIEOFF",
    }
);
impl Default for DefSigType {
    fn default() -> Self {
        Self::Signal
    }
}

enumstr!(
    /// # Def Pin Directions
    DefIoType {
        Input: "INPUT",
        Output: "OUTPUT",
        Inout: "INOUT",
        FeedThru: "FEEDTHRU",
    }
);
impl Default for DefIoType {
    fn default() -> Self {
        Self::Inout
    }
}

enumstr!(
    /// # Def Wire Types, the routing-status keyword of a path or swire
    DefWireType {
        Cover: "COVER",
        Fixed: "FIXED",
        Routed: "ROUTED",
        Shield: "SHIELD",
        NoShield: "NOSHIELD",
    }
);

enumstr!(
    /// # Def Wire Shape Types, the `SHAPE` qualifier on special-net segments
    DefWireShapeType {
        Ring: "RING",
        PadRing: "PADRING",
        BlockRing: "BLOCKRING",
        Stripe: "STRIPE",
        FollowPin: "FOLLOWPIN",
        IoWire: "IOWIRE",
        CoreWire: "COREWIRE",
        BlockWire: "BLOCKWIRE",
        BlockageWire: "BLOCKAGEWIRE",
        FillWire: "FILLWIRE",
        FillWireOpc: "FILLWIREOPC",
        DrcFill: "DRCFILL",
    }
);

enumstr!(
    /// # Def Source Classifications
    ///
    /// Specifies where a component or net came from. Entities with no
    /// classification carry `None` at the field level.
    DefSourceType {
        Netlist: "NETLIST",
        Dist: "DIST",
        User: "USER",
        Timing: "TIMING",
        Test: "TEST",
    }
);

enumstr!(
    /// # Def Property-Definition Object Categories
    DefPropObject {
        Component: "COMPONENT",
        ComponentPin: "COMPONENTPIN",
        Design: "DESIGN",
        Group: "GROUP",
        Net: "NET",
        NonDefaultRule: "NONDEFAULTRULE",
        Region: "REGION",
        Row: "ROW",
        SpecialNet: "SPECIALNET",
    }
);

enumstr!(
    /// # Def Property Value Kinds
    DefPropKind {
        String: "STRING",
        Integer: "INTEGER",
        Real: "REAL",
    }
);

/// # Def Placement Status
///
/// `Locked` and `Firm` both serialize as `FIXED`; `Suggested` as `PLACED`;
/// `None` emits no placement clause at all.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefPlacementStatus {
    None,
    Unplaced,
    Suggested,
    Placed,
    Locked,
    Firm,
    Cover,
}
impl Default for DefPlacementStatus {
    fn default() -> Self {
        Self::None
    }
}

/// # Def Region Types
///
/// `Inclusive` regions emit no TYPE clause; fences and guides emit
/// `+ TYPE FENCE` / `+ TYPE GUIDE`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefRegionType {
    Inclusive,
    Fence,
    Guide,
}
impl Default for DefRegionType {
    fn default() -> Self {
        Self::Inclusive
    }
}

/// # Def Row Directions
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefRowDir {
    Horizontal,
    Vertical,
}
impl Default for DefRowDir {
    fn default() -> Self {
        Self::Horizontal
    }
}

/// # Def Special-Net Rectangle Direction Classifier
///
/// Determines which axis collapses to the segment centerline.
/// `Undefined` infers the axis from span parity at write time.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefShapeDir {
    Horizontal,
    Vertical,
    Undefined,
}
impl Default for DefShapeDir {
    fn default() -> Self {
        Self::Undefined
    }
}

/// # Def Design
///
/// The top-level container being serialized: global settings plus one arena
/// per entity category. See the module docs for the identifier scheme.
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefDesign {
    /// Design Name
    pub name: String,
    /// Output `UNITS DISTANCE MICRONS` count
    pub def_units: u32,
    /// Database units per micron
    pub db_units_per_micron: u32,

    /// Hierarchy delimiter; `|` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub hier_delimiter: Option<char>,
    /// Bus-bit delimiter pair; `[` `]` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub bus_delimiters: Option<(char, char)>,
    /// Die Boundary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub die_area: Option<DefDieArea>,
    /// Mask-shifted layers (DEF 5.8 `COMPONENTMASKSHIFT`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub component_mask_shift: Vec<DefLayerId>,

    // Entity arenas
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub layers: Vec<DefLayer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub masters: Vec<DefMaster>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub tech_vias: Vec<DefTechVia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub vias: Vec<DefVia>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub non_default_rules: Vec<DefNonDefaultRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub rows: Vec<DefRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub track_grids: Vec<DefTrackGrid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub gcell_grid: Option<DefGCellGrid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub regions: Vec<DefRegion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub groups: Vec<DefGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub insts: Vec<DefInst>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub iterms: Vec<DefITerm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub bterms: Vec<DefBTerm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub nets: Vec<DefNet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub obstructions: Vec<DefObstruction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub blockages: Vec<DefBlockage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub fills: Vec<DefFill>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub scan_chains: Vec<DefScanChain>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub property_definitions: Vec<DefPropDef>,
}
impl DefDesign {
    /// Create a new and initially empty [DefDesign] named `name`.
    pub fn new(name: impl Into<String>) -> DefDesign {
        DefDesign {
            name: name.into(),
            ..Default::default()
        }
    }
    pub fn layer(&self, id: DefLayerId) -> &DefLayer {
        &self.layers[id.0]
    }
    pub fn master(&self, id: DefMasterId) -> &DefMaster {
        &self.masters[id.0]
    }
    pub fn tech_via(&self, id: DefTechViaId) -> &DefTechVia {
        &self.tech_vias[id.0]
    }
    pub fn via(&self, id: DefViaId) -> &DefVia {
        &self.vias[id.0]
    }
    pub fn non_default_rule(&self, id: DefNdrId) -> &DefNonDefaultRule {
        &self.non_default_rules[id.0]
    }
    pub fn region(&self, id: DefRegionId) -> &DefRegion {
        &self.regions[id.0]
    }
    pub fn inst(&self, id: DefInstId) -> &DefInst {
        &self.insts[id.0]
    }
    pub fn iterm(&self, id: DefITermId) -> &DefITerm {
        &self.iterms[id.0]
    }
    pub fn bterm(&self, id: DefBTermId) -> &DefBTerm {
        &self.bterms[id.0]
    }
    pub fn net(&self, id: DefNetId) -> &DefNet {
        &self.nets[id.0]
    }
}

/// # Def Die Boundary
///
/// Either the two-corner rectangle shorthand or an explicit vertex list.
/// A closed polygon (last vertex equal to the first) drops the duplicate
/// vertex on emission.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DefDieArea {
    Rect(DefRect),
    Polygon(Vec<DefPoint>),
}

/// # Def Routing Layer
///
/// Layer identities referenced throughout the design. When the writer's
/// `use_layer_alias` option is set, the alias (if any) is printed everywhere
/// the layer's name would appear.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefLayer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}
impl DefLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }
}

/// # Def Cell Master
///
/// The reusable template an instance refers to. Only the name (and the
/// arena index, as `M<id>`) surfaces in DEF output.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefMaster {
    pub name: String,
}
impl DefMaster {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// # Def Placement Row
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefRow {
    pub name: String,
    /// Site template name
    pub site: String,
    pub origin: DefPoint,
    /// Repetition count along `dir`
    pub site_count: u32,
    /// Step between sites, database units
    pub spacing: Dbu,
    #[builder(default)]
    pub orient: DefOrient,
    #[builder(default)]
    pub dir: DefRowDir,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// One repeating track/gcell pattern along a single axis.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefGridPattern {
    pub origin: Dbu,
    pub count: u32,
    pub step: Dbu,
    /// First mask color; zero means unmasked
    #[serde(default)]
    pub first_mask: u8,
    #[serde(default)]
    pub same_mask: bool,
}

/// # Def Track Grid
///
/// Per-layer routing track patterns, split by axis.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefTrackGrid {
    pub layer: DefLayerId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x_patterns: Vec<DefGridPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y_patterns: Vec<DefGridPattern>,
}

/// # Def GCell Grid
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefGCellGrid {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x_patterns: Vec<DefGridPattern>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y_patterns: Vec<DefGridPattern>,
}

/// # Def Via
///
/// Either a generated via (parameterized by `params`, DEF 5.6+ syntax) or a
/// fixed-shape via (explicit `boxes`). A via carrying a `rotation` is a
/// rotated instance of another via: it is suppressed from the VIAS section
/// at 5.6+ and referenced by master-name + orient inside wire paths.
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefVia {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub params: Option<DefViaParams>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub boxes: Vec<DefViaBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub rotation: Option<DefViaRotation>,
}
impl DefVia {
    pub fn is_rotated(&self) -> bool {
        self.rotation.is_some()
    }
}

/// Generated-via parameters, mirroring the DEF `VIARULE` clause set.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefViaParams {
    /// Via generate-rule name
    pub rule: String,
    pub cut_size: (Dbu, Dbu),
    pub bottom_layer: DefLayerId,
    pub cut_layer: DefLayerId,
    pub top_layer: DefLayerId,
    pub cut_spacing: (Dbu, Dbu),
    pub bottom_enclosure: (Dbu, Dbu),
    pub top_enclosure: (Dbu, Dbu),
    /// Cut rows/columns; (1, 1) omits the ROWCOL clause
    #[serde(default)]
    pub rows: u32,
    #[serde(default)]
    pub cols: u32,
    #[serde(default)]
    pub origin: (Dbu, Dbu),
    #[serde(default)]
    pub bottom_offset: (Dbu, Dbu),
    #[serde(default)]
    pub top_offset: (Dbu, Dbu),
}

/// One explicit rectangle of a fixed-shape via.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefViaBox {
    pub layer: DefLayerId,
    pub rect: DefRect,
}

/// Rotated-via linkage: the underlying master and the applied orientation.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefViaRotation {
    pub via: DefViaMaster,
    pub orient: DefOrient,
}

/// A via reference, to either a tech-library via or a design-local one.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefViaMaster {
    Tech(DefTechViaId),
    Block(DefViaId),
}

/// # Def Tech Via
///
/// A technology-library via: referenced by non-default rules, wire opcodes,
/// and special-net via placements, but never defined in DEF output itself.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefTechVia {
    pub name: String,
    pub bottom_layer: DefLayerId,
}

/// # Def Non-Default Routing Rule
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefNonDefaultRule {
    pub name: String,
    #[serde(default)]
    #[builder(default)]
    pub hard_spacing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub layer_rules: Vec<DefLayerRule>,
    /// Preferred vias
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub use_vias: Vec<DefTechViaId>,
    /// Preferred via generate-rules, by name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub use_via_rules: Vec<String>,
    /// Per-layer minimum-cut overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub min_cuts: Vec<(DefLayerId, u32)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// Per-layer width/spacing/extension overrides of a non-default rule.
/// Zero-valued spacing and wire-extension fields are omitted on emission.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefLayerRule {
    pub layer: DefLayerId,
    pub width: Dbu,
    #[serde(default)]
    pub spacing: Dbu,
    #[serde(default)]
    pub wire_extension: Dbu,
}

/// # Def Region
///
/// A region with no boundary rectangles is not a first-class DEF region:
/// it is skipped, and groups do not reference it.
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefRegion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub boundaries: Vec<DefRect>,
    #[builder(default)]
    pub region_type: DefRegionType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// # Def Group
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub insts: Vec<DefInstId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub region: Option<DefRegionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// # Def Component Instance
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefInst {
    pub name: String,
    pub master: DefMasterId,
    #[builder(default)]
    pub location: DefPoint,
    #[builder(default)]
    pub orient: DefOrient,
    #[builder(default)]
    pub status: DefPlacementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub source: Option<DefSourceType>,
    #[serde(default)]
    #[builder(default)]
    pub weight: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub region: Option<DefRegionId>,
    /// Placement halo, DEF 5.6+
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub halo: Option<DefRect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// # Def Instance Terminal
///
/// The connection point of a net on an instance, named by the master's pin.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefITerm {
    pub inst: DefInstId,
    /// Master-pin (mterm) name
    pub mterm: String,
    /// Carries a reserved (power/ground) connection
    #[serde(default)]
    pub special: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<DefProperty>,
}

/// # Def Design Pin (BTerm)
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefBTerm {
    pub name: String,
    /// Connected net. A pin with no net is skipped with a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub net: Option<DefNetId>,
    #[serde(default)]
    #[builder(default)]
    pub special: bool,
    #[builder(default)]
    pub io_type: DefIoType,
    #[builder(default)]
    pub sig_type: DefSigType,
    /// Supply-sensitivity pin, DEF 5.6+
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub supply_pin: Option<DefBTermId>,
    /// Ground-sensitivity pin, DEF 5.6+
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub ground_pin: Option<DefBTermId>,
    /// Physical placements; a multi-shape port has several
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub bpins: Vec<DefBPin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}

/// # Def Pin Placement (BPin)
#[derive(Clone, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefBPin {
    #[builder(default)]
    pub status: DefPlacementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub effective_width: Option<Dbu>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub min_spacing: Option<Dbu>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub boxes: Vec<DefBPinBox>,
}

/// One rectangle of a pin placement.
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefBPinBox {
    pub layer: DefLayerId,
    pub rect: DefRect,
    /// Mask color, DEF 5.8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u8>,
}

/// # Def Net
///
/// Regular and special nets share this type, distinguished by `special`.
/// A special net whose terminals include non-special instance terminals is
/// emitted in *both* the SPECIALNETS and NETS sections.
#[derive(Clone, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefNet {
    pub name: String,
    #[serde(default)]
    #[builder(default)]
    pub special: bool,
    /// Wild-card connection: terminals sharing a master-pin name emit a
    /// single `( * <name> )` token
    #[serde(default)]
    #[builder(default)]
    pub wild_connected: bool,
    /// Selection closure skips this net's terminals when set
    #[serde(default)]
    #[builder(default)]
    pub already_materialized: bool,
    #[builder(default)]
    pub sig_type: DefSigType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub source: Option<DefSourceType>,
    /// Net weight; the default of 1 is omitted on emission
    #[serde(default = "default_net_weight")]
    #[builder(default = "1")]
    pub weight: i32,
    #[serde(default)]
    #[builder(default)]
    pub xtalk: i32,
    #[serde(default)]
    #[builder(default)]
    pub fixed_bump: bool,
    /// Net-level wire type; `Fixed` forces FIXED path keywords
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub wire_type: Option<DefWireType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub non_default_rule: Option<DefNdrId>,
    /// Routed geometry, as an ordered opcode stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub wire: Option<DefWire>,
    /// Special-net explicit shape lists
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub swires: Vec<DefSWire>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub iterms: Vec<DefITermId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub bterms: Vec<DefBTermId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub properties: Vec<DefProperty>,
}
fn default_net_weight() -> i32 {
    1
}
impl Default for DefNet {
    fn default() -> Self {
        Self {
            name: String::new(),
            special: false,
            wild_connected: false,
            already_materialized: false,
            sig_type: DefSigType::default(),
            source: None,
            weight: 1,
            xtalk: 0,
            fixed_bump: false,
            wire_type: None,
            non_default_rule: None,
            wire: None,
            swires: Vec::new(),
            iterms: Vec::new(),
            bterms: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// # Def Wire
///
/// A regular net's routed geometry: an ordered, opaque opcode stream,
/// consumed one event at a time by the path encoder in [crate::wire].
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefWire {
    pub ops: Vec<DefWireOp>,
}

/// The variants a path-start opcode arrives as. All start a new path
/// segment; the distinction is upstream routing-graph bookkeeping and does
/// not change the emitted syntax.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefPathKind {
    Path,
    Short,
    VirtualWire,
    Junction,
}

/// Mask colors of a via's top, cut, and bottom layers (DEF 5.8).
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct DefViaMask {
    pub top: u8,
    pub cut: u8,
    pub bottom: u8,
}

/// # Def Wire Opcodes
///
/// One decoded event of a net's routed geometry. End-of-stream is the end
/// of the containing [DefWire]'s op list.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DefWireOp {
    /// Start of a path segment on `layer`
    Path {
        kind: DefPathKind,
        wire_type: DefWireType,
        layer: DefLayerId,
    },
    /// An ordinary 2-D point
    Point {
        x: Dbu,
        y: Dbu,
        /// Mask color; attaches only to even-indexed points, DEF 5.8
        mask: Option<u8>,
    },
    /// A point carrying a perpendicular extension distance
    PointExt { x: Dbu, y: Dbu, ext: Dbu },
    /// A design-local via placement
    Via {
        via: DefViaId,
        mask: Option<DefViaMask>,
    },
    /// A technology-library via placement
    TechVia {
        via: DefTechViaId,
        mask: Option<DefViaMask>,
    },
    /// Switch the active non-default (taper) rule
    Rule(DefNdrId),
    /// A rectangle, as deltas from the previous point
    Rect {
        dx1: Dbu,
        dy1: Dbu,
        dx2: Dbu,
        dy2: Dbu,
        mask: Option<u8>,
    },
}

/// # Def Special-Net Wire
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefSWire {
    pub wire_type: DefWireType,
    /// Shielded net, for `wire_type == Shield`. A missing reference falls
    /// back to `+ ROUTED` with a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield: Option<DefNetId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<DefSpecialShape>,
}

/// # Def Special-Net Shapes
///
/// Rectangles carry a direction classifier from which the writer recovers
/// centerline + width; octilinear segments carry the explicit descriptor.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DefSpecialShape {
    Rect {
        layer: DefLayerId,
        dir: DefShapeDir,
        rect: DefRect,
        mask: Option<u8>,
        shape_type: Option<DefWireShapeType>,
    },
    Oct {
        layer: DefLayerId,
        oct: DefOct,
        mask: Option<u8>,
        shape_type: Option<DefWireShapeType>,
    },
    Via {
        via: DefViaMaster,
        location: DefPoint,
        mask: Option<DefViaMask>,
        shape_type: Option<DefWireShapeType>,
    },
}

/// # Def Routing Obstruction
#[derive(Clone, Copy, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefObstruction {
    pub layer: DefLayerId,
    pub rect: DefRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub inst: Option<DefInstId>,
    #[serde(default)]
    #[builder(default)]
    pub slots: bool,
    #[serde(default)]
    #[builder(default)]
    pub fills: bool,
    #[serde(default)]
    #[builder(default)]
    pub pushed_down: bool,
    /// DEF 5.6+
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub effective_width: Option<Dbu>,
    /// DEF 5.6+
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub min_spacing: Option<Dbu>,
    /// System-reserved obstructions are excluded from output
    #[serde(default)]
    #[builder(default)]
    pub system_reserved: bool,
}

/// # Def Placement Blockage
#[derive(Clone, Copy, Default, Builder, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[builder(pattern = "owned", setter(into))]
pub struct DefBlockage {
    pub rect: DefRect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub inst: Option<DefInstId>,
    #[serde(default)]
    #[builder(default)]
    pub soft: bool,
    /// Maximum placement density; positive values emit `+ PARTIAL`
    #[serde(default)]
    #[builder(default)]
    pub max_density: f64,
    #[serde(default)]
    #[builder(default)]
    pub pushed_down: bool,
    /// System-reserved blockages are excluded from output
    #[serde(default)]
    #[builder(default)]
    pub system_reserved: bool,
}

/// # Def Metal Fill
#[derive(Clone, Copy, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefFill {
    pub layer: DefLayerId,
    pub rect: DefRect,
    /// Mask color, DEF 5.8
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u8>,
    /// Requires optical-proximity-correction treatment
    #[serde(default)]
    pub opc: bool,
}

/// A scan pin: either a design pin or an instance terminal.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum DefScanPin {
    BTerm(DefBTermId),
    ITerm(DefITermId),
}

/// # Def Scan Chain
///
/// A chain with more than one partition emits one record per partition,
/// each named `<chain>_<index>` with a zero-based index.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefScanChain {
    pub name: String,
    pub scan_in: DefScanPin,
    pub scan_out: DefScanPin,
    pub partitions: Vec<DefScanPartition>,
}

/// # Def Scan Partition
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefScanPartition {
    pub name: String,
    pub lists: Vec<DefScanList>,
}

/// A consecutive run of scan instances. Singleton lists emit under
/// FLOATING; longer lists under ORDERED.
#[derive(Clone, Default, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefScanList {
    pub insts: Vec<DefScanInst>,
}

/// One scan-enabled instance with its IN/OUT access pins.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefScanInst {
    pub inst: DefInstId,
    pub scan_in: DefScanPin,
    pub scan_out: DefScanPin,
}

/// # Def Property Definition
///
/// One schema entry of the PROPERTYDEFINITIONS section. Only properties
/// whose (category, name) pair is defined here are emitted on objects.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefPropDef {
    pub object: DefPropObject,
    pub name: String,
    pub kind: DefPropKind,
    /// Optional min/max range constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(DefDecimal, DefDecimal)>,
    /// Optional default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DefPropValue>,
}

/// # Def Property Value
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum DefPropValue {
    String(String),
    Int(i32),
    Real(DefDecimal),
}

/// A named property value attached to an object.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct DefProperty {
    pub name: String,
    pub value: DefPropValue,
}
impl DefProperty {
    pub fn new(name: impl Into<String>, value: DefPropValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// # Def Error Enumeration
#[derive(Debug)]
pub enum DefError {
    /// Destination I/O errors
    Io(std::io::Error),
    /// Fatal input-model geometry defects, e.g. a special-net rectangle
    /// with no even axis span to collapse
    BadGeometry(String),
    /// String message-valued errors
    Str(String),
}
impl From<std::io::Error> for DefError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
impl From<String> for DefError {
    /// Convert string-based errors by wrapping them
    fn from(e: String) -> Self {
        Self::Str(e)
    }
}
impl From<&str> for DefError {
    /// Convert string-based errors by wrapping them
    fn from(e: &str) -> Self {
        Self::Str(e.into())
    }
}
impl std::fmt::Display for DefError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for DefError {}

/// Def21 Library-Wide Result Type
pub type DefResult<T> = Result<T, DefError>;
