//!
//! # Def Writing Module
//!
//! Serializes a [DefDesign] to DEF-format text, in any of the six dialects
//! from 5.3 through 5.8. [DefWriter] is a single-pass session object: it
//! owns the boxed destination stream plus all per-pass state (the selection
//! sets, the property-definition registry), and is discarded after one
//! document. The design itself is never mutated.
//!
//! Section counts are computed after filtering, so a declared count always
//! equals the number of records that follow it.
//!

// Std-Lib Imports
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Crates.io Imports
use log::warn;

// Local imports
use crate::data::*;
use crate::utils::EnumStr;
use crate::wire::WireEncoder;

/// Save a [DefDesign] to file `fname`.
pub fn save(
    design: &DefDesign,
    opts: &DefWriterOptions,
    fname: impl AsRef<Path>,
) -> DefResult<()> {
    let file = match File::create(&fname) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot open {} for writing", fname.as_ref().display());
            return Err(e.into());
        }
    };
    // DEF output is large and newline-heavy; buffer generously.
    let dest = BufWriter::with_capacity(1 << 16, file);
    DefWriter::new(design, opts, Box::new(dest)).write_design()
}

/// Write a [DefDesign] to a DEF-format [String].
pub fn to_string(design: &DefDesign, opts: &DefWriterOptions) -> DefResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    DefWriter::new(design, opts, Box::new(&mut buf)).write_design()?;
    String::from_utf8(buf).map_err(|e| DefError::Str(e.to_string()))
}

/// Save the reduced placement-only form of `design` to file `fname`.
pub fn save_placement(
    design: &DefDesign,
    opts: &DefWriterOptions,
    fname: impl AsRef<Path>,
) -> DefResult<()> {
    let file = match File::create(&fname) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot open {} for writing", fname.as_ref().display());
            return Err(e.into());
        }
    };
    let dest = BufWriter::with_capacity(1 << 16, file);
    DefWriter::new(design, opts, Box::new(dest)).write_placement()
}

/// Write the reduced placement-only form of `design` to a [String].
pub fn placement_to_string(design: &DefDesign, opts: &DefWriterOptions) -> DefResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    DefWriter::new(design, opts, Box::new(&mut buf)).write_placement()?;
    String::from_utf8(buf).map_err(|e| DefError::Str(e.to_string()))
}

/// # Def Writer Options
///
/// Output knobs: the target dialect, the three name-substitution modes, and
/// the optional net/instance selection. Empty selection lists mean no
/// filtering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefWriterOptions {
    /// Target DEF dialect; defaults to 5.8
    pub version: DefVersion,
    /// Print layer aliases instead of layer names, where one is set
    pub use_layer_alias: bool,
    /// Print compact `I<id>` / `N<id>` identities for instances and nets
    pub use_net_inst_ids: bool,
    /// Print compact `M<id>` identities for cell masters
    pub use_master_ids: bool,
    /// Restrict output to these nets (plus their connectivity closure)
    pub select_nets: Vec<DefNetId>,
    /// Restrict output to these instances
    pub select_insts: Vec<DefInstId>,
}

/// # Def Writer
///
/// One serialization pass over a design. Create a new writer per document.
pub struct DefWriter<'wr> {
    /// Destination stream
    dest: Box<dyn Write + 'wr>,
    /// Design being written
    design: &'wr DefDesign,
    /// Output options
    opts: &'wr DefWriterOptions,
    /// Database-unit to output-unit scale
    dist_factor: f64,
    /// Selected nets; `None` means unfiltered
    net_filter: Option<HashSet<DefNetId>>,
    /// Selected instances (explicit plus net closure); `None` means
    /// unfiltered. A present-but-empty set passes no instance at all.
    inst_filter: Option<HashSet<DefInstId>>,
    /// Property names registered per object category
    prop_defs: HashMap<DefPropObject, HashSet<String>>,
}

impl<'wr> DefWriter<'wr> {
    /// Create a new [DefWriter] targeting `dest`.
    pub fn new(
        design: &'wr DefDesign,
        opts: &'wr DefWriterOptions,
        dest: Box<dyn Write + 'wr>,
    ) -> Self {
        let dist_factor = if design.db_units_per_micron == 0 {
            1.0
        } else {
            design.def_units as f64 / design.db_units_per_micron as f64
        };
        let (net_filter, inst_filter) = build_selection(design, opts);
        Self {
            dest,
            design,
            opts,
            dist_factor,
            net_filter,
            inst_filter,
            prop_defs: HashMap::new(),
        }
    }

    /// Write the full DEF document.
    pub fn write_design(&mut self) -> DefResult<()> {
        self.write_header()?;
        self.write_property_definitions()?;
        self.write_die_area()?;
        self.write_rows()?;
        self.write_tracks()?;
        self.write_gcell_grid()?;
        self.write_vias()?;
        self.write_non_default_rules()?;
        self.write_regions()?;
        self.write_component_mask_shift()?;
        self.write_insts()?;
        self.write_bterms()?;
        self.write_pin_properties()?;
        self.write_blockages()?;
        self.write_fills()?;
        self.write_nets()?;
        self.write_groups()?;
        self.write_scan_chains()?;
        writeln!(self.dest, "END DESIGN")?;
        self.dest.flush()?;
        Ok(())
    }

    /// Write the reduced placement-only document: one line per design pin,
    /// then `CELLS` and one line per instance.
    pub fn write_placement(&mut self) -> DefResult<()> {
        for idx in sorted_by_name(&self.design.bterms, |b| &b.name) {
            let bterm = &self.design.bterms[idx];
            if !self.bterm_emitted(bterm) {
                continue;
            }
            write!(self.dest, "{}", bterm.name)?;
            if let Some(bpin) = bterm.bpins.first() {
                if is_placed(bpin.status) {
                    let (x, y) = self.bpin_anchor(bpin);
                    write!(self.dest, " {} {} : N", x, y)?;
                }
            }
            writeln!(self.dest)?;
        }
        writeln!(self.dest, "CELLS")?;
        for idx in sorted_by_name(&self.design.insts, |i| &i.name) {
            if !self.inst_selected(DefInstId(idx)) {
                continue;
            }
            let inst = &self.design.insts[idx];
            write!(self.dest, "{}", self.inst_name(DefInstId(idx)))?;
            if is_placed(inst.status) {
                let x = self.defdist(inst.location.x);
                let y = self.defdist(inst.location.y);
                write!(self.dest, " {} {} : {}", x, y, inst.orient.to_str())?;
            }
            writeln!(self.dest)?;
        }
        self.dest.flush()?;
        Ok(())
    }

    fn write_header(&mut self) -> DefResult<()> {
        writeln!(self.dest, "VERSION {} ;", self.opts.version)?;
        if self.opts.version < DefVersion::V5_6 {
            writeln!(self.dest, "NAMESCASESENSITIVE ON ;")?;
        }
        let hier = self.design.hier_delimiter.unwrap_or('|');
        writeln!(self.dest, "DIVIDERCHAR \"{}\" ;", hier)?;
        let (left, right) = self.design.bus_delimiters.unwrap_or(('[', ']'));
        writeln!(self.dest, "BUSBITCHARS \"{}{}\" ;", left, right)?;
        writeln!(self.dest, "DESIGN {} ;", self.design.name)?;
        writeln!(
            self.dest,
            "UNITS DISTANCE MICRONS {} ;",
            self.design.def_units
        )?;
        Ok(())
    }

    /// Phase one of the property system: emit the schema and register each
    /// (category, name) pair for the per-object emission predicate.
    fn write_property_definitions(&mut self) -> DefResult<()> {
        let defs = &self.design.property_definitions;
        if defs.is_empty() {
            return Ok(());
        }
        writeln!(self.dest, "PROPERTYDEFINITIONS")?;
        for def in defs.iter() {
            write!(
                self.dest,
                "{} {} {} ",
                def.object.to_str(),
                def.name,
                def.kind.to_str()
            )?;
            if let Some((min, max)) = &def.range {
                write!(self.dest, "RANGE {} {} ", min, max)?;
            }
            if let Some(value) = &def.value {
                match value {
                    DefPropValue::String(s) => write!(self.dest, "\"{}\" ", s)?,
                    DefPropValue::Int(i) => write!(self.dest, "{} ", i)?,
                    DefPropValue::Real(r) => write!(self.dest, "{} ", r)?,
                }
            }
            writeln!(self.dest, ";")?;
            self.prop_defs
                .entry(def.object)
                .or_default()
                .insert(def.name.clone());
        }
        writeln!(self.dest, "END PROPERTYDEFINITIONS")?;
        Ok(())
    }

    fn write_die_area(&mut self) -> DefResult<()> {
        match &self.design.die_area {
            None => Ok(()),
            Some(DefDieArea::Rect(r)) => {
                if r.x1 == 0 && r.y1 == 0 && r.x2 == 0 && r.y2 == 0 {
                    return Ok(());
                }
                write!(self.dest, "DIEAREA ")?;
                self.write_rect(r)?;
                writeln!(self.dest, " ;")?;
                Ok(())
            }
            Some(DefDieArea::Polygon(pts)) => {
                write!(self.dest, "DIEAREA ")?;
                let mut pts = &pts[..];
                // Closed polygons drop the duplicate closing vertex
                if pts.len() > 1 && pts.first() == pts.last() {
                    pts = &pts[..pts.len() - 1];
                }
                for pt in pts {
                    write!(
                        self.dest,
                        "( {} {} ) ",
                        self.defdist(pt.x),
                        self.defdist(pt.y)
                    )?;
                }
                writeln!(self.dest, ";")?;
                Ok(())
            }
        }
    }

    fn write_rows(&mut self) -> DefResult<()> {
        for idx in sorted_by_name(&self.design.rows, |r| &r.name) {
            let row = &self.design.rows[idx];
            write!(
                self.dest,
                "ROW {} {} {} {} {} ",
                row.name,
                row.site,
                self.defdist(row.origin.x),
                self.defdist(row.origin.y),
                row.orient.to_str()
            )?;
            match row.dir {
                DefRowDir::Vertical => write!(
                    self.dest,
                    "DO 1 BY {} STEP 0 {}",
                    row.site_count,
                    self.defdist(row.spacing)
                )?,
                DefRowDir::Horizontal => write!(
                    self.dest,
                    "DO {} BY 1 STEP {} 0",
                    row.site_count,
                    self.defdist(row.spacing)
                )?,
            }
            self.write_property_clause(DefPropObject::Row, &row.properties)?;
            writeln!(self.dest, " ;")?;
        }
        Ok(())
    }

    fn write_tracks(&mut self) -> DefResult<()> {
        for grid in self.design.track_grids.iter() {
            let lname = self.layer_name(grid.layer).to_string();
            for (axis, patterns) in [("X", &grid.x_patterns), ("Y", &grid.y_patterns)] {
                for p in patterns.iter() {
                    write!(
                        self.dest,
                        "TRACKS {} {} DO {} STEP {}",
                        axis,
                        self.defdist(p.origin),
                        p.count,
                        self.defdist(p.step)
                    )?;
                    if self.opts.version >= DefVersion::V5_8 && p.first_mask != 0 {
                        write!(self.dest, " MASK {}", p.first_mask)?;
                        if p.same_mask {
                            write!(self.dest, " SAMEMASK")?;
                        }
                    }
                    writeln!(self.dest, " LAYER {} ;", lname)?;
                }
            }
        }
        Ok(())
    }

    fn write_gcell_grid(&mut self) -> DefResult<()> {
        let grid = match &self.design.gcell_grid {
            Some(g) => g,
            None => return Ok(()),
        };
        for (axis, patterns) in [("X", &grid.x_patterns), ("Y", &grid.y_patterns)] {
            for p in patterns.iter() {
                writeln!(
                    self.dest,
                    "GCELLGRID {} {} DO {} STEP {} ;",
                    axis,
                    self.defdist(p.origin),
                    p.count,
                    self.defdist(p.step)
                )?;
            }
        }
        Ok(())
    }

    /// Does this via get a record in the VIAS section? Rotated vias are
    /// suppressed at 5.6+ and referenced by master + orient instead.
    fn via_emitted(&self, via: &DefVia) -> bool {
        !(self.opts.version >= DefVersion::V5_6 && via.is_rotated())
    }

    fn write_vias(&mut self) -> DefResult<()> {
        let cnt = self
            .design
            .vias
            .iter()
            .filter(|v| self.via_emitted(v))
            .count();
        if cnt == 0 {
            return Ok(());
        }
        writeln!(self.dest, "VIAS {} ;", cnt)?;
        for idx in sorted_by_name(&self.design.vias, |v| &v.name) {
            let via = &self.design.vias[idx];
            if !self.via_emitted(via) {
                continue;
            }
            write!(self.dest, "    - {}", via.name)?;
            match &via.params {
                Some(p) if self.opts.version >= DefVersion::V5_6 => {
                    self.write_via_params(p)?;
                    if let Some(pattern) = &via.pattern {
                        write!(self.dest, " + PATTERNNAME {}", pattern)?;
                    }
                }
                _ => {
                    if let Some(pattern) = &via.pattern {
                        write!(self.dest, " + PATTERNNAME {}", pattern)?;
                    }
                    let mut i = 0;
                    for bx in via.boxes.iter() {
                        i += 1;
                        if i % 8 == 0 {
                            write!(self.dest, "\n      ")?;
                        }
                        write!(self.dest, " + RECT {} ", self.layer_name(bx.layer))?;
                        self.write_rect(&bx.rect)?;
                    }
                }
            }
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END VIAS")?;
        Ok(())
    }

    fn write_via_params(&mut self, p: &DefViaParams) -> DefResult<()> {
        write!(self.dest, " + VIARULE {}", p.rule)?;
        write!(
            self.dest,
            " + CUTSIZE {} {} ",
            self.defdist(p.cut_size.0),
            self.defdist(p.cut_size.1)
        )?;
        write!(
            self.dest,
            " + LAYERS {} {} {} ",
            self.layer_name(p.bottom_layer),
            self.layer_name(p.cut_layer),
            self.layer_name(p.top_layer)
        )?;
        write!(
            self.dest,
            " + CUTSPACING {} {} ",
            self.defdist(p.cut_spacing.0),
            self.defdist(p.cut_spacing.1)
        )?;
        write!(
            self.dest,
            " + ENCLOSURE {} {} {} {} ",
            self.defdist(p.bottom_enclosure.0),
            self.defdist(p.bottom_enclosure.1),
            self.defdist(p.top_enclosure.0),
            self.defdist(p.top_enclosure.1)
        )?;
        if (p.rows, p.cols) != (1, 1) {
            write!(self.dest, " + ROWCOL {} {} ", p.rows, p.cols)?;
        }
        if p.origin != (0, 0) {
            write!(
                self.dest,
                " + ORIGIN {} {} ",
                self.defdist(p.origin.0),
                self.defdist(p.origin.1)
            )?;
        }
        if p.bottom_offset != (0, 0) || p.top_offset != (0, 0) {
            write!(
                self.dest,
                " + OFFSET {} {} {} {} ",
                self.defdist(p.bottom_offset.0),
                self.defdist(p.bottom_offset.1),
                self.defdist(p.top_offset.0),
                self.defdist(p.top_offset.1)
            )?;
        }
        Ok(())
    }

    fn write_non_default_rules(&mut self) -> DefResult<()> {
        // The NONDEFAULTRULES section exists from 5.6 onward
        if self.opts.version < DefVersion::V5_6 || self.design.non_default_rules.is_empty() {
            return Ok(());
        }
        writeln!(
            self.dest,
            "NONDEFAULTRULES {} ;",
            self.design.non_default_rules.len()
        )?;
        for idx in sorted_by_name(&self.design.non_default_rules, |r| &r.name) {
            let rule = &self.design.non_default_rules[idx];
            writeln!(self.dest, "    - {}", rule.name)?;
            if rule.hard_spacing {
                writeln!(self.dest, "      + HARDSPACING")?;
            }
            for lr in rule.layer_rules.iter() {
                write!(
                    self.dest,
                    "      + LAYER {} WIDTH {}",
                    self.layer_name(lr.layer),
                    self.defdist(lr.width)
                )?;
                if lr.spacing != 0 {
                    write!(self.dest, " SPACING {}", self.defdist(lr.spacing))?;
                }
                if lr.wire_extension != 0 {
                    write!(
                        self.dest,
                        " WIREEXTENSION {}",
                        self.defdist(lr.wire_extension)
                    )?;
                }
                writeln!(self.dest)?;
            }
            for &via in rule.use_vias.iter() {
                writeln!(self.dest, "      + VIA {}", self.design.tech_via(via).name)?;
            }
            for vrule in rule.use_via_rules.iter() {
                writeln!(self.dest, "      + VIARULE {}", vrule)?;
            }
            for &(layer, cuts) in rule.min_cuts.iter() {
                writeln!(
                    self.dest,
                    "      + MINCUTS {} {}",
                    self.layer_name(layer),
                    cuts
                )?;
            }
            if self.has_registered_property(DefPropObject::NonDefaultRule, &rule.properties) {
                write!(self.dest, "    + PROPERTY ")?;
                self.write_property_values(&rule.properties)?;
                writeln!(self.dest)?;
            }
            writeln!(self.dest, "    ;")?;
        }
        writeln!(self.dest, "END NONDEFAULTRULES")?;
        Ok(())
    }

    fn write_regions(&mut self) -> DefResult<()> {
        // Only regions with boundary rectangles are first-class DEF regions
        let cnt = self
            .design
            .regions
            .iter()
            .filter(|r| !r.boundaries.is_empty())
            .count();
        if cnt == 0 {
            return Ok(());
        }
        writeln!(self.dest, "REGIONS {} ;", cnt)?;
        for idx in sorted_by_name(&self.design.regions, |r| &r.name) {
            let region = &self.design.regions[idx];
            if region.boundaries.is_empty() {
                continue;
            }
            write!(self.dest, "    - {}", region.name)?;
            for (i, b) in region.boundaries.iter().enumerate() {
                if i % 4 == 3 {
                    write!(self.dest, "\n        ")?;
                }
                write!(self.dest, " ")?;
                self.write_rect(b)?;
            }
            match region.region_type {
                DefRegionType::Inclusive => (),
                DefRegionType::Fence => write!(self.dest, " + TYPE FENCE")?,
                DefRegionType::Guide => write!(self.dest, " + TYPE GUIDE")?,
            }
            self.write_property_clause(DefPropObject::Region, &region.properties)?;
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END REGIONS")?;
        Ok(())
    }

    fn write_component_mask_shift(&mut self) -> DefResult<()> {
        if self.opts.version < DefVersion::V5_8 || self.design.component_mask_shift.is_empty() {
            return Ok(());
        }
        write!(self.dest, "COMPONENTMASKSHIFT ")?;
        for &layer in self.design.component_mask_shift.iter() {
            write!(self.dest, "{} ", self.layer_name(layer))?;
        }
        writeln!(self.dest, ";")?;
        Ok(())
    }

    fn write_insts(&mut self) -> DefResult<()> {
        let cnt = (0..self.design.insts.len())
            .filter(|&i| self.inst_selected(DefInstId(i)))
            .count();
        writeln!(self.dest, "COMPONENTS {} ;", cnt)?;
        for idx in sorted_by_name(&self.design.insts, |i| &i.name) {
            let id = DefInstId(idx);
            if !self.inst_selected(id) {
                continue;
            }
            let inst = self.design.inst(id);
            write!(
                self.dest,
                "    - {} {}",
                self.inst_name(id),
                self.master_name(inst.master)
            )?;
            match inst.source {
                Some(s) if s != DefSourceType::Test => {
                    write!(self.dest, " + SOURCE {}", s.to_str())?
                }
                _ => (),
            }
            self.write_inst_placement(inst)?;
            if inst.weight != 0 {
                write!(self.dest, " + WEIGHT {}", inst.weight)?;
            }
            if let Some(rid) = inst.region {
                if !self.design.region(rid).boundaries.is_empty() {
                    write!(self.dest, " + REGION {}", self.design.region(rid).name)?;
                }
            }
            self.write_property_clause(DefPropObject::Component, &inst.properties)?;
            if self.opts.version >= DefVersion::V5_6 {
                if let Some(halo) = inst.halo {
                    write!(
                        self.dest,
                        " + HALO {} {} {} {}",
                        self.defdist(halo.x1),
                        self.defdist(halo.y1),
                        self.defdist(halo.x2),
                        self.defdist(halo.y2)
                    )?;
                }
            }
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END COMPONENTS")?;
        Ok(())
    }

    fn write_inst_placement(&mut self, inst: &DefInst) -> DefResult<()> {
        let keyword = match inst.status {
            DefPlacementStatus::None => return Ok(()),
            DefPlacementStatus::Unplaced => {
                write!(self.dest, " + UNPLACED")?;
                return Ok(());
            }
            DefPlacementStatus::Suggested | DefPlacementStatus::Placed => "PLACED",
            DefPlacementStatus::Locked | DefPlacementStatus::Firm => "FIXED",
            DefPlacementStatus::Cover => "COVER",
        };
        write!(
            self.dest,
            " + {} ( {} {} ) {}",
            keyword,
            self.defdist(inst.location.x),
            self.defdist(inst.location.y),
            inst.orient.to_str()
        )?;
        Ok(())
    }

    /// Is this design pin emitted? Requires a net, and that net selected.
    fn bterm_emitted(&self, bterm: &DefBTerm) -> bool {
        match bterm.net {
            Some(net) => self.net_selected(net),
            None => false,
        }
    }

    fn write_bterms(&mut self) -> DefResult<()> {
        let cnt = self
            .design
            .bterms
            .iter()
            .filter(|b| self.bterm_emitted(b))
            .count();
        if cnt == 0 {
            return Ok(());
        }
        writeln!(self.dest, "PINS {} ;", cnt)?;
        for idx in sorted_by_name(&self.design.bterms, |b| &b.name) {
            let bterm = &self.design.bterms[idx];
            let net = match bterm.net {
                Some(n) => n,
                None => {
                    warn!("pin {} skipped because it has no net", bterm.name);
                    continue;
                }
            };
            if !self.net_selected(net) {
                continue;
            }
            if bterm.bpins.is_empty() {
                write!(self.dest, "    - {} + NET {}", bterm.name, self.net_name(net))?;
                self.write_bterm_traits(bterm)?;
                writeln!(self.dest, " ;")?;
                continue;
            }
            for (cnt, bpin) in bterm.bpins.iter().enumerate() {
                self.write_bpin(bterm, net, bpin, cnt)?;
            }
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END PINS")?;
        Ok(())
    }

    /// The SPECIAL/DIRECTION/sensitivity/USE clause run shared by both the
    /// bare-pin and per-bpin headers.
    fn write_bterm_traits(&mut self, bterm: &DefBTerm) -> DefResult<()> {
        if bterm.special {
            write!(self.dest, " + SPECIAL")?;
        }
        write!(self.dest, " + DIRECTION {}", bterm.io_type.to_str())?;
        if self.opts.version >= DefVersion::V5_6 {
            if let Some(pin) = bterm.supply_pin {
                write!(
                    self.dest,
                    " + SUPPLYSENSITIVITY {}",
                    self.design.bterm(pin).name
                )?;
            }
            if let Some(pin) = bterm.ground_pin {
                write!(
                    self.dest,
                    " + GROUNDSENSITIVITY {}",
                    self.design.bterm(pin).name
                )?;
            }
        }
        write!(self.dest, " + USE {}", bterm.sig_type.to_str())?;
        Ok(())
    }

    /// Anchor point of a pin placement: the center of its first box, in
    /// output units.
    fn bpin_anchor(&self, bpin: &DefBPin) -> (i64, i64) {
        match bpin.boxes.first() {
            Some(b) => (
                self.defdist(b.rect.x1) + self.defdist(b.rect.dx() / 2),
                self.defdist(b.rect.y1) + self.defdist(b.rect.dy() / 2),
            ),
            None => (0, 0),
        }
    }

    fn write_bpin(
        &mut self,
        bterm: &DefBTerm,
        net: DefNetId,
        bpin: &DefBPin,
        cnt: usize,
    ) -> DefResult<()> {
        // Below 5.7 there is no PORT syntax; each extra placement repeats
        // the pin header as a fresh record named `<pin>.extra<n>`.
        if cnt == 0 || self.opts.version <= DefVersion::V5_6 {
            if cnt > 0 {
                writeln!(self.dest, " ;")?;
            }
            let name: Cow<str> = if cnt == 0 {
                Cow::Borrowed(&bterm.name)
            } else {
                format!("{}.extra{}", bterm.name, cnt).into()
            };
            write!(self.dest, "    - {} + NET {}", name, self.net_name(net))?;
            self.write_bterm_traits(bterm)?;
        }
        if self.opts.version > DefVersion::V5_6 {
            write!(self.dest, "\n      + PORT")?;
        }
        // A box-less placement anchors at the origin but still gets its
        // status clause
        let (ax, ay) = self.bpin_anchor(bpin);
        for b in bpin.boxes.iter() {
            let mut lname = self.layer_name(b.layer).to_string();
            if self.opts.version >= DefVersion::V5_8 {
                if let Some(m) = b.mask {
                    lname = format!("{} MASK {}", lname, m);
                }
            }
            // Box corners are written relative to the anchor
            let x1 = self.defdist(b.rect.x1) - ax;
            let y1 = self.defdist(b.rect.y1) - ay;
            let x2 = self.defdist(b.rect.x2) - ax;
            let y2 = self.defdist(b.rect.y2) - ay;
            if self.opts.version <= DefVersion::V5_5 {
                write!(
                    self.dest,
                    "\n        + LAYER {} ( {} {} ) ( {} {} )",
                    lname, x1, y1, x2, y2
                )?;
            } else if let Some(w) = bpin.effective_width {
                write!(
                    self.dest,
                    "\n        + LAYER {} DESIGNRULEWIDTH {} ( {} {} ) ( {} {} )",
                    lname,
                    self.defdist(w),
                    x1,
                    y1,
                    x2,
                    y2
                )?;
            } else if let Some(s) = bpin.min_spacing {
                write!(
                    self.dest,
                    "\n        + LAYER {} SPACING {} ( {} {} ) ( {} {} )",
                    lname,
                    self.defdist(s),
                    x1,
                    y1,
                    x2,
                    y2
                )?;
            } else {
                write!(
                    self.dest,
                    "\n        + LAYER {} ( {} {} ) ( {} {} )",
                    lname, x1, y1, x2, y2
                )?;
            }
        }
        let keyword = match bpin.status {
            DefPlacementStatus::Suggested | DefPlacementStatus::Placed => "PLACED",
            DefPlacementStatus::Locked | DefPlacementStatus::Firm => "FIXED",
            DefPlacementStatus::Cover => "COVER",
            _ => return Ok(()),
        };
        write!(self.dest, "\n        + {} ( {} {} ) N", keyword, ax, ay)?;
        Ok(())
    }

    fn write_pin_properties(&mut self) -> DefResult<()> {
        let obj = DefPropObject::ComponentPin;
        let bterm_cnt = self
            .design
            .bterms
            .iter()
            .filter(|b| self.has_registered_property(obj, &b.properties))
            .count();
        let iterm_cnt = self
            .design
            .iterms
            .iter()
            .filter(|it| self.has_registered_property(obj, &it.properties))
            .count();
        if bterm_cnt + iterm_cnt == 0 {
            return Ok(());
        }
        writeln!(self.dest, "PINPROPERTIES {} ;", bterm_cnt + iterm_cnt)?;
        for idx in sorted_by_name(&self.design.bterms, |b| &b.name) {
            let bterm = &self.design.bterms[idx];
            if !self.has_registered_property(obj, &bterm.properties) {
                continue;
            }
            write!(self.dest, "  - PIN {} + PROPERTY ", bterm.name)?;
            self.write_property_values(&bterm.properties)?;
            writeln!(self.dest, " ;")?;
        }
        let mut iterm_order: Vec<usize> = (0..self.design.iterms.len()).collect();
        iterm_order.sort_by(|&a, &b| {
            let (ia, ib) = (&self.design.iterms[a], &self.design.iterms[b]);
            let names = (&self.design.inst(ia.inst).name, &ia.mterm);
            names.cmp(&(&self.design.inst(ib.inst).name, &ib.mterm))
        });
        for idx in iterm_order {
            let iterm = &self.design.iterms[idx];
            if !self.has_registered_property(obj, &iterm.properties) {
                continue;
            }
            write!(
                self.dest,
                "  - {} {} + PROPERTY ",
                self.inst_name(iterm.inst),
                iterm.mterm
            )?;
            self.write_property_values(&iterm.properties)?;
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END PINPROPERTIES")?;
        Ok(())
    }

    fn obstruction_emitted(&self, obs: &DefObstruction) -> bool {
        if obs.system_reserved {
            return false;
        }
        match obs.inst {
            Some(inst) => self.inst_selected(inst),
            None => true,
        }
    }

    fn blockage_emitted(&self, blk: &DefBlockage) -> bool {
        if blk.system_reserved {
            return false;
        }
        match blk.inst {
            Some(inst) => self.inst_selected(inst),
            None => true,
        }
    }

    fn write_blockages(&mut self) -> DefResult<()> {
        let mut obstructions: Vec<&DefObstruction> = self
            .design
            .obstructions
            .iter()
            .filter(|o| self.obstruction_emitted(o))
            .collect();
        let mut blockages: Vec<&DefBlockage> = self
            .design
            .blockages
            .iter()
            .filter(|b| self.blockage_emitted(b))
            .collect();
        if obstructions.is_empty() && blockages.is_empty() {
            return Ok(());
        }
        obstructions.sort_by_key(|o| (o.layer, o.rect));
        blockages.sort_by_key(|b| b.rect);
        let obstructions: Vec<DefObstruction> = obstructions.into_iter().copied().collect();
        let blockages: Vec<DefBlockage> = blockages.into_iter().copied().collect();

        writeln!(
            self.dest,
            "BLOCKAGES {} ;",
            obstructions.len() + blockages.len()
        )?;
        for obs in obstructions.iter() {
            write!(self.dest, "    - LAYER {}", self.layer_name(obs.layer))?;
            if let Some(inst) = obs.inst {
                write!(self.dest, " + COMPONENT {}", self.inst_name(inst))?;
            }
            if obs.slots {
                write!(self.dest, " + SLOTS")?;
            }
            if obs.fills {
                write!(self.dest, " + FILLS")?;
            }
            if obs.pushed_down {
                write!(self.dest, " + PUSHDOWN")?;
            }
            if self.opts.version >= DefVersion::V5_6 {
                if let Some(w) = obs.effective_width {
                    write!(self.dest, " + DESIGNRULEWIDTH {}", self.defdist(w))?;
                } else if let Some(s) = obs.min_spacing {
                    write!(self.dest, " + SPACING {}", self.defdist(s))?;
                }
            }
            write!(self.dest, " RECT ")?;
            self.write_rect(&obs.rect)?;
            writeln!(self.dest, " ;")?;
        }
        for blk in blockages.iter() {
            write!(self.dest, "    - PLACEMENT")?;
            if blk.soft {
                write!(self.dest, " + SOFT")?;
            }
            if blk.max_density > 0.0 {
                write!(self.dest, " + PARTIAL {:.6}", blk.max_density)?;
            }
            if let Some(inst) = blk.inst {
                write!(self.dest, " + COMPONENT {}", self.inst_name(inst))?;
            }
            if blk.pushed_down {
                write!(self.dest, " + PUSHDOWN")?;
            }
            write!(self.dest, " RECT ")?;
            self.write_rect(&blk.rect)?;
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END BLOCKAGES")?;
        Ok(())
    }

    fn write_fills(&mut self) -> DefResult<()> {
        if self.design.fills.is_empty() {
            return Ok(());
        }
        writeln!(self.dest, "FILLS {} ;", self.design.fills.len())?;
        for fill in self.design.fills.iter() {
            write!(self.dest, "    - LAYER {}", self.layer_name(fill.layer))?;
            if self.opts.version >= DefVersion::V5_8 {
                if let Some(m) = fill.mask {
                    write!(self.dest, " + MASK {}", m)?;
                }
            }
            if fill.opc {
                write!(self.dest, " + OPC")?;
            }
            write!(self.dest, " RECT ")?;
            self.write_rect(&fill.rect)?;
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END FILLS")?;
        Ok(())
    }

    /// Does this net get a record in the regular NETS section? Non-special
    /// nets always; special nets only when they carry at least one
    /// non-special instance terminal.
    fn net_is_regular(&self, net: &DefNet) -> bool {
        if !net.special {
            return true;
        }
        net.iterms
            .iter()
            .any(|&it| !self.design.iterm(it).special)
    }

    fn write_nets(&mut self) -> DefResult<()> {
        let order = sorted_by_name(&self.design.nets, |n| &n.name);
        let special: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| self.design.nets[i].special && self.net_selected(DefNetId(i)))
            .collect();
        let regular: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| {
                self.net_is_regular(&self.design.nets[i]) && self.net_selected(DefNetId(i))
            })
            .collect();

        if !special.is_empty() {
            writeln!(self.dest, "SPECIALNETS {} ;", special.len())?;
            for idx in special {
                self.write_snet(DefNetId(idx))?;
            }
            writeln!(self.dest, "END SPECIALNETS")?;
        }
        writeln!(self.dest, "NETS {} ;", regular.len())?;
        for idx in regular {
            self.write_net(DefNetId(idx))?;
        }
        writeln!(self.dest, "END NETS")?;
        Ok(())
    }

    fn write_snet(&mut self, id: DefNetId) -> DefResult<()> {
        let net = self.design.net(id);
        write!(self.dest, "    - {}", self.net_name(id))?;
        let mut i = 0;
        for &bt in net.bterms.iter() {
            i += 1;
            if i % 8 == 0 {
                write!(self.dest, "\n    ")?;
            }
            write!(self.dest, " ( PIN {} )", self.design.bterm(bt).name)?;
        }
        if net.wild_connected {
            // Wild-connected nets collapse terminals to one token per
            // unique master-pin name, all on one line
            let mut seen: HashSet<&str> = HashSet::new();
            for &it in net.iterms.iter() {
                let iterm = self.design.iterm(it);
                if !iterm.special || !seen.insert(&iterm.mterm) {
                    continue;
                }
                i += 1;
                write!(self.dest, " ( * {} )", iterm.mterm)?;
            }
        } else {
            for &it in net.iterms.iter() {
                let iterm = self.design.iterm(it);
                if !iterm.special {
                    continue;
                }
                i += 1;
                if i % 8 == 0 {
                    write!(self.dest, "\n      ")?;
                }
                write!(
                    self.dest,
                    " ( {} {} )",
                    self.inst_name(iterm.inst),
                    iterm.mterm
                )?;
            }
        }
        write!(self.dest, " + USE {}", net.sig_type.to_str())?;
        self.write_swires(net)?;
        match net.source {
            Some(s) if s != DefSourceType::Test => {
                write!(self.dest, " + SOURCE {}", s.to_str())?
            }
            _ => (),
        }
        if net.fixed_bump {
            write!(self.dest, " + FIXEDBUMP")?;
        }
        if net.weight != 1 {
            write!(self.dest, " + WEIGHT {}", net.weight)?;
        }
        self.write_property_clause(DefPropObject::SpecialNet, &net.properties)?;
        writeln!(self.dest, " ;")?;
        Ok(())
    }

    fn write_swires(&mut self, net: &DefNet) -> DefResult<()> {
        for swire in net.swires.iter() {
            match (swire.wire_type, swire.shield) {
                (DefWireType::Shield, Some(shield)) => {
                    write!(self.dest, "\n      + SHIELD {}", self.net_name(shield))?;
                }
                (DefWireType::Shield, None) => {
                    warn!("missing shield net");
                    write!(self.dest, "\n      + ROUTED")?;
                }
                (wt, _) => write!(self.dest, "\n      + {}", wt.to_str())?,
            }
            for (i, shape) in swire.shapes.iter().enumerate() {
                if i > 0 {
                    write!(self.dest, "\n      NEW")?;
                }
                self.write_special_shape(shape)?;
            }
        }
        Ok(())
    }

    fn write_special_shape(&mut self, shape: &DefSpecialShape) -> DefResult<()> {
        match *shape {
            DefSpecialShape::Rect {
                layer,
                dir,
                rect,
                mask,
                shape_type,
            } => {
                let (p1, p2, width) = collapse_special_rect(dir, &rect)?;
                self.write_special_segment(layer, p1, p2, width, mask, shape_type)
            }
            DefSpecialShape::Oct {
                layer,
                oct,
                mask,
                shape_type,
            } => self.write_special_segment(
                layer,
                oct.center_low,
                oct.center_high,
                oct.width,
                mask,
                shape_type,
            ),
            DefSpecialShape::Via {
                via,
                location,
                mask,
                shape_type,
            } => {
                let bottom = match self.via_bottom_layer(via) {
                    Some(l) => l,
                    None => {
                        warn!("via {} has no bottom layer", self.via_master_name(via));
                        return Ok(());
                    }
                };
                let mut vname = self.via_master_name(via).to_string();
                if self.opts.version >= DefVersion::V5_8 {
                    if let Some(m) = mask {
                        vname = format!("MASK {}{}{} {}", m.top, m.cut, m.bottom, vname);
                    }
                }
                let lname = self.layer_name(bottom).to_string();
                let (x, y) = (self.defdist(location.x), self.defdist(location.y));
                match shape_type {
                    Some(t) => write!(
                        self.dest,
                        " {} 0 + SHAPE {} ( {} {} ) {}",
                        lname,
                        t.to_str(),
                        x,
                        y,
                        vname
                    )?,
                    None => write!(self.dest, " {} 0 ( {} {} ) {}", lname, x, y, vname)?,
                }
                Ok(())
            }
        }
    }

    fn write_special_segment(
        &mut self,
        layer: DefLayerId,
        p1: DefPoint,
        p2: DefPoint,
        width: Dbu,
        mask: Option<u8>,
        shape_type: Option<DefWireShapeType>,
    ) -> DefResult<()> {
        let lname = self.layer_name(layer).to_string();
        let w = self.defdist(width);
        let (x1, y1) = (self.defdist(p1.x), self.defdist(p1.y));
        let (x2, y2) = (self.defdist(p2.x), self.defdist(p2.y));
        let mask = mask.filter(|_| self.opts.version >= DefVersion::V5_8);
        match (mask, shape_type) {
            (Some(m), None) => write!(
                self.dest,
                " {} {} ( {} {} ) MASK {} ( {} {} )",
                lname, w, x1, y1, m, x2, y2
            )?,
            (Some(m), Some(t)) => write!(
                self.dest,
                " {} {} + SHAPE {} + MASK {} + ( {} {} ) ( {} {} )",
                lname,
                w,
                t.to_str(),
                m,
                x1,
                y1,
                x2,
                y2
            )?,
            (None, None) => write!(
                self.dest,
                " {} {} ( {} {} ) ( {} {} )",
                lname, w, x1, y1, x2, y2
            )?,
            (None, Some(t)) => write!(
                self.dest,
                " {} {} + SHAPE {} ( {} {} ) ( {} {} )",
                lname,
                w,
                t.to_str(),
                x1,
                y1,
                x2,
                y2
            )?,
        }
        Ok(())
    }

    fn write_net(&mut self, id: DefNetId) -> DefResult<()> {
        let net = self.design.net(id);
        write!(self.dest, "    - {}", self.net_name(id))?;
        let mut i = 0;
        for &bt in net.bterms.iter() {
            i += 1;
            if i % 8 == 0 {
                write!(self.dest, "\n     ")?;
            }
            write!(self.dest, " ( PIN {} )", self.design.bterm(bt).name)?;
        }
        for &it in net.iterms.iter() {
            let iterm = self.design.iterm(it);
            if iterm.special || !self.inst_selected(iterm.inst) {
                continue;
            }
            i += 1;
            if i % 8 == 0 {
                write!(self.dest, "\n     ")?;
            }
            write!(
                self.dest,
                " ( {} {} )",
                self.inst_name(iterm.inst),
                iterm.mterm
            )?;
        }
        if net.xtalk != 0 {
            write!(self.dest, " + XTALK {}", net.xtalk)?;
        }
        write!(self.dest, " + USE {}", net.sig_type.to_str())?;
        if let Some(ndr) = net.non_default_rule {
            write!(
                self.dest,
                " + NONDEFAULTRULE {}",
                self.design.non_default_rule(ndr).name
            )?;
        }
        if let Some(wire) = &net.wire {
            let mut encoder = WireEncoder::new(
                &mut *self.dest,
                self.design,
                self.opts.version,
                self.opts.use_layer_alias,
                self.dist_factor,
                net.wire_type == Some(DefWireType::Fixed),
                net.non_default_rule,
            );
            encoder.encode(wire)?;
        }
        if let Some(s) = net.source {
            write!(self.dest, " + SOURCE {}", s.to_str())?;
        }
        if net.fixed_bump {
            write!(self.dest, " + FIXEDBUMP")?;
        }
        if net.weight != 1 {
            write!(self.dest, " + WEIGHT {}", net.weight)?;
        }
        self.write_property_clause(DefPropObject::Net, &net.properties)?;
        writeln!(self.dest, " ;")?;
        Ok(())
    }

    fn write_groups(&mut self) -> DefResult<()> {
        let cnt = self
            .design
            .groups
            .iter()
            .filter(|g| !g.insts.is_empty())
            .count();
        if cnt == 0 {
            return Ok(());
        }
        writeln!(self.dest, "GROUPS {} ;", cnt)?;
        for idx in sorted_by_name(&self.design.groups, |g| &g.name) {
            let group = &self.design.groups[idx];
            if group.insts.is_empty() {
                continue;
            }
            write!(self.dest, "    - {}", group.name)?;
            for (i, &inst) in group.insts.iter().enumerate() {
                if i % 4 == 3 {
                    write!(self.dest, "\n        ")?;
                }
                write!(self.dest, " {}", self.inst_name(inst))?;
            }
            if let Some(rid) = group.region {
                if !self.design.region(rid).boundaries.is_empty() {
                    write!(self.dest, " + REGION {}", self.design.region(rid).name)?;
                }
            }
            self.write_property_clause(DefPropObject::Group, &group.properties)?;
            writeln!(self.dest, " ;")?;
        }
        writeln!(self.dest, "END GROUPS")?;
        Ok(())
    }

    fn write_scan_chains(&mut self) -> DefResult<()> {
        if self.design.scan_chains.is_empty() {
            return Ok(());
        }
        // One record per partition, so the declared count is the
        // partition total
        let total: usize = self
            .design
            .scan_chains
            .iter()
            .map(|c| c.partitions.len())
            .sum();
        writeln!(self.dest, "\nSCANCHAINS {} ;\n", total)?;
        for chain in self.design.scan_chains.iter() {
            for (i, partition) in chain.partitions.iter().enumerate() {
                let name: Cow<str> = if chain.partitions.len() > 1 {
                    format!("{}_{}", chain.name, i).into()
                } else {
                    Cow::Borrowed(&chain.name)
                };
                writeln!(self.dest, "- {}", name)?;
                writeln!(
                    self.dest,
                    "+ START PIN {}",
                    self.scan_pin_full_name(chain.scan_in)
                )?;
                let mut floating = false;
                let mut ordered = false;
                for list in partition.lists.iter() {
                    if list.insts.len() == 1 {
                        if !floating {
                            writeln!(self.dest, "+ FLOATING")?;
                            floating = true;
                            ordered = false;
                        }
                    } else if !ordered {
                        writeln!(self.dest, "+ ORDERED")?;
                        ordered = true;
                        floating = false;
                    }
                    for si in list.insts.iter() {
                        writeln!(
                            self.dest,
                            "  {} ( IN {} ) ( OUT {} )",
                            self.inst_name(si.inst),
                            self.scan_pin_access_name(si.scan_in),
                            self.scan_pin_access_name(si.scan_out)
                        )?;
                    }
                }
                writeln!(self.dest, "+ PARTITION {}", partition.name)?;
                writeln!(
                    self.dest,
                    "+ STOP PIN {} ;\n",
                    self.scan_pin_full_name(chain.scan_out)
                )?;
            }
        }
        writeln!(self.dest, "END SCANCHAINS\n")?;
        Ok(())
    }

    /// The full name of a scan START/STOP pin: the design-pin name, or
    /// instance + hierarchy delimiter + master-pin.
    fn scan_pin_full_name(&self, pin: DefScanPin) -> String {
        match pin {
            DefScanPin::BTerm(id) => self.design.bterm(id).name.clone(),
            DefScanPin::ITerm(id) => {
                let iterm = self.design.iterm(id);
                let hier = self.design.hier_delimiter.unwrap_or('|');
                format!("{}{}{}", self.inst_name(iterm.inst), hier, iterm.mterm)
            }
        }
    }

    /// The access-pin name inside a scan list: design-pin name or bare
    /// master-pin name.
    fn scan_pin_access_name(&self, pin: DefScanPin) -> &'wr str {
        match pin {
            DefScanPin::BTerm(id) => &self.design.bterm(id).name,
            DefScanPin::ITerm(id) => &self.design.iterm(id).mterm,
        }
    }

    // Property emission, phase two: `+ PROPERTY` appears only if at least
    // one of the object's property names is registered for its category.
    fn has_registered_property(&self, obj: DefPropObject, props: &[DefProperty]) -> bool {
        match self.prop_defs.get(&obj) {
            Some(names) => props.iter().any(|p| names.contains(&p.name)),
            None => false,
        }
    }

    fn write_property_clause(
        &mut self,
        obj: DefPropObject,
        props: &[DefProperty],
    ) -> DefResult<()> {
        if !self.has_registered_property(obj, props) {
            return Ok(());
        }
        write!(self.dest, " + PROPERTY ")?;
        self.write_property_values(props)
    }

    fn write_property_values(&mut self, props: &[DefProperty]) -> DefResult<()> {
        for (cnt, p) in props.iter().enumerate() {
            if cnt > 0 && cnt % 4 == 0 {
                write!(self.dest, "\n    ")?;
            }
            write!(self.dest, "{} ", p.name)?;
            match &p.value {
                DefPropValue::String(s) => write!(self.dest, "\"{}\" ", s)?,
                DefPropValue::Int(i) => write!(self.dest, "{} ", i)?,
                DefPropValue::Real(r) => write!(self.dest, "{} ", r)?,
            }
        }
        Ok(())
    }

    fn write_rect(&mut self, r: &DefRect) -> DefResult<()> {
        write!(
            self.dest,
            "( {} {} ) ( {} {} )",
            self.defdist(r.x1),
            self.defdist(r.y1),
            self.defdist(r.x2),
            self.defdist(r.y2)
        )?;
        Ok(())
    }

    fn net_selected(&self, id: DefNetId) -> bool {
        match &self.net_filter {
            Some(filter) => filter.contains(&id),
            None => true,
        }
    }

    fn inst_selected(&self, id: DefInstId) -> bool {
        match &self.inst_filter {
            Some(filter) => filter.contains(&id),
            None => true,
        }
    }

    fn inst_name(&self, id: DefInstId) -> Cow<'wr, str> {
        if self.opts.use_net_inst_ids {
            format!("I{}", id.0).into()
        } else {
            Cow::Borrowed(&self.design.inst(id).name)
        }
    }

    fn net_name(&self, id: DefNetId) -> Cow<'wr, str> {
        if self.opts.use_net_inst_ids {
            format!("N{}", id.0).into()
        } else {
            Cow::Borrowed(&self.design.net(id).name)
        }
    }

    fn master_name(&self, id: DefMasterId) -> Cow<'wr, str> {
        if self.opts.use_master_ids {
            format!("M{}", id.0).into()
        } else {
            Cow::Borrowed(&self.design.master(id).name)
        }
    }

    fn layer_name(&self, id: DefLayerId) -> &'wr str {
        let layer = self.design.layer(id);
        match (&layer.alias, self.opts.use_layer_alias) {
            (Some(alias), true) => alias,
            _ => &layer.name,
        }
    }

    fn via_master_name(&self, master: DefViaMaster) -> &'wr str {
        match master {
            DefViaMaster::Tech(id) => &self.design.tech_via(id).name,
            DefViaMaster::Block(id) => &self.design.via(id).name,
        }
    }

    /// Bottom routing layer of a via reference: explicit for tech vias,
    /// recovered from params or the first box for design-local ones.
    fn via_bottom_layer(&self, master: DefViaMaster) -> Option<DefLayerId> {
        match master {
            DefViaMaster::Tech(id) => Some(self.design.tech_via(id).bottom_layer),
            DefViaMaster::Block(id) => {
                let via = self.design.via(id);
                match &via.params {
                    Some(p) => Some(p.bottom_layer),
                    None => via.boxes.first().map(|b| b.layer),
                }
            }
        }
    }

    /// Rescale a database-unit value to output units.
    fn defdist(&self, v: Dbu) -> i64 {
        (v as f64 * self.dist_factor).round() as i64
    }
}

/// Build the net/instance selection sets, `None` meaning unfiltered. Each
/// selected net marks itself; if it is neither special nor already
/// materialized, it also activates instance filtering and marks every
/// instance reached through its terminals. A selected net with no terminals
/// thus yields an active-but-empty instance filter, passing no instance.
/// Selected instances mark themselves directly.
fn build_selection(
    design: &DefDesign,
    opts: &DefWriterOptions,
) -> (Option<HashSet<DefNetId>>, Option<HashSet<DefInstId>>) {
    let mut nets: Option<HashSet<DefNetId>> = None;
    let mut insts: Option<HashSet<DefInstId>> = None;
    for &nid in opts.select_nets.iter() {
        nets.get_or_insert_with(HashSet::new).insert(nid);
        let net = design.net(nid);
        if !net.special && !net.already_materialized {
            let marked = insts.get_or_insert_with(HashSet::new);
            for &it in net.iterms.iter() {
                marked.insert(design.iterm(it).inst);
            }
        }
    }
    for &iid in opts.select_insts.iter() {
        insts.get_or_insert_with(HashSet::new).insert(iid);
    }
    (nets, insts)
}

/// Indices of `items` in case-sensitive name order.
fn sorted_by_name<T>(items: &[T], name: impl Fn(&T) -> &str) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| name(&items[a]).cmp(name(&items[b])));
    order
}

fn is_placed(status: DefPlacementStatus) -> bool {
    matches!(
        status,
        DefPlacementStatus::Suggested
            | DefPlacementStatus::Placed
            | DefPlacementStatus::Locked
            | DefPlacementStatus::Firm
            | DefPlacementStatus::Cover
    )
}

/// Collapse a special-net rectangle to its centerline endpoints and width.
/// An explicit direction collapses that axis; an undefined direction infers
/// it from span parity, preferring the even span, or the strictly shorter
/// when both are even (square shapes collapse to a vertical segment). A
/// rectangle odd in both directions has no exact centerline.
fn collapse_special_rect(dir: DefShapeDir, rect: &DefRect) -> DefResult<(DefPoint, DefPoint, Dbu)> {
    let (dx, dy) = (rect.dx(), rect.dy());
    let horizontal = || {
        let y = rect.y1 + dy / 2;
        (
            DefPoint::new(rect.x1, y),
            DefPoint::new(rect.x2, y),
            dy,
        )
    };
    let vertical = || {
        let x = rect.x1 + dx / 2;
        (
            DefPoint::new(x, rect.y1),
            DefPoint::new(x, rect.y2),
            dx,
        )
    };
    let collapsed = match dir {
        DefShapeDir::Horizontal => horizontal(),
        DefShapeDir::Vertical => vertical(),
        DefShapeDir::Undefined => match (dy % 2 == 0, dx % 2 == 0) {
            (true, true) => {
                if dy < dx {
                    horizontal()
                } else {
                    vertical()
                }
            }
            (true, false) => horizontal(),
            (false, true) => vertical(),
            (false, false) => {
                return Err(DefError::BadGeometry(
                    "odd dimension in both directions".to_string(),
                ))
            }
        },
    };
    Ok(collapsed)
}
