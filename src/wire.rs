//!
//! # Def Wire-Path Encoder
//!
//! Serializes a regular net's routed geometry ([DefWire]) into DEF path
//! syntax. The opcode stream is consumed one event at a time; all
//! between-event context (previous point for `*` wildcarding, the active
//! taper rule, path and point counters) lives in [WireState], reset per net.
//!

// Std-Lib Imports
use std::io::Write;

// Local imports
use crate::data::*;
use crate::utils::EnumStr;

/// Running state of a single net's path encoding.
#[derive(Debug, Default)]
struct WireState {
    prev_x: Dbu,
    prev_y: Dbu,
    prev_wire_type: Option<DefWireType>,
    point_cnt: usize,
    path_cnt: usize,
    active_rule: Option<DefNdrId>,
}

/// # Wire-Path Encoder
///
/// Borrows the destination stream and the design for name resolution.
/// Constructed per net by the section writer and dropped after [Self::encode].
pub struct WireEncoder<'wr, 'ds> {
    dest: &'wr mut dyn Write,
    design: &'ds DefDesign,
    version: DefVersion,
    use_layer_alias: bool,
    /// Database-unit to output-unit scale
    dist_factor: f64,
    /// Net-level FIXED status overrides per-path wire types
    force_fixed: bool,
    state: WireState,
}

impl<'wr, 'ds> WireEncoder<'wr, 'ds> {
    pub fn new(
        dest: &'wr mut dyn Write,
        design: &'ds DefDesign,
        version: DefVersion,
        use_layer_alias: bool,
        dist_factor: f64,
        force_fixed: bool,
        initial_rule: Option<DefNdrId>,
    ) -> Self {
        Self {
            dest,
            design,
            version,
            use_layer_alias,
            dist_factor,
            force_fixed,
            state: WireState {
                active_rule: initial_rule,
                ..Default::default()
            },
        }
    }

    /// Encode the full opcode stream of `wire`.
    pub fn encode(&mut self, wire: &DefWire) -> DefResult<()> {
        for (idx, op) in wire.ops.iter().enumerate() {
            // Path starts peek ahead: a rule switch carries its own
            // TAPERRULE clause, anything else gets the TAPER marker.
            let next_is_rule = matches!(wire.ops.get(idx + 1), Some(DefWireOp::Rule(_)));
            self.op(op, next_is_rule)?;
        }
        Ok(())
    }

    fn op(&mut self, op: &DefWireOp, next_is_rule: bool) -> DefResult<()> {
        match *op {
            DefWireOp::Path {
                wire_type, layer, ..
            } => self.path(wire_type, layer, next_is_rule),
            DefWireOp::Point { x, y, mask } => self.point(x, y, mask),
            DefWireOp::PointExt { x, y, ext } => self.point_ext(x, y, ext),
            DefWireOp::Via { via, mask } => self.block_via(via, mask),
            DefWireOp::TechVia { via, mask } => self.tech_via(via, mask),
            DefWireOp::Rule(rule) => self.rule(rule),
            DefWireOp::Rect {
                dx1,
                dy1,
                dx2,
                dy2,
                mask,
            } => self.rect(dx1, dy1, dx2, dy2, mask),
        }
    }

    fn path(
        &mut self,
        wire_type: DefWireType,
        layer: DefLayerId,
        next_is_rule: bool,
    ) -> DefResult<()> {
        let wire_type = if self.force_fixed {
            DefWireType::Fixed
        } else {
            wire_type
        };
        let lname = self.layer_name(layer);
        if self.state.path_cnt == 0 || self.state.prev_wire_type != Some(wire_type) {
            write!(self.dest, "\n      + {} {}", wire_type.to_str(), lname)?;
        } else {
            write!(self.dest, "\n      NEW {}", lname)?;
        }
        if self.state.active_rule.is_some() && !next_is_rule {
            // The taper marker repeats on every path start that does not
            // immediately switch rules
            write!(self.dest, " TAPER")?;
        }
        self.state.prev_wire_type = Some(wire_type);
        self.state.point_cnt = 0;
        self.state.path_cnt += 1;
        Ok(())
    }

    fn point(&mut self, x: Dbu, y: Dbu, mask: Option<u8>) -> DefResult<()> {
        self.bump_and_wrap()?;
        // Mask colors attach to even-indexed points only
        let mask = match mask {
            Some(m) if self.version >= DefVersion::V5_8 && self.state.point_cnt % 2 == 0 => {
                Some(m)
            }
            _ => None,
        };
        let (xd, yd) = (self.defdist(x), self.defdist(y));
        if self.state.point_cnt == 1 {
            write!(self.dest, " ( {} {} )", xd, yd)?;
        } else if x == self.state.prev_x {
            self.write_mask(mask)?;
            write!(self.dest, " ( * {} )", yd)?;
        } else if y == self.state.prev_y {
            self.write_mask(mask)?;
            write!(self.dest, " ( {} * )", xd)?;
        } else {
            self.write_mask(mask)?;
            write!(self.dest, " ( {} {} )", xd, yd)?;
        }
        self.state.prev_x = x;
        self.state.prev_y = y;
        Ok(())
    }

    fn point_ext(&mut self, x: Dbu, y: Dbu, ext: Dbu) -> DefResult<()> {
        self.bump_and_wrap()?;
        let (xd, yd, ed) = (self.defdist(x), self.defdist(y), self.defdist(ext));
        if self.state.point_cnt == 1 {
            write!(self.dest, " ( {} {} {} )", xd, yd, ed)?;
        } else if x == self.state.prev_x && y == self.state.prev_y {
            write!(self.dest, " ( * * {} )", ed)?;
        } else if x == self.state.prev_x {
            write!(self.dest, " ( * {} {} )", yd, ed)?;
        } else if y == self.state.prev_y {
            write!(self.dest, " ( {} * {} )", xd, ed)?;
        } else {
            write!(self.dest, " ( {} {} {} )", xd, yd, ed)?;
        }
        self.state.prev_x = x;
        self.state.prev_y = y;
        Ok(())
    }

    fn block_via(&mut self, via: DefViaId, mask: Option<DefViaMask>) -> DefResult<()> {
        self.bump_and_wrap()?;
        self.write_via_mask(mask)?;
        let via = self.design.via(via);
        match via.rotation {
            // Rotated vias reference their master plus an orient at 5.6+
            Some(rot) if self.version >= DefVersion::V5_6 => {
                let mname = self.via_master_name(rot.via);
                write!(self.dest, " {} {}", mname, rot.orient.to_str())?;
            }
            _ => write!(self.dest, " {}", via.name)?,
        }
        Ok(())
    }

    fn tech_via(&mut self, via: DefTechViaId, mask: Option<DefViaMask>) -> DefResult<()> {
        self.bump_and_wrap()?;
        self.write_via_mask(mask)?;
        write!(self.dest, " {}", self.design.tech_via(via).name)?;
        Ok(())
    }

    fn rule(&mut self, rule: DefNdrId) -> DefResult<()> {
        if self.state.point_cnt == 0 && self.state.active_rule != Some(rule) {
            let name = &self.design.non_default_rule(rule).name;
            write!(self.dest, " TAPERRULE {} ", name)?;
        }
        self.state.active_rule = Some(rule);
        Ok(())
    }

    fn rect(&mut self, dx1: Dbu, dy1: Dbu, dx2: Dbu, dy2: Dbu, mask: Option<u8>) -> DefResult<()> {
        self.bump_and_wrap()?;
        let (dx1, dy1) = (self.defdist(dx1), self.defdist(dy1));
        let (dx2, dy2) = (self.defdist(dx2), self.defdist(dy2));
        match mask {
            Some(m) if self.version >= DefVersion::V5_8 => write!(
                self.dest,
                " RECT MASK {} ( {} {} {} {} ) ",
                m, dx1, dy1, dx2, dy2
            )?,
            _ => write!(self.dest, " RECT ( {} {} {} {} ) ", dx1, dy1, dx2, dy2)?,
        }
        Ok(())
    }

    /// Advance the point counter, folding the line every eight elements.
    fn bump_and_wrap(&mut self) -> DefResult<()> {
        self.state.point_cnt += 1;
        if self.state.point_cnt % 8 == 0 {
            write!(self.dest, "\n    ")?;
        }
        Ok(())
    }

    fn write_mask(&mut self, mask: Option<u8>) -> DefResult<()> {
        if let Some(m) = mask {
            write!(self.dest, " MASK {}", m)?;
        }
        Ok(())
    }

    fn write_via_mask(&mut self, mask: Option<DefViaMask>) -> DefResult<()> {
        match mask {
            Some(m) if self.version >= DefVersion::V5_8 => {
                write!(self.dest, " MASK {}{}{}", m.top, m.cut, m.bottom)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn via_master_name(&self, master: DefViaMaster) -> &'ds str {
        match master {
            DefViaMaster::Tech(id) => &self.design.tech_via(id).name,
            DefViaMaster::Block(id) => &self.design.via(id).name,
        }
    }

    fn layer_name(&self, id: DefLayerId) -> &'ds str {
        let layer = self.design.layer(id);
        match (&layer.alias, self.use_layer_alias) {
            (Some(alias), true) => alias,
            _ => &layer.name,
        }
    }

    /// Rescale a database-unit value to output units.
    fn defdist(&self, v: Dbu) -> i64 {
        (v as f64 * self.dist_factor).round() as i64
    }
}
