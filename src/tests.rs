//!
//! # Unit Tests
//!
//! Build small in-memory designs and assert on their serialized text.
//!

use super::*;
use crate::utils::EnumStr;
use rust_decimal_macros::dec;

/// Empty design with one-to-one unit scaling.
fn base(name: &str) -> DefDesign {
    DefDesign {
        name: name.into(),
        def_units: 1000,
        db_units_per_micron: 1000,
        ..Default::default()
    }
}

fn placed_inst(name: &str, x: Dbu, y: Dbu) -> DefInst {
    DefInst {
        name: name.into(),
        master: DefMasterId(0),
        location: DefPoint::new(x, y),
        status: DefPlacementStatus::Placed,
        ..Default::default()
    }
}

fn iterm(inst: usize, mterm: &str, special: bool) -> DefITerm {
    DefITerm {
        inst: DefInstId(inst),
        mterm: mterm.into(),
        special,
        ..Default::default()
    }
}

#[test]
fn it_writes_header_and_die_area() -> DefResult<()> {
    let mut design = base("top");
    design.die_area = Some(DefDieArea::Rect(DefRect::new(0, 0, 5000, 5000)));
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert_eq!(
        doc,
        "VERSION 5.8 ;\n\
         DIVIDERCHAR \"|\" ;\n\
         BUSBITCHARS \"[]\" ;\n\
         DESIGN top ;\n\
         UNITS DISTANCE MICRONS 1000 ;\n\
         DIEAREA ( 0 0 ) ( 5000 5000 ) ;\n\
         COMPONENTS 0 ;\n\
         END COMPONENTS\n\
         NETS 0 ;\n\
         END NETS\n\
         END DESIGN\n"
    );
    Ok(())
}

#[test]
fn it_writes_polygon_die_area() -> DefResult<()> {
    let mut design = base("top");
    // Closed polygon: the duplicate closing vertex is dropped
    design.die_area = Some(DefDieArea::Polygon(vec![
        DefPoint::new(0, 0),
        DefPoint::new(100, 0),
        DefPoint::new(100, 100),
        DefPoint::new(0, 0),
    ]));
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("DIEAREA ( 0 0 ) ( 100 0 ) ( 100 100 ) ;"));
    Ok(())
}

#[test]
fn it_gates_namescasesensitive() -> DefResult<()> {
    let design = base("top");
    let old = to_string(
        &design,
        &DefWriterOptions {
            version: DefVersion::V5_5,
            ..Default::default()
        },
    )?;
    assert!(old.contains("VERSION 5.5 ;"));
    assert!(old.contains("NAMESCASESENSITIVE ON ;"));
    let new = to_string(&design, &DefWriterOptions::default())?;
    assert!(!new.contains("NAMESCASESENSITIVE"));
    Ok(())
}

#[test]
fn it_scales_units() -> DefResult<()> {
    let mut design = base("top");
    design.db_units_per_micron = 2000;
    design.die_area = Some(DefDieArea::Rect(DefRect::new(0, 0, 1000, 1000)));
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("UNITS DISTANCE MICRONS 1000 ;"));
    assert!(doc.contains("DIEAREA ( 0 0 ) ( 500 500 ) ;"));
    Ok(())
}

#[test]
fn it_writes_components() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    let mut i0 = placed_inst("i0", 100, 200);
    i0.status = DefPlacementStatus::Firm;
    let mut i1 = placed_inst("i1", 400, 400);
    i1.orient = DefOrient::MX;
    i1.source = Some(DefSourceType::User);
    design.insts = vec![i0, i1];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("COMPONENTS 2 ;"));
    // Firm placement surfaces as FIXED
    assert!(doc.contains("    - i0 INVX1 + FIXED ( 100 200 ) N ;"));
    assert!(doc.contains("    - i1 INVX1 + SOURCE USER + PLACED ( 400 400 ) FS ;"));
    Ok(())
}

#[test]
fn it_filters_by_selected_net() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![
        placed_inst("i0", 0, 0),
        placed_inst("i1", 100, 0),
        placed_inst("i2", 200, 0),
    ];
    design.iterms = vec![iterm(0, "A", false), iterm(1, "Z", false)];
    design.nets = vec![DefNet {
        name: "clk".into(),
        iterms: vec![DefITermId(0), DefITermId(1)],
        ..Default::default()
    }];
    let opts = DefWriterOptions {
        select_nets: vec![DefNetId(0)],
        ..Default::default()
    };
    let doc = to_string(&design, &opts)?;
    // The selected net pulls in exactly the instances it touches
    assert!(doc.contains("COMPONENTS 2 ;"));
    assert!(!doc.contains("i2"));
    assert!(doc.contains("NETS 1 ;"));
    assert!(doc.contains("    - clk ( i0 A ) ( i1 Z ) + USE SIGNAL ;"));
    Ok(())
}

#[test]
fn it_filters_by_selected_inst() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![
        placed_inst("i0", 0, 0),
        placed_inst("i1", 100, 0),
        placed_inst("i2", 200, 0),
    ];
    let opts = DefWriterOptions {
        select_insts: vec![DefInstId(2)],
        ..Default::default()
    };
    let doc = to_string(&design, &opts)?;
    assert!(doc.contains("COMPONENTS 1 ;"));
    assert!(doc.contains("    - i2 INVX1"));
    assert!(!doc.contains("- i0"));
    Ok(())
}

#[test]
fn it_excludes_all_insts_for_empty_selection_closure() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![placed_inst("i0", 0, 0), placed_inst("i1", 100, 0)];
    design.nets = vec![DefNet {
        name: "n0".into(),
        ..Default::default()
    }];
    let opts = DefWriterOptions {
        select_nets: vec![DefNetId(0)],
        ..Default::default()
    };
    let doc = to_string(&design, &opts)?;
    // A selected net touching no instance leaves nothing to emit; the
    // untouched instances do not leak through
    assert!(doc.contains("COMPONENTS 0 ;"));
    assert!(doc.contains("NETS 1 ;"));
    assert!(doc.contains("    - n0 + USE SIGNAL ;"));
    Ok(())
}

#[test]
fn it_compresses_wire_points() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "w".into(),
        wire: Some(DefWire {
            ops: vec![
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::Point {
                    x: 0,
                    y: 0,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 0,
                    y: 500,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 300,
                    y: 500,
                    mask: None,
                },
            ],
        }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("+ ROUTED metal1 ( 0 0 ) ( * 500 ) ( 300 * )"));
    Ok(())
}

#[test]
fn it_tapers_nondefault_rules() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.non_default_rules = vec![DefNonDefaultRule {
        name: "nd1".into(),
        layer_rules: vec![DefLayerRule {
            layer: DefLayerId(0),
            width: 400,
            ..Default::default()
        }],
        ..Default::default()
    }];
    design.nets = vec![DefNet {
        name: "nd_net".into(),
        non_default_rule: Some(DefNdrId(0)),
        wire: Some(DefWire {
            ops: vec![
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::Point {
                    x: 0,
                    y: 0,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 0,
                    y: 200,
                    mask: None,
                },
            ],
        }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("NONDEFAULTRULES 1 ;"));
    assert!(doc.contains("      + LAYER metal1 WIDTH 400"));
    assert!(doc.contains("+ NONDEFAULTRULE nd1"));
    // A path starting without a rule opcode carries the taper marker
    assert!(doc.contains("+ ROUTED metal1 TAPER ( 0 0 ) ( * 200 )"));
    Ok(())
}

#[test]
fn it_repeats_taper_at_each_path_start() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.non_default_rules = vec![DefNonDefaultRule {
        name: "nd1".into(),
        ..Default::default()
    }];
    design.nets = vec![DefNet {
        name: "nd_net".into(),
        non_default_rule: Some(DefNdrId(0)),
        wire: Some(DefWire {
            ops: vec![
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::Point {
                    x: 0,
                    y: 0,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 0,
                    y: 200,
                    mask: None,
                },
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::Point {
                    x: 100,
                    y: 200,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 100,
                    y: 400,
                    mask: None,
                },
            ],
        }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // The net's rule stays in effect, so every path start tapers
    assert!(doc.contains(
        "+ ROUTED metal1 TAPER ( 0 0 ) ( * 200 )\n      NEW metal1 TAPER ( 100 200 ) ( * 400 )"
    ));
    Ok(())
}

#[test]
fn it_suppresses_redundant_rule_switches() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.non_default_rules = vec![
        DefNonDefaultRule {
            name: "nd1".into(),
            ..Default::default()
        },
        DefNonDefaultRule {
            name: "nd2".into(),
            ..Default::default()
        },
    ];
    let path = DefWireOp::Path {
        kind: DefPathKind::Path,
        wire_type: DefWireType::Routed,
        layer: DefLayerId(0),
    };
    design.nets = vec![DefNet {
        name: "w".into(),
        wire: Some(DefWire {
            ops: vec![
                path,
                DefWireOp::Rule(DefNdrId(0)),
                DefWireOp::Point {
                    x: 0,
                    y: 0,
                    mask: None,
                },
                DefWireOp::Point {
                    x: 0,
                    y: 100,
                    mask: None,
                },
                path,
                DefWireOp::Rule(DefNdrId(0)),
                DefWireOp::Point {
                    x: 100,
                    y: 100,
                    mask: None,
                },
                path,
                DefWireOp::Rule(DefNdrId(1)),
                DefWireOp::Point {
                    x: 100,
                    y: 300,
                    mask: None,
                },
            ],
        }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // Switching to the rule already in effect prints nothing; a genuine
    // switch prints the new rule
    assert_eq!(doc.matches("TAPERRULE nd1").count(), 1);
    assert_eq!(doc.matches("TAPERRULE nd2").count(), 1);
    Ok(())
}

#[test]
fn it_wildcards_extended_points() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "w".into(),
        wire: Some(DefWire {
            ops: vec![
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::PointExt { x: 0, y: 0, ext: 8 },
                DefWireOp::PointExt {
                    x: 0,
                    y: 100,
                    ext: 8,
                },
                DefWireOp::PointExt {
                    x: 50,
                    y: 100,
                    ext: 4,
                },
                DefWireOp::PointExt {
                    x: 50,
                    y: 100,
                    ext: 2,
                },
            ],
        }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // Repeated coordinates wildcard; a repeated point keeps only its
    // extension
    assert!(doc.contains("+ ROUTED metal1 ( 0 0 8 ) ( * 100 8 ) ( 50 * 4 ) ( * * 2 )"));
    Ok(())
}

#[test]
fn it_masks_even_indexed_points() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "w".into(),
        wire: Some(DefWire {
            ops: vec![
                DefWireOp::Path {
                    kind: DefPathKind::Path,
                    wire_type: DefWireType::Routed,
                    layer: DefLayerId(0),
                },
                DefWireOp::Point {
                    x: 0,
                    y: 0,
                    mask: Some(1),
                },
                DefWireOp::Point {
                    x: 0,
                    y: 100,
                    mask: Some(2),
                },
                DefWireOp::Point {
                    x: 60,
                    y: 100,
                    mask: Some(3),
                },
            ],
        }),
        ..Default::default()
    }];
    let new = to_string(&design, &DefWriterOptions::default())?;
    // Only the second point's color survives
    assert!(new.contains("+ ROUTED metal1 ( 0 0 ) MASK 2 ( * 100 ) ( 60 * )"));
    assert!(!new.contains("MASK 1"));
    assert!(!new.contains("MASK 3"));
    let old = to_string(
        &design,
        &DefWriterOptions {
            version: DefVersion::V5_7,
            ..Default::default()
        },
    )?;
    assert!(!old.contains("MASK"));
    Ok(())
}

#[test]
fn it_wraps_long_point_runs() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    let mut ops = vec![DefWireOp::Path {
        kind: DefPathKind::Path,
        wire_type: DefWireType::Routed,
        layer: DefLayerId(0),
    }];
    for i in 0..10 {
        ops.push(DefWireOp::Point {
            x: i * 10,
            y: 0,
            mask: None,
        });
    }
    design.nets = vec![DefNet {
        name: "w".into(),
        wire: Some(DefWire { ops }),
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // The eighth point starts a fresh continuation line
    assert!(doc.contains("\n     ( 70 * )"));
    Ok(())
}

#[test]
fn it_is_deterministic() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![placed_inst("i1", 100, 0), placed_inst("i0", 0, 0)];
    design.rows = vec![DefRow {
        name: "row0".into(),
        site: "core".into(),
        site_count: 10,
        spacing: 400,
        ..Default::default()
    }];
    design.property_definitions = vec![DefPropDef {
        object: DefPropObject::Component,
        name: "grid".into(),
        kind: DefPropKind::Integer,
        range: None,
        value: None,
    }];
    design.insts[0].properties = vec![DefProperty::new("grid", DefPropValue::Int(3))];
    let opts = DefWriterOptions::default();
    assert_eq!(to_string(&design, &opts)?, to_string(&design, &opts)?);
    Ok(())
}

#[test]
fn it_dedups_wild_connections() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![placed_inst("i0", 0, 0), placed_inst("i1", 100, 0)];
    design.iterms = vec![iterm(0, "VDD", true), iterm(1, "VDD", true)];
    design.nets = vec![DefNet {
        name: "vdd".into(),
        special: true,
        wild_connected: true,
        sig_type: DefSigType::Power,
        iterms: vec![DefITermId(0), DefITermId(1)],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("SPECIALNETS 1 ;"));
    assert_eq!(doc.matches("( * VDD )").count(), 1);
    // All terminals are special, so no regular-net record appears
    assert!(doc.contains("NETS 0 ;"));
    Ok(())
}

#[test]
fn it_registers_properties() -> DefResult<()> {
    let mut design = base("top");
    design.property_definitions = vec![
        DefPropDef {
            object: DefPropObject::Row,
            name: "rowProp".into(),
            kind: DefPropKind::Integer,
            range: None,
            value: None,
        },
        DefPropDef {
            object: DefPropObject::Net,
            name: "cap".into(),
            kind: DefPropKind::Real,
            range: Some((dec!(0), dec!(100))),
            value: None,
        },
    ];
    design.rows = vec![
        DefRow {
            name: "row0".into(),
            site: "core".into(),
            site_count: 10,
            spacing: 400,
            properties: vec![
                DefProperty::new("rowProp", DefPropValue::Int(5)),
                DefProperty::new("hidden", DefPropValue::Int(1)),
            ],
            ..Default::default()
        },
        DefRow {
            name: "row1".into(),
            site: "core".into(),
            site_count: 10,
            spacing: 400,
            properties: vec![DefProperty::new("hidden", DefPropValue::Int(2))],
            ..Default::default()
        },
    ];
    design.nets = vec![DefNet {
        name: "n".into(),
        properties: vec![DefProperty::new("cap", DefPropValue::Real(dec!(1.5)))],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains(
        "PROPERTYDEFINITIONS\nROW rowProp INTEGER ;\nNET cap REAL RANGE 0 100 ;\nEND PROPERTYDEFINITIONS"
    ));
    // One registered name pulls in every value on the object
    assert!(doc.contains("+ PROPERTY rowProp 5 hidden 1"));
    // No registered names at all suppresses the clause
    assert!(doc.contains("ROW row1 core 0 0 N DO 10 BY 1 STEP 400 0 ;"));
    assert!(doc.contains("+ PROPERTY cap 1.5"));
    Ok(())
}

#[test]
fn it_rejects_odd_special_widths() {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "vdd".into(),
        special: true,
        sig_type: DefSigType::Power,
        swires: vec![DefSWire {
            wire_type: DefWireType::Routed,
            shield: None,
            shapes: vec![DefSpecialShape::Rect {
                layer: DefLayerId(0),
                dir: DefShapeDir::Undefined,
                rect: DefRect::new(0, 0, 5, 5),
                mask: None,
                shape_type: None,
            }],
        }],
        ..Default::default()
    }];
    match to_string(&design, &DefWriterOptions::default()) {
        Err(DefError::BadGeometry(_)) => (),
        other => panic!("expected BadGeometry, got {:?}", other),
    }
}

#[test]
fn it_writes_special_net_shapes() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "vdd".into(),
        special: true,
        sig_type: DefSigType::Power,
        swires: vec![DefSWire {
            wire_type: DefWireType::Routed,
            shield: None,
            shapes: vec![
                // Horizontal stripe: even y-span collapses to the centerline
                DefSpecialShape::Rect {
                    layer: DefLayerId(0),
                    dir: DefShapeDir::Undefined,
                    rect: DefRect::new(0, 0, 1000, 200),
                    mask: None,
                    shape_type: Some(DefWireShapeType::Stripe),
                },
                DefSpecialShape::Rect {
                    layer: DefLayerId(0),
                    dir: DefShapeDir::Vertical,
                    rect: DefRect::new(0, 0, 200, 1000),
                    mask: None,
                    shape_type: None,
                },
            ],
        }],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("+ ROUTED metal1 200 + SHAPE STRIPE ( 0 100 ) ( 1000 100 )"));
    assert!(doc.contains("\n      NEW metal1 200 ( 100 0 ) ( 100 1000 )"));
    Ok(())
}

#[test]
fn it_collapses_square_shapes_vertically() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "vdd".into(),
        special: true,
        sig_type: DefSigType::Power,
        swires: vec![DefSWire {
            wire_type: DefWireType::Routed,
            shield: None,
            shapes: vec![DefSpecialShape::Rect {
                layer: DefLayerId(0),
                dir: DefShapeDir::Undefined,
                rect: DefRect::new(0, 0, 200, 200),
                mask: None,
                shape_type: None,
            }],
        }],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // Equal even spans collapse the x-axis
    assert!(doc.contains("+ ROUTED metal1 200 ( 100 0 ) ( 100 200 )"));
    Ok(())
}

#[test]
fn it_writes_placement_variant() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![placed_inst("i0", 100, 200), {
        let mut i = placed_inst("i1", 0, 0);
        i.status = DefPlacementStatus::Unplaced;
        i
    }];
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![DefNet {
        name: "n0".into(),
        ..Default::default()
    }];
    design.bterms = vec![DefBTerm {
        name: "in".into(),
        net: Some(DefNetId(0)),
        bpins: vec![DefBPin {
            status: DefPlacementStatus::Placed,
            boxes: vec![DefBPinBox {
                layer: DefLayerId(0),
                rect: DefRect::new(0, 0, 200, 200),
                mask: None,
            }],
            ..Default::default()
        }],
        ..Default::default()
    }];
    let doc = placement_to_string(&design, &DefWriterOptions::default())?;
    assert_eq!(doc, "in 100 100 : N\nCELLS\ni0 100 200 : N\ni1\n");
    Ok(())
}

#[test]
fn it_filters_placement_pins() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.nets = vec![
        DefNet {
            name: "n0".into(),
            ..Default::default()
        },
        DefNet {
            name: "n1".into(),
            ..Default::default()
        },
    ];
    design.bterms = vec![
        DefBTerm {
            name: "a".into(),
            net: Some(DefNetId(0)),
            bpins: vec![DefBPin {
                status: DefPlacementStatus::Placed,
                boxes: vec![DefBPinBox {
                    layer: DefLayerId(0),
                    rect: DefRect::new(0, 0, 200, 200),
                    mask: None,
                }],
                ..Default::default()
            }],
            ..Default::default()
        },
        DefBTerm {
            name: "b".into(),
            net: Some(DefNetId(1)),
            ..Default::default()
        },
        DefBTerm {
            name: "c".into(),
            net: None,
            ..Default::default()
        },
    ];
    let opts = DefWriterOptions {
        select_nets: vec![DefNetId(0)],
        ..Default::default()
    };
    // Deselected and netless pins drop out of the placement form too
    let doc = placement_to_string(&design, &opts)?;
    assert_eq!(doc, "a 100 100 : N\nCELLS\n");
    Ok(())
}

#[test]
fn it_skips_netless_pins() -> DefResult<()> {
    let mut design = base("top");
    design.nets = vec![DefNet {
        name: "n0".into(),
        bterms: vec![DefBTermId(0)],
        ..Default::default()
    }];
    design.bterms = vec![
        DefBTerm {
            name: "in".into(),
            net: Some(DefNetId(0)),
            ..Default::default()
        },
        DefBTerm {
            name: "floating".into(),
            net: None,
            ..Default::default()
        },
    ];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // The netless pin is dropped from both the count and the records
    assert!(doc.contains("PINS 1 ;"));
    assert!(doc.contains("    - in + NET n0 + DIRECTION INOUT + USE SIGNAL ;"));
    assert!(!doc.contains("floating"));
    Ok(())
}

#[test]
fn it_places_boxless_pins() -> DefResult<()> {
    let mut design = base("top");
    design.nets = vec![DefNet {
        name: "n0".into(),
        ..Default::default()
    }];
    design.bterms = vec![DefBTerm {
        name: "bump".into(),
        net: Some(DefNetId(0)),
        bpins: vec![DefBPin {
            status: DefPlacementStatus::Placed,
            ..Default::default()
        }],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // No boxes still anchors the status clause at the origin
    assert!(doc.contains("    - bump + NET n0"));
    assert!(doc.contains("+ PORT\n        + PLACED ( 0 0 ) N"));
    Ok(())
}

#[test]
fn it_wraps_net_terminal_runs() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = (0..8)
        .map(|i| placed_inst(&format!("i{}", i), i as Dbu * 100, 0))
        .collect();
    design.iterms = (0..8)
        .map(|i| iterm(i, &format!("VDD{}", i), true))
        .collect();
    design.bterms = (0..8)
        .map(|i| DefBTerm {
            name: format!("p{}", i),
            net: Some(DefNetId(0)),
            ..Default::default()
        })
        .collect();
    design.nets = vec![
        DefNet {
            name: "n".into(),
            bterms: (0..8).map(DefBTermId).collect(),
            ..Default::default()
        },
        DefNet {
            name: "vdd".into(),
            special: true,
            wild_connected: true,
            sig_type: DefSigType::Power,
            iterms: (0..8).map(DefITermId).collect(),
            ..Default::default()
        },
    ];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    // The eighth pin token starts a continuation line
    assert!(doc.contains("( PIN p6 )\n      ( PIN p7 )"));
    // Wild-connect tokens stay on one line
    assert!(doc.contains("( * VDD6 ) ( * VDD7 ) + USE POWER"));
    Ok(())
}

#[test]
fn it_writes_special_nets_in_both_sections() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    design.insts = vec![placed_inst("i0", 0, 0), placed_inst("i1", 100, 0)];
    design.iterms = vec![iterm(0, "VDD", true), iterm(1, "A", false)];
    design.nets = vec![DefNet {
        name: "vdd".into(),
        special: true,
        sig_type: DefSigType::Power,
        iterms: vec![DefITermId(0), DefITermId(1)],
        ..Default::default()
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("SPECIALNETS 1 ;"));
    assert!(doc.contains("NETS 1 ;"));
    // Once with its special terminals, once with its regular ones
    assert_eq!(doc.matches("    - vdd").count(), 2);
    assert!(doc.contains("( i0 VDD )"));
    assert!(doc.contains("( i1 A )"));
    Ok(())
}

#[test]
fn it_maps_orient_keywords() {
    assert_eq!(DefOrient::MX.to_str(), "FS");
    assert_eq!(DefOrient::from_str("FN"), Some(DefOrient::MY));
    assert_eq!(DefOrient::from_str("fn"), None);
}

#[test]
fn it_uses_compact_ids() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("DFF")];
    design.insts = vec![placed_inst("cpu/reg0", 0, 0)];
    design.nets = vec![DefNet {
        name: "n".into(),
        bterms: vec![DefBTermId(0)],
        ..Default::default()
    }];
    design.bterms = vec![DefBTerm {
        name: "in".into(),
        net: Some(DefNetId(0)),
        ..Default::default()
    }];
    let opts = DefWriterOptions {
        use_net_inst_ids: true,
        use_master_ids: true,
        ..Default::default()
    };
    let doc = to_string(&design, &opts)?;
    assert!(doc.contains("    - I0 M0"));
    assert!(doc.contains("+ NET N0"));
    assert!(doc.contains("    - N0 ( PIN in )"));
    assert!(!doc.contains("cpu/reg0"));
    Ok(())
}

#[test]
fn it_writes_scan_chains() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("SDFF")];
    design.insts = vec![placed_inst("i0", 0, 0)];
    design.iterms = vec![iterm(0, "SI", false), iterm(0, "SO", false)];
    design.bterms = vec![
        DefBTerm {
            name: "si".into(),
            ..Default::default()
        },
        DefBTerm {
            name: "so".into(),
            ..Default::default()
        },
    ];
    design.scan_chains = vec![DefScanChain {
        name: "chain0".into(),
        scan_in: DefScanPin::BTerm(DefBTermId(0)),
        scan_out: DefScanPin::BTerm(DefBTermId(1)),
        partitions: vec![DefScanPartition {
            name: "p0".into(),
            lists: vec![DefScanList {
                insts: vec![DefScanInst {
                    inst: DefInstId(0),
                    scan_in: DefScanPin::ITerm(DefITermId(0)),
                    scan_out: DefScanPin::ITerm(DefITermId(1)),
                }],
            }],
        }],
    }];
    let doc = to_string(&design, &DefWriterOptions::default())?;
    assert!(doc.contains("SCANCHAINS 1 ;"));
    assert!(doc.contains(
        "- chain0\n+ START PIN si\n+ FLOATING\n  i0 ( IN SI ) ( OUT SO )\n+ PARTITION p0\n+ STOP PIN so ;"
    ));
    assert!(doc.contains("END SCANCHAINS"));
    Ok(())
}

#[test]
fn it_gates_halo_and_sensitivity() -> DefResult<()> {
    let mut design = base("top");
    design.masters = vec![DefMaster::new("INVX1")];
    let mut i0 = placed_inst("i0", 0, 0);
    i0.halo = Some(DefRect::new(10, 10, 20, 20));
    design.insts = vec![i0];
    design.nets = vec![DefNet {
        name: "n0".into(),
        ..Default::default()
    }];
    design.bterms = vec![
        DefBTerm {
            name: "in".into(),
            net: Some(DefNetId(0)),
            supply_pin: Some(DefBTermId(1)),
            ..Default::default()
        },
        DefBTerm {
            name: "VDD".into(),
            net: Some(DefNetId(0)),
            sig_type: DefSigType::Power,
            ..Default::default()
        },
    ];
    let new = to_string(&design, &DefWriterOptions::default())?;
    assert!(new.contains("+ HALO 10 10 20 20"));
    assert!(new.contains("+ SUPPLYSENSITIVITY VDD"));
    let old = to_string(
        &design,
        &DefWriterOptions {
            version: DefVersion::V5_5,
            ..Default::default()
        },
    )?;
    assert!(!old.contains("HALO"));
    assert!(!old.contains("SUPPLYSENSITIVITY"));
    Ok(())
}

#[test]
fn it_suppresses_rotated_vias() -> DefResult<()> {
    let mut design = base("top");
    design.layers = vec![DefLayer::new("metal1")];
    design.tech_vias = vec![DefTechVia {
        name: "M1_M2".into(),
        bottom_layer: DefLayerId(0),
    }];
    design.vias = vec![
        DefVia {
            name: "via0".into(),
            boxes: vec![DefViaBox {
                layer: DefLayerId(0),
                rect: DefRect::new(0, 0, 10, 10),
            }],
            ..Default::default()
        },
        DefVia {
            name: "via1".into(),
            rotation: Some(DefViaRotation {
                via: DefViaMaster::Tech(DefTechViaId(0)),
                orient: DefOrient::R90,
            }),
            ..Default::default()
        },
    ];
    let new = to_string(&design, &DefWriterOptions::default())?;
    assert!(new.contains("VIAS 1 ;"));
    assert!(new.contains("    - via0 + RECT metal1 ( 0 0 ) ( 10 10 ) ;"));
    assert!(!new.contains("via1"));
    let old = to_string(
        &design,
        &DefWriterOptions {
            version: DefVersion::V5_4,
            ..Default::default()
        },
    )?;
    assert!(old.contains("VIAS 2 ;"));
    Ok(())
}

#[test]
fn it_orders_versions() {
    assert!(DefVersion::V5_3 < DefVersion::V5_6);
    assert!(DefVersion::V5_8 > DefVersion::V5_7);
    assert_eq!(DefVersion::V5_7.to_string(), "5.7");
}
