//! Small Ada-like project shared by unit tests
//!
//! ```text
//! a.ads  P (X : in Integer; Y : out ...), Shape/Circle/Square with Draw,
//!        Draw_Alias, Color (Red, Green), Palette, Color_Ref, Int_Stack
//! b.adb  Q calls P and R, R calls Q          (depends on a.ads)
//! c.adb  Helper, called from Circle's Draw   (depends on b.adb)
//! ```

use std::path::Path;

use crate::domain::{
    relation_kinds, Entity, EntityFlags, EntityKey, EntityRecord, Location, ParameterKind,
    ReferenceRecord, RelationRecord, UnitIndex,
};
use crate::features::ingestion::IngestOptions;
use crate::infrastructure::{MemoryIndexSource, XrefDatabase};

pub(crate) fn key(name: &str, file: &str, line: i32, column: i32) -> EntityKey {
    EntityKey::new(name, Location::new(file, line, column))
}

fn entity(name: &str, kind: &str, file: &str, line: i32, column: i32, flags: EntityFlags) -> EntityRecord {
    EntityRecord::new(name, kind, Location::new(file, line, column)).with_flags(flags)
}

fn procedure(name: &str, file: &str, line: i32, column: i32) -> EntityRecord {
    let flags = EntityFlags {
        is_subprogram: true,
        ..Default::default()
    };
    entity(name, "procedure", file, line, column, flags)
}

fn reference(target: EntityKey, file: &str, line: i32, column: i32, kind_id: char, scope: Option<EntityKey>) -> ReferenceRecord {
    ReferenceRecord {
        entity: target,
        location: Location::new(file, line, column),
        kind_id,
        scope,
    }
}

fn relation(from: EntityKey, to: EntityKey, kind: &str, order: i32) -> RelationRecord {
    RelationRecord {
        from,
        to,
        kind: kind.to_string(),
        order,
        parameter_kind: None,
    }
}

pub(crate) fn sample_units() -> Vec<UnitIndex> {
    const A: &str = "/src/a.ads";
    const B: &str = "/src/b.adb";
    const C: &str = "/src/c.adb";

    let type_flags = EntityFlags {
        is_type: true,
        ..Default::default()
    };
    let tagged = EntityFlags {
        is_type: true,
        has_methods: true,
        ..Default::default()
    };

    let mut a = UnitIndex::new("/obj/a.ali", 1);
    a.source_files.push(A.into());
    a.entities = vec![
        procedure("P", A, 2, 14),
        entity("X", "integer object", A, 2, 17, EntityFlags::default()),
        entity("Y", "integer object", A, 2, 27, EntityFlags::default()),
        entity("Shape", "record type", A, 4, 9, tagged),
        entity("X_Pos", "float component", A, 4, 30, EntityFlags::default()),
        procedure("Draw", A, 5, 14),
        entity("Circle", "record type", A, 8, 9, tagged),
        procedure("Draw", A, 9, 14),
        entity("Square", "record type", A, 12, 9, tagged),
        procedure("Draw_Alias", A, 14, 14),
        entity("Color", "enumeration type", A, 16, 9, type_flags),
        entity("Red", "enumeration literal", A, 16, 19, EntityFlags::default()),
        entity("Green", "enumeration literal", A, 16, 24, EntityFlags::default()),
        entity(
            "Palette",
            "array type",
            A,
            17,
            9,
            EntityFlags {
                is_array: true,
                ..type_flags
            },
        ),
        entity(
            "Color_Ref",
            "access type",
            A,
            18,
            9,
            EntityFlags {
                is_access: true,
                ..type_flags
            },
        ),
        entity(
            "Generic_Stack",
            "generic package",
            A,
            20,
            21,
            EntityFlags {
                is_generic: true,
                is_container: true,
                ..Default::default()
            },
        ),
        entity("Int_Stack", "package", A, 22, 12, EntityFlags::default()),
        EntityRecord {
            name: "Integer".to_string(),
            kind: "integer type".to_string(),
            decl: None,
            flags: type_flags,
        },
    ];
    a.references = vec![
        reference(EntityKey::predefined("Integer"), A, 2, 22, 'r', Some(key("P", A, 2, 14))),
        reference(key("Shape", A, 4, 9), A, 8, 30, 'x', Some(key("Circle", A, 8, 9))),
    ];

    let p = key("P", A, 2, 14);
    let draw = key("Draw", A, 5, 14);
    let circle_draw = key("Draw", A, 9, 14);
    let color = key("Color", A, 16, 9);
    a.relations = vec![
        RelationRecord {
            parameter_kind: Some(ParameterKind::Out),
            ..relation(p.clone(), key("Y", A, 2, 27), relation_kinds::HAS_PARAMETER, 2)
        },
        RelationRecord {
            parameter_kind: Some(ParameterKind::In),
            ..relation(p, key("X", A, 2, 17), relation_kinds::HAS_PARAMETER, 1)
        },
        relation(key("Circle", A, 8, 9), key("Shape", A, 4, 9), relation_kinds::PARENT_TYPE, 0),
        relation(key("Square", A, 12, 9), key("Shape", A, 4, 9), relation_kinds::PARENT_TYPE, 0),
        relation(key("Shape", A, 4, 9), draw.clone(), relation_kinds::HAS_PRIMITIVE, 0),
        relation(key("Circle", A, 8, 9), circle_draw.clone(), relation_kinds::HAS_PRIMITIVE, 0),
        relation(circle_draw.clone(), draw, relation_kinds::OVERRIDES, 0),
        relation(key("Draw_Alias", A, 14, 14), circle_draw.clone(), relation_kinds::RENAMES, 0),
        relation(key("Shape", A, 4, 9), key("X_Pos", A, 4, 30), relation_kinds::HAS_FIELD, 1),
        relation(color.clone(), key("Green", A, 16, 24), relation_kinds::HAS_LITERAL, 2),
        relation(color.clone(), key("Red", A, 16, 19), relation_kinds::HAS_LITERAL, 1),
        relation(key("Palette", A, 17, 9), color.clone(), relation_kinds::COMPONENT_TYPE, 0),
        relation(key("Color_Ref", A, 18, 9), color, relation_kinds::POINTED_TYPE, 0),
        relation(
            key("Int_Stack", A, 22, 12),
            key("Generic_Stack", A, 20, 21),
            relation_kinds::INSTANCE_OF,
            0,
        ),
    ];

    let q = key("Q", B, 1, 11);
    let r = key("R", B, 6, 11);
    let mut b = UnitIndex::new("/obj/b.ali", 1);
    b.source_files.push(B.into());
    b.dependencies.push(A.into());
    b.entities = vec![procedure("Q", B, 1, 11), procedure("R", B, 6, 11)];
    b.references = vec![
        reference(key("P", A, 2, 14), B, 3, 4, 's', Some(q.clone())),
        reference(r.clone(), B, 4, 4, 's', Some(q.clone())),
        reference(q.clone(), B, 5, 5, 't', Some(q.clone())),
        reference(q, B, 8, 4, 's', Some(r)),
    ];

    let mut c = UnitIndex::new("/obj/c.ali", 1);
    c.source_files.push(C.into());
    c.dependencies.push(B.into());
    c.entities = vec![procedure("Helper", C, 2, 14)];
    c.references = vec![reference(key("Helper", C, 2, 14), C, 5, 7, 's', Some(circle_draw))];

    vec![a, b, c]
}

pub(crate) fn sample_db() -> XrefDatabase {
    let mut db = XrefDatabase::in_memory().unwrap();
    let source: MemoryIndexSource = sample_units().into_iter().collect();
    let stats = db.update(&source, IngestOptions::new()).unwrap();
    assert_eq!(stats.failed, 0);
    db
}

/// The entity named `name` declared in `file` at `line`
pub(crate) fn entity_at(db: &XrefDatabase, name: &str, file: &str, line: i32) -> Entity {
    db.entities_named(name)
        .unwrap()
        .find(|e| {
            let decl = db.get_declaration(*e).unwrap();
            decl.location.line == line
                && decl
                    .location
                    .file
                    .as_ref()
                    .is_some_and(|f| f.path == Path::new(file))
        })
        .unwrap_or_else(|| panic!("no {} declared at {}:{}", name, file, line))
}
