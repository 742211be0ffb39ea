//! Shared builders for integration tests

#![allow(dead_code)]

use codegraph_xref::domain::relation_kinds;
use codegraph_xref::{
    Entity, EntityFlags, EntityKey, EntityRecord, Location, MemoryIndexSource, ReferenceRecord,
    RelationRecord, UnitIndex, XrefDatabase,
};

pub const A_ADS: &str = "/proj/src/a.ads";
pub const B_ADS: &str = "/proj/src/b.ads";

pub fn key(name: &str, file: &str, line: i32, column: i32) -> EntityKey {
    EntityKey::new(name, Location::new(file, line, column))
}

pub fn procedure(name: &str, file: &str, line: i32, column: i32) -> EntityRecord {
    EntityRecord::new(name, "procedure", Location::new(file, line, column)).with_flags(EntityFlags {
        is_subprogram: true,
        ..Default::default()
    })
}

pub fn call(target: EntityKey, file: &str, line: i32, column: i32, scope: EntityKey) -> ReferenceRecord {
    ReferenceRecord {
        entity: target,
        location: Location::new(file, line, column),
        kind_id: 's',
        scope: Some(scope),
    }
}

/// `a.ads` declares procedure P; `b.ads` declares Q whose body calls P once
pub fn two_file_project() -> MemoryIndexSource {
    let mut a = UnitIndex::new("/proj/obj/a.ali", 100);
    a.source_files.push(A_ADS.into());
    a.entities.push(procedure("P", A_ADS, 1, 11));

    let mut b = UnitIndex::new("/proj/obj/b.ali", 100);
    b.source_files.push(B_ADS.into());
    b.dependencies.push(A_ADS.into());
    b.entities.push(procedure("Q", B_ADS, 2, 11));
    b.references.push(call(key("P", A_ADS, 1, 11), B_ADS, 4, 7, key("Q", B_ADS, 2, 11)));

    vec![a, b].into_iter().collect()
}

/// `count` units, each declaring `Proc_<i>` that calls `Proc_<i-1>`,
/// plus a type hierarchy threaded through them
pub fn chain_project(count: usize) -> Vec<UnitIndex> {
    let file = |i: usize| format!("/proj/src/unit_{:03}.adb", i);
    let mut units = Vec::new();

    for i in 0..count {
        let path = file(i);
        let mut unit = UnitIndex::new(format!("/proj/obj/unit_{:03}.ali", i), 10);
        unit.source_files.push(path.clone().into());
        unit.entities.push(procedure(&format!("Proc_{}", i), &path, 3, 11));
        unit.entities.push(EntityRecord::new(
            format!("T_{}", i),
            "record type",
            Location::new(&path, 1, 6),
        ));

        if i > 0 {
            let prev = file(i - 1);
            unit.dependencies.push(prev.clone().into());
            unit.references.push(call(
                key(&format!("Proc_{}", i - 1), &prev, 3, 11),
                &path,
                5,
                4,
                key(&format!("Proc_{}", i), &path, 3, 11),
            ));
            unit.relations.push(RelationRecord {
                from: key(&format!("T_{}", i), &path, 1, 6),
                to: key(&format!("T_{}", i - 1), &prev, 1, 6),
                kind: relation_kinds::PARENT_TYPE.to_string(),
                order: 0,
                parameter_kind: None,
            });
        }
        units.push(unit);
    }
    units
}

pub fn named(db: &XrefDatabase, name: &str) -> Entity {
    db.entities_named(name)
        .unwrap()
        .next()
        .unwrap_or_else(|| panic!("no entity named {}", name))
}

/// Query-visible contents, by names and positions only (no ids)
pub fn snapshot(db: &XrefDatabase) -> Vec<String> {
    let mut lines = Vec::new();
    for file in db.all_files().unwrap() {
        for entity in db.referenced_in(&file, None).unwrap() {
            let decl = db.get_declaration(entity).unwrap();
            for r in db.references(entity).unwrap() {
                let path = r.file.map(|f| f.path.display().to_string()).unwrap_or_default();
                lines.push(format!(
                    "{} {} {}:{}:{} {}",
                    decl.name, decl.kind, path, r.line, r.column, r.kind_id
                ));
            }
            for callee in db.calls(entity).unwrap() {
                lines.push(format!("{} calls {}", decl.name, db.get_declaration(callee).unwrap().name));
            }
            for parent in db.parent_types(entity).unwrap() {
                lines.push(format!("{} extends {}", decl.name, db.get_declaration(parent).unwrap().name));
            }
        }
        for dep in db.imports(&file).unwrap() {
            lines.push(format!("{} imports {}", file.path.display(), dep.path.display()));
        }
    }
    lines.sort();
    lines.dedup();
    lines
}
