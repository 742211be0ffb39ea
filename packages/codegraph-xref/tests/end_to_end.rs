//! Lookup scenarios over a freshly ingested two-file project

mod common;

use codegraph_xref::{
    ClosureFlags, IngestOptions, Location, Reference, UnitIndex, XrefDatabase,
};
use common::*;
use pretty_assertions::assert_eq;

fn ingested() -> XrefDatabase {
    let mut db = XrefDatabase::in_memory().unwrap();
    db.update(&two_file_project(), IngestOptions::new()).unwrap();
    db
}

#[test]
fn test_callers_and_references_of_p() {
    let db = ingested();
    let p = named(&db, "P");
    let q = named(&db, "Q");

    let callers: Vec<_> = db.callers(p).unwrap().collect();
    assert_eq!(callers, vec![q]);
    assert_eq!(db.get_declaration(callers[0]).unwrap().name, "Q");
    assert_eq!(
        db.get_declaration(callers[0]).unwrap().location.file.unwrap().path,
        std::path::PathBuf::from(B_ADS)
    );

    let refs: Vec<Reference> = db.references(p).unwrap().collect();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].kind_id, 'D');
    assert_eq!((refs[0].line, refs[0].column), (1, 11));
    assert_eq!(refs[1].kind_id, 's');
    assert_eq!((refs[1].line, refs[1].column), (4, 7));
    assert_eq!(refs[1].scope, q);
    assert!(db.is_real_reference(&refs[1]));
    assert!(db.show_in_callgraph(&refs[1]));
}

#[test]
fn test_exact_resolution() {
    let db = ingested();
    let p = named(&db, "P");

    let at_call = db.resolve_entity("P", B_ADS, Some(4), Some(7)).unwrap();
    assert_eq!(at_call.entity, p);
    assert!(!at_call.is_fuzzy());
    assert_eq!(at_call.kind_id, 's');

    let at_decl = db.resolve_entity("P", "src/a.ads", Some(1), Some(11)).unwrap();
    assert_eq!(at_decl.entity, p);
    assert!(!at_decl.is_fuzzy());

    let by_file = db.resolve_entity("P", "a.ads", None, None).unwrap();
    assert_eq!(by_file.entity, p);
    assert!(!by_file.is_fuzzy());
}

#[test]
fn test_fuzzy_one_line_away() {
    let db = ingested();
    let p = named(&db, "P");

    let near = db.resolve_entity("P", "b.ads", Some(5), Some(7)).unwrap();
    assert!(!near.is_null());
    assert!(near.is_fuzzy());
    assert_eq!(near.entity, p);
    assert_eq!(near.line, 4);
}

#[test]
fn test_name_only_fallback_and_unknown() {
    let db = ingested();

    let elsewhere = db.resolve_entity("P", "unrelated.adb", Some(10), Some(1)).unwrap();
    assert!(elsewhere.is_fuzzy());
    assert_eq!(elsewhere.entity, named(&db, "P"));
    assert_eq!(elsewhere.kind_id, 'D');

    let unknown = db.resolve_entity("Nope", B_ADS, Some(4), Some(7)).unwrap();
    assert!(unknown.is_null());
    assert!(!unknown.is_fuzzy());
    assert_eq!(unknown.line, -1);
}

#[test]
fn test_visible_column_resolution() {
    let mut a = UnitIndex::new("/proj/obj/tabs.ali", 1);
    a.source_files.push("/proj/src/tabs.adb".into());
    let line = "A:\t\tB;";
    let column = codegraph_xref::to_visible_column(line, 5, 8);
    assert_eq!(column, 17);
    a.entities.push(codegraph_xref::EntityRecord::new(
        "B",
        "integer object",
        Location::new("/proj/src/tabs.adb", 3, column),
    ));

    let mut db = XrefDatabase::in_memory().unwrap();
    db.update(&vec![a].into_iter().collect::<codegraph_xref::MemoryIndexSource>(), IngestOptions::new())
        .unwrap();

    let col = db.visible_column(line, 5);
    let found = db.resolve_entity("B", "tabs.adb", Some(3), Some(col)).unwrap();
    assert!(!found.is_fuzzy());
    assert_eq!(found.column, 17);
}

#[test]
fn test_file_dependencies() {
    let db = ingested();
    let b = db.file(B_ADS).unwrap().unwrap();
    let a = db.file(A_ADS).unwrap().unwrap();

    assert_eq!(db.imports(&b).unwrap().collect::<Vec<_>>(), vec![a.clone()]);
    assert_eq!(db.imported_by(&a).unwrap().collect::<Vec<_>>(), vec![b.clone()]);
    assert_eq!(db.depends_on(&b).unwrap().collect::<Vec<_>>(), vec![a]);
}

#[test]
fn test_queries_are_deterministic() {
    let db = ingested();
    let q = named(&db, "Q");

    let first: Vec<_> = db.recursive(q, XrefDatabase::calls, ClosureFlags::all()).collect();
    let second: Vec<_> = db.recursive(q, XrefDatabase::calls, ClosureFlags::all()).collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![named(&db, "P")]);
    assert_eq!(snapshot(&db), snapshot(&db));
}

#[test]
fn test_call_chain_closure() {
    let mut db = XrefDatabase::in_memory().unwrap();
    let source: codegraph_xref::MemoryIndexSource = chain_project(12).into_iter().collect();
    db.update(&source, IngestOptions::new()).unwrap();

    let top = named(&db, "Proc_11");
    let reached: Vec<String> = db
        .recursive(top, XrefDatabase::calls, ClosureFlags::default())
        .map(|e| db.get_declaration(e).unwrap().name)
        .collect();
    let expected: Vec<String> = (0..11).rev().map(|i| format!("Proc_{}", i)).collect();
    assert_eq!(reached, expected);

    let ancestors = db
        .recursive(named(&db, "T_11"), XrefDatabase::parent_types, ClosureFlags::default())
        .count();
    assert_eq!(ancestors, 11);
}
