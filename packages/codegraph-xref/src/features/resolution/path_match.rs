//! Matching caller-supplied file strings against known files

use rusqlite::params;
use std::path::Path;

use crate::features::cursor::FileCursor;
use crate::domain::SourceFile;
use crate::error::Result;
use crate::infrastructure::XrefDatabase;
use crate::shared::paths::{canonical_path, lexical_normalize, path_matches};
use crate::shared::rows::file_from_row;

impl XrefDatabase {
    /// Known files named by `fragment`: the same canonical path, or any path
    /// ending with `fragment` on a component boundary. Ordered by path.
    pub fn files_matching(&self, fragment: &str) -> Result<FileCursor<'_>> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(FileCursor::empty());
        }

        let canonical = canonical_path(Path::new(fragment));
        let lexical = lexical_normalize(fragment);
        let suffix = format!("/{}", lexical.trim_start_matches('/'));

        let mut stmt = self.conn().prepare_cached(
            "SELECT id, path FROM files
             WHERE path = ?1 OR path = ?2
                OR (length(path) > length(?3) AND substr(path, -length(?3)) = ?3)
             ORDER BY path",
        )?;
        let files = stmt
            .query_map(params![canonical, lexical, suffix], file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug_assert!(files.iter().all(|f| {
            let path = f.path.to_string_lossy();
            path == canonical || path_matches(&path, &lexical)
        }));
        Ok(FileCursor::new(files))
    }
}

pub(crate) fn file_ids_json(files: &[SourceFile]) -> String {
    let ids: Vec<i64> = files.iter().map(|f| f.id).collect();
    serde_json::Value::from(ids).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_files(paths: &[&str]) -> XrefDatabase {
        let db = XrefDatabase::in_memory().unwrap();
        for path in paths {
            db.conn()
                .execute("INSERT INTO files (path) VALUES (?1)", [path])
                .unwrap();
        }
        db
    }

    fn matched(db: &XrefDatabase, fragment: &str) -> Vec<String> {
        db.files_matching(fragment)
            .unwrap()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_partial_path_matches_suffix() {
        let db = db_with_files(&["/proj/src/a.ads", "/proj/lib/a.ads", "/proj/src/data.ads"]);

        assert_eq!(matched(&db, "a.ads"), vec!["/proj/lib/a.ads", "/proj/src/a.ads"]);
        assert_eq!(matched(&db, "src/a.ads"), vec!["/proj/src/a.ads"]);
        assert_eq!(matched(&db, "src\\a.ads"), vec!["/proj/src/a.ads"]);
        assert_eq!(matched(&db, "/proj/src/./a.ads"), vec!["/proj/src/a.ads"]);
        assert!(matched(&db, "ta.ads").is_empty());
        assert!(matched(&db, "").is_empty());
    }

    #[test]
    fn test_file_ids_json() {
        let files = vec![
            SourceFile { path: "a".into(), id: 3 },
            SourceFile { path: "b".into(), id: 5 },
        ];
        assert_eq!(file_ids_json(&files), "[3,5]");
    }
}
