//! File path normalization
//!
//! Paths are stored and compared as slash-separated strings. Files that exist
//! are canonicalized (symlinks resolved); others are normalized lexically so
//! that index records naming files absent from this machine still compare.

use std::path::Path;

/// Canonical slash-separated form of `path`
pub fn canonical_path(path: &Path) -> String {
    match std::fs::canonicalize(path) {
        Ok(real) => lexical_normalize(&real.to_string_lossy()),
        Err(_) => lexical_normalize(&path.to_string_lossy()),
    }
}

/// Slash-separated form with `.`, empty and resolvable `..` components removed
pub fn lexical_normalize(raw: &str) -> String {
    let raw = raw.replace('\\', "/");
    let absolute = raw.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in raw.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            part => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Whether `known` (a stored path) is `wanted` or ends with it as whole components
pub fn path_matches(known: &str, wanted: &str) -> bool {
    known == wanted
        || (known.len() > wanted.len()
            && known.ends_with(wanted)
            && known.as_bytes()[known.len() - wanted.len() - 1] == b'/')
}
