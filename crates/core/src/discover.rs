//! Expanding a compiled glob into concrete source paths.

use crate::{BidsError, BidsResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const PATH_SEPARATOR: char = '/';

/// Returns every file matching `glob`, in sorted walk order.
///
/// `*` matches any run of characters except `/`. As in a shell glob, a name starting with
/// `.` only matches when the glob component it is matched against also starts with `.`,
/// so hidden files such as `._T1.nii.gz` are left alone. The walk starts at the longest
/// directory prefix free of wildcards and descends exactly as deep as the glob does.
/// Entries that cannot be read are logged and skipped; a missing start directory yields no
/// matches.
///
/// # Errors
///
/// Returns `BidsError::GlobPattern` if the glob cannot be turned into a matcher.
pub fn discover(glob: &str) -> BidsResult<Vec<PathBuf>> {
    let matcher = glob_regex(glob)?;

    let Some(first_wildcard) = glob.find('*') else {
        let path = PathBuf::from(glob);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    };

    let (root, relative) = match glob[..first_wildcard].rfind(PATH_SEPARATOR) {
        Some(0) => ("/", &glob[1..]),
        Some(index) => (&glob[..index], &glob[index + 1..]),
        None => (".", glob),
    };
    let components: Vec<&str> = relative.split(PATH_SEPARATOR).collect();
    let depth = components.len();

    if !Path::new(root).is_dir() {
        tracing::warn!("search root {} is not a directory; nothing to convert", root);
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(depth)
        .max_depth(depth)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry while searching {}: {}", root, e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let below_root = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if is_hidden(below_root, &components) {
            tracing::debug!("skipping hidden entry {}", entry.path().display());
            continue;
        }

        // A walk from "." yields "./a/b"; the glob says "a/b".
        let path = if root == "." {
            entry
                .path()
                .strip_prefix(".")
                .unwrap_or(entry.path())
                .to_path_buf()
        } else {
            entry.into_path()
        };

        if matcher.is_match(&path.to_string_lossy()) {
            matches.push(path);
        }
    }

    tracing::debug!("glob '{}' matched {} file(s)", glob, matches.len());
    Ok(matches)
}

/// True if a component of `path` starts with `.` while the glob component at the same
/// position does not.
fn is_hidden(path: &Path, components: &[&str]) -> bool {
    path.components()
        .zip(components)
        .any(|(name, pattern)| {
            name.as_os_str().to_string_lossy().starts_with('.') && !pattern.starts_with('.')
        })
}

/// Builds an anchored regex for `glob` where `*` never crosses a path separator.
fn glob_regex(glob: &str) -> BidsResult<Regex> {
    let body = glob
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("[^/]*");

    Regex::new(&format!("^{}$", body)).map_err(|source| BidsError::GlobPattern {
        pattern: glob.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_glob_regex() {
        let re = glob_regex("/data/*/*_raw.nii.gz").unwrap();

        assert!(re.is_match("/data/01/T1_raw.nii.gz"));
        assert!(!re.is_match("/data/01/extra/T1_raw.nii.gz"));
        assert!(!re.is_match("/data/01/T1_raw.nii.gz.bak"));
        assert!(!re.is_match("/data/01/T1_rawXnii.gz"));
    }

    #[test]
    fn test_discover_matches_depth_and_suffix() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        touch(&root.join("01/pre/T1_raw.nii.gz"));
        touch(&root.join("01/post/T2_raw.nii.gz"));
        touch(&root.join("02/pre/T1_raw.nii"));
        touch(&root.join("02/pre/deeper/T1_raw.nii.gz"));
        touch(&root.join("notes.txt"));

        let glob = format!("{}/*/*/*_raw.nii*", root.display());
        let found = discover(&glob).unwrap();

        assert_eq!(
            found,
            vec![
                root.join("01/post/T2_raw.nii.gz"),
                root.join("01/pre/T1_raw.nii.gz"),
                root.join("02/pre/T1_raw.nii"),
            ]
        );
    }

    #[test]
    fn test_discover_skips_hidden_names() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        touch(&root.join("01/pre/T1_raw.nii.gz"));
        touch(&root.join("01/pre/._T1_raw.nii.gz"));
        touch(&root.join(".trash/pre/T2_raw.nii.gz"));

        let glob = format!("{}/*/*/*_raw.nii.gz", root.display());
        let found = discover(&glob).unwrap();

        assert_eq!(found, vec![root.join("01/pre/T1_raw.nii.gz")]);
    }

    #[test]
    fn test_discover_matches_dot_names_when_glob_names_them() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        touch(&root.join(".staging/01/T1.nii.gz"));
        touch(&root.join("01/.T2.nii.gz"));

        let found = discover(&format!("{}/.*/*/*.nii.gz", root.display())).unwrap();
        assert_eq!(found, vec![root.join(".staging/01/T1.nii.gz")]);

        let found = discover(&format!("{}/*/.*.nii.gz", root.display())).unwrap();
        assert_eq!(found, vec![root.join("01/.T2.nii.gz")]);
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let glob = format!("{}/missing/*/*.nii.gz", temp.path().display());

        assert!(discover(&glob).unwrap().is_empty());
    }

    #[test]
    fn test_discover_without_wildcards() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("only.nii.gz");
        touch(&file);

        let found = discover(file.to_str().unwrap()).unwrap();
        assert_eq!(found, vec![file.clone()]);

        let missing = temp.path().join("absent.nii.gz");
        assert!(discover(missing.to_str().unwrap()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_follows_directory_symlinks() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("real");
        touch(&real.join("pre/T1.nii.gz"));
        let root = temp.path().join("data");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(&real, root.join("01")).unwrap();

        let glob = format!("{}/*/*/*.nii.gz", root.display());
        let found = discover(&glob).unwrap();

        assert_eq!(found, vec![root.join("01/pre/T1.nii.gz")]);
    }
}
