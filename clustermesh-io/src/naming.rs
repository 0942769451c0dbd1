//! File names for simplified meshes

use std::path::{Path, PathBuf};

/// Extension of saved meshes
pub const MESH_EXTENSION: &str = "obj";

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const UNNAMED: &str = "unnamed";

/// Replace every run of characters that are invalid in a file name with a
/// single `_`. An empty name becomes `unnamed`.
pub fn safe_file_name(name: &str) -> String {
    if name.is_empty() {
        return UNNAMED.to_string();
    }

    let mut safe = String::with_capacity(name.len());
    let mut last_was_invalid = false;
    for c in name.chars() {
        if INVALID_CHARS.contains(&c) || c.is_ascii_control() {
            if !last_was_invalid {
                safe.push('_');
            }
            last_was_invalid = true;
        } else {
            safe.push(c);
            last_was_invalid = false;
        }
    }
    safe
}

/// How the simplified mesh is named relative to its source mesh
#[derive(Debug, Clone, PartialEq)]
pub enum NamingScheme {
    /// `<mesh>`
    Overwrite,
    /// `<mesh>_<percent>%`, percent truncated to an integer
    Percent(f32),
    /// `<mesh>_<affinity>_<linkage>_<parameter>:<value>`
    Advanced {
        affinity: String,
        linkage: String,
        parameter: String,
        value: u64,
    },
    /// A caller-chosen name
    Custom(String),
}

impl NamingScheme {
    /// Unsanitized file stem for a mesh called `mesh_name`.
    pub fn stem(&self, mesh_name: &str) -> String {
        match self {
            NamingScheme::Overwrite => mesh_name.to_string(),
            NamingScheme::Percent(percent) => format!("{}_{}%", mesh_name, percent.trunc() as i64),
            NamingScheme::Advanced {
                affinity,
                linkage,
                parameter,
                value,
            } => format!("{}_{}_{}_{}:{}", mesh_name, affinity, linkage, parameter, value),
            NamingScheme::Custom(name) => name.clone(),
        }
    }

    /// Sanitized file name including the mesh extension.
    pub fn file_name(&self, mesh_name: &str) -> String {
        format!("{}.{}", safe_file_name(&self.stem(mesh_name)), MESH_EXTENSION)
    }

    /// Output path in `dir`. Unless `overwrite` is set an existing file is
    /// never replaced; see [`unique_path`].
    pub fn output_path(&self, dir: &Path, mesh_name: &str, overwrite: bool) -> PathBuf {
        let path = dir.join(self.file_name(mesh_name));
        if overwrite {
            path
        } else {
            unique_path(&path)
        }
    }
}

/// Return `path` if nothing exists there, otherwise the first free
/// `<stem> 1.<ext>`, `<stem> 2.<ext>`, ... next to it.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u64..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{} {}.{}", stem, n, ext),
                None => format!("{} {}", stem, n),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("bunny"), "bunny");
        assert_eq!(safe_file_name("a/b\\c"), "a_b_c");
        assert_eq!(safe_file_name("what?*<>"), "what_");
        assert_eq!(safe_file_name("tab\there"), "tab_here");
        assert_eq!(safe_file_name("50%"), "50%");
        assert_eq!(safe_file_name(""), "unnamed");
    }

    #[test]
    fn test_scheme_file_names() {
        assert_eq!(NamingScheme::Overwrite.file_name("bunny"), "bunny.obj");
        assert_eq!(NamingScheme::Percent(37.9).file_name("bunny"), "bunny_37%.obj");
        let advanced = NamingScheme::Advanced {
            affinity: "euclidean".to_string(),
            linkage: "ward".to_string(),
            parameter: "nClusters".to_string(),
            value: 120,
        };
        assert_eq!(advanced.stem("bunny"), "bunny_euclidean_ward_nClusters:120");
        assert_eq!(advanced.file_name("bunny"), "bunny_euclidean_ward_nClusters_120.obj");
        assert_eq!(
            NamingScheme::Custom("low|poly".to_string()).file_name("bunny"),
            "low_poly.obj"
        );
        assert_eq!(NamingScheme::Custom(String::new()).file_name("bunny"), "unnamed.obj");
    }

    #[test]
    fn test_unique_path_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mesh.obj");
        assert_eq!(unique_path(&path), path);

        fs::write(&path, "").unwrap();
        let first = unique_path(&path);
        assert_eq!(first, dir.path().join("mesh 1.obj"));

        fs::write(&first, "").unwrap();
        assert_eq!(unique_path(&path), dir.path().join("mesh 2.obj"));
    }

    #[test]
    fn test_output_path_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bunny.obj"), "").unwrap();

        let scheme = NamingScheme::Overwrite;
        assert_eq!(
            scheme.output_path(dir.path(), "bunny", true),
            dir.path().join("bunny.obj")
        );
        assert_eq!(
            scheme.output_path(dir.path(), "bunny", false),
            dir.path().join("bunny 1.obj")
        );
    }
}
