//! Files exchanged with the clustering stage

use std::path::{Path, PathBuf};

use clustermesh_core::{Error, Result};

pub const VERTICES_FILE: &str = "vertices.csv";
pub const PARAMETERS_FILE: &str = "parameters.json";
pub const RESULT_FILE: &str = "result.csv";

/// Vertex input, parameter input and merge-log output of one clustering run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplificationPaths {
    pub vertices: PathBuf,
    pub parameters: PathBuf,
    pub result: PathBuf,
}

impl SimplificationPaths {
    pub fn new(
        vertices: impl Into<PathBuf>,
        parameters: impl Into<PathBuf>,
        result: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vertices: vertices.into(),
            parameters: parameters.into(),
            result: result.into(),
        }
    }

    /// Default file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(VERTICES_FILE),
            dir.join(PARAMETERS_FILE),
            dir.join(RESULT_FILE),
        )
    }

    /// Fail unless the directory of every path exists.
    pub fn check_directories(&self) -> Result<()> {
        for path in [&self.vertices, &self.parameters, &self.result] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(Error::Configuration(format!(
                        "Directory \"{}\" does not exist",
                        parent.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for SimplificationPaths {
    fn default() -> Self {
        Self::new(VERTICES_FILE, PARAMETERS_FILE, RESULT_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let paths = SimplificationPaths::default();
        assert_eq!(paths.vertices, PathBuf::from("vertices.csv"));
        assert_eq!(paths.parameters, PathBuf::from("parameters.json"));
        assert_eq!(paths.result, PathBuf::from("result.csv"));
        assert!(paths.check_directories().is_ok());
    }

    #[test]
    fn test_in_dir_and_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = SimplificationPaths::in_dir(dir.path());
        assert_eq!(paths.result, dir.path().join("result.csv"));
        assert!(paths.check_directories().is_ok());

        let paths = SimplificationPaths::in_dir(dir.path().join("missing"));
        assert!(matches!(
            paths.check_directories(),
            Err(Error::Configuration(_))
        ));
    }
}
