//! Artifact export
//!
//! Copies the source artifact (typically the run's YAML config) of every
//! run behind a selected row into `<dest>/<method>/`, named
//! `Run_<run_index>_Selected_Epoch_<epoch>` plus the source extension
//! (`.yaml` when the source has none).
//!
//! Failures are collected per file, including runs with no artifact
//! reference; they never invalidate the table.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

/// Side-effecting boundary used to persist selected artifacts.
pub trait ArtifactSink {
    /// Copy `source` into `dest_dir` as `file_name`, returning the written path.
    ///
    /// Overwriting an existing destination must succeed.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    fn copy_artifact(&self, source: &Path, dest_dir: &Path, file_name: &str) -> io::Result<PathBuf>;
}

/// Filesystem sink: creates `dest_dir` as needed and copies with `fs::copy`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArtifactSink;

impl ArtifactSink for FsArtifactSink {
    fn copy_artifact(&self, source: &Path, dest_dir: &Path, file_name: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(dest_dir)?;
        let destination = dest_dir.join(file_name);
        fs::copy(source, &destination)?;
        Ok(destination)
    }
}

/// Export file name for one run of a selected row.
///
/// Keeps the extension of `source`, so `opt.json` becomes
/// `Run_2_Selected_Epoch_14.json`; extension-less sources get `.yaml`.
#[must_use]
pub fn export_file_name(run_index: u64, epoch: u64, source: &Path) -> String {
    let ext = source
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or(DEFAULT_EXTENSION);
    format!("Run_{run_index}_Selected_Epoch_{epoch}.{ext}")
}

/// Extension used when the source artifact has none.
pub const DEFAULT_EXTENSION: &str = "yaml";

/// Error recorded for a selected run that carries no artifact reference.
pub const MISSING_ARTIFACT: &str = "no artifact reference";

/// One artifact that could not be exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    /// Method of the selected row
    pub method: String,
    /// Source artifact
    pub source: PathBuf,
    /// Intended destination
    pub destination: PathBuf,
    /// Rendered IO error
    pub error: String,
}

/// Outcome of an export pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Written files
    pub copied: Vec<PathBuf>,
    /// Per-file failures
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// True if every artifact was copied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Copy the artifacts of one row.
    ///
    /// `runs` yields `(run_index, epoch, artifact)`; empty artifact
    /// references are recorded as failures.
    pub(crate) fn export_row<'a, S, I>(&mut self, sink: &S, dest_root: &Path, method: &str, runs: I)
    where
        S: ArtifactSink + ?Sized,
        I: IntoIterator<Item = (u64, u64, &'a str)>,
    {
        let dest_dir = dest_root.join(method);
        for (run_index, epoch, artifact) in runs {
            let source = Path::new(artifact);
            let file_name = export_file_name(run_index, epoch, source);
            if artifact.is_empty() {
                warn!(method, run_index, epoch, "selected run has no artifact reference");
                self.failures.push(ExportFailure {
                    method: method.to_string(),
                    source: PathBuf::new(),
                    destination: dest_dir.join(&file_name),
                    error: MISSING_ARTIFACT.to_string(),
                });
                continue;
            }
            match sink.copy_artifact(source, &dest_dir, &file_name) {
                Ok(path) => self.copied.push(path),
                Err(err) => {
                    warn!(method, source = %source.display(), error = %err, "artifact export failed");
                    self.failures.push(ExportFailure {
                        method: method.to_string(),
                        source: source.to_path_buf(),
                        destination: dest_dir.join(&file_name),
                        error: err.to_string(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSink {
        calls: RefCell<Vec<(PathBuf, PathBuf, String)>>,
    }

    impl ArtifactSink for RecordingSink {
        fn copy_artifact(&self, source: &Path, dest_dir: &Path, file_name: &str) -> io::Result<PathBuf> {
            self.calls.borrow_mut().push((
                source.to_path_buf(),
                dest_dir.to_path_buf(),
                file_name.to_string(),
            ));
            if source.ends_with("missing.yaml") {
                return Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
            }
            Ok(dest_dir.join(file_name))
        }
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(2, 14, Path::new("logs/run2/opt.yaml")),
            "Run_2_Selected_Epoch_14.yaml"
        );
        assert_eq!(
            export_file_name(1, 3, Path::new("logs/run1/opt.json")),
            "Run_1_Selected_Epoch_3.json"
        );
        assert_eq!(export_file_name(0, 1, Path::new("cfg")), "Run_0_Selected_Epoch_1.yaml");
    }

    #[test]
    fn test_export_row_collects_failures() {
        let sink = RecordingSink::default();
        let mut report = ExportReport::default();
        report.export_row(
            &sink,
            Path::new("out"),
            "Adv",
            vec![(0, 5, "a/opt.yaml"), (1, 5, ""), (2, 5, "b/missing.yaml")],
        );

        assert_eq!(sink.calls.borrow().len(), 2);
        assert_eq!(report.copied, vec![PathBuf::from("out/Adv/Run_0_Selected_Epoch_5.yaml")]);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].error, MISSING_ARTIFACT);
        assert_eq!(
            report.failures[0].destination,
            PathBuf::from("out/Adv/Run_1_Selected_Epoch_5.yaml")
        );
        assert_eq!(
            report.failures[1].destination,
            PathBuf::from("out/Adv/Run_2_Selected_Epoch_5.yaml")
        );
        assert!(!report.is_complete());
    }
}
