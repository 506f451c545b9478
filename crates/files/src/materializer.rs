//! Output-directory-scoped placement of scans and their metadata.
//!
//! [`Materializer`] is bound to one output directory for the lifetime of a run. It never
//! decides names: the caller hands it a fully resolved [`ScanPaths`] and a source file.

use crate::constants::{
    ACQ_TIME_FORMAT, EMPTY_JSON_OBJECT, PARTICIPANTS_HEADER, README_CONTENT, SCANS_HEADER,
};
use crate::dataset::DatasetDescription;
use crate::{
    io_context, FilesError, DATASET_DESCRIPTION_FILENAME, PARTICIPANTS_JSON_FILENAME,
    PARTICIPANTS_TSV_FILENAME, README_FILENAME, UNKNOWN_VALUE,
};
use bidsify_types::Label;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// How a source image reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Byte-for-byte copy of the source.
    #[default]
    Copy,
    /// Symlink pointing at the canonical source path.
    Symlink,
}

/// Every path touched when one scan is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPaths {
    /// Destination of the image itself.
    pub image: PathBuf,
    /// JSON sidecar next to the image.
    pub sidecar: PathBuf,
    /// `_scans.json` for the subject/session.
    pub scans_json: PathBuf,
    /// `_scans.tsv` for the subject/session.
    pub scans_tsv: PathBuf,
    /// Image path relative to the session directory, as listed in `_scans.tsv`.
    pub scans_entry: String,
}

/// Acquisition time recorded for every scan, since headers are never read.
pub fn placeholder_acq_time() -> String {
    DateTime::<Utc>::UNIX_EPOCH
        .format(ACQ_TIME_FORMAT)
        .to_string()
}

/// Writes scans and dataset artifacts below one output directory.
#[derive(Debug)]
pub struct Materializer {
    output_dir: PathBuf,
    placement: Placement,
}

impl Materializer {
    /// Creates a `Materializer` for `output_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::Io` if the directory cannot be created, or if the path exists
    /// but is not a directory.
    pub fn new(output_dir: &Path, placement: Placement) -> Result<Self, FilesError> {
        create_dir_all(output_dir)?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            placement,
        })
    }

    /// Returns the output directory this materializer writes into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Places `source` at `paths.image` and writes its metadata.
    ///
    /// Steps, in order: create parent directories, place the image, write the image
    /// sidecar, (re)write the session's `_scans.json`, append a row to the session's
    /// `_scans.tsv`. A failure stops the remaining steps for this scan only.
    ///
    /// If any step after placement fails, the placed image (and the sidecar, if this call
    /// wrote it) is removed before the error is returned, leaving the run index vacant.
    ///
    /// # Errors
    ///
    /// - `FilesError::DestinationExists` if something already occupies `paths.image`
    /// - `FilesError::Io` / `FilesError::Tsv` for any filesystem failure
    pub fn materialize(&self, source: &Path, paths: &ScanPaths) -> Result<(), FilesError> {
        for path in [&paths.image, &paths.scans_tsv] {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
        }

        self.place(source, &paths.image)?;

        if let Err(e) = write_json_stub(&paths.sidecar) {
            discard(&paths.image);
            return Err(e);
        }
        if let Err(e) = write_json_stub(&paths.scans_json)
            .and_then(|()| append_scan_row(&paths.scans_tsv, &paths.scans_entry))
        {
            discard(&paths.image);
            discard(&paths.sidecar);
            return Err(e);
        }

        tracing::debug!(
            "placed {} -> {} ({:?})",
            source.display(),
            paths.image.display(),
            self.placement
        );
        Ok(())
    }

    /// Writes `dataset_description.json`, `participants.json`, `participants.tsv` and
    /// `README` at the output root, overwriting earlier versions.
    ///
    /// `subjects` is written in the given order, one row each.
    pub fn write_dataset_artifacts(&self, subjects: &[Label]) -> Result<(), FilesError> {
        let description_path = self.output_dir.join(DATASET_DESCRIPTION_FILENAME);
        let description = serde_json::to_string_pretty(&DatasetDescription::default())?;
        write_file(&description_path, description.as_bytes())?;

        write_json_stub(&self.output_dir.join(PARTICIPANTS_JSON_FILENAME))?;
        write_file(
            &self.output_dir.join(README_FILENAME),
            README_CONTENT.as_bytes(),
        )?;

        let participants_path = self.output_dir.join(PARTICIPANTS_TSV_FILENAME);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(&participants_path)?;
        writer.write_record(PARTICIPANTS_HEADER)?;
        for subject in subjects {
            let participant_id = format!("sub-{}", subject);
            writer.write_record([participant_id.as_str(), UNKNOWN_VALUE, UNKNOWN_VALUE])?;
        }
        writer
            .flush()
            .map_err(|e| io_context("write", &participants_path, e))?;

        tracing::info!(
            "wrote dataset artifacts for {} participant(s) to {}",
            subjects.len(),
            self.output_dir.display()
        );
        Ok(())
    }

    fn place(&self, source: &Path, target: &Path) -> Result<(), FilesError> {
        if fs::symlink_metadata(target).is_ok() {
            return Err(FilesError::DestinationExists(target.to_path_buf()));
        }

        match self.placement {
            Placement::Copy => {
                if let Err(e) = fs::copy(source, target) {
                    // A failed copy may leave a truncated file behind.
                    discard(target);
                    return Err(io_context("copy to", target, e));
                }
            }
            Placement::Symlink => {
                let source = source
                    .canonicalize()
                    .map_err(|e| io_context("resolve", source, e))?;
                symlink_file(&source, target).map_err(|e| io_context("link", target, e))?;
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
fn symlink_file(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn symlink_file(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

/// Removes a file written earlier in a failed materialization.
fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("failed to remove partial output {}: {}", path.display(), e),
    }
}

fn create_dir_all(path: &Path) -> Result<(), FilesError> {
    fs::create_dir_all(path).map_err(|e| io_context("create directory", path, e))
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), FilesError> {
    fs::write(path, contents).map_err(|e| io_context("write", path, e))
}

fn write_json_stub(path: &Path) -> Result<(), FilesError> {
    write_file(path, EMPTY_JSON_OBJECT.as_bytes())
}

/// Appends one `filename\tacq_time` row, writing the header only when the table is new.
fn append_scan_row(scans_tsv: &Path, entry: &str) -> Result<(), FilesError> {
    let is_new = fs::metadata(scans_tsv).map(|m| m.len() == 0).unwrap_or(true);

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(scans_tsv)
        .map_err(|e| io_context("open", scans_tsv, e))?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(file);
    if is_new {
        writer.write_record(SCANS_HEADER)?;
    }
    writer.write_record([entry, placeholder_acq_time().as_str()])?;
    writer.flush().map_err(|e| io_context("write", scans_tsv, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scan_paths(root: &Path, run: u32) -> ScanPaths {
        let session_dir = root.join("sub-01").join("ses-pre");
        let stem = format!("sub-01_ses-pre_run-{:03}_T1w", run);
        ScanPaths {
            image: session_dir.join("anat").join(format!("{}.nii.gz", stem)),
            sidecar: session_dir.join("anat").join(format!("{}.json", stem)),
            scans_json: session_dir.join("sub-01_ses-pre_scans.json"),
            scans_tsv: session_dir.join("sub-01_ses-pre_scans.tsv"),
            scans_entry: format!("anat/{}.nii.gz", stem),
        }
    }

    fn write_source(temp: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = temp.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_placeholder_acq_time() {
        assert_eq!(placeholder_acq_time(), "1970-01-01T00:00:00");
    }

    #[test]
    fn test_new_creates_output_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("output");

        let materializer = Materializer::new(&out, Placement::Copy).unwrap();

        assert!(out.is_dir());
        assert_eq!(materializer.output_dir(), out.as_path());
        assert_eq!(materializer.placement(), Placement::Copy);
    }

    #[test]
    fn test_new_rejects_file_as_output_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("file.txt");
        fs::write(&out, "not a directory").unwrap();

        let result = Materializer::new(&out, Placement::Copy);
        assert!(matches!(result, Err(FilesError::Io(_))));
    }

    #[test]
    fn test_materialize_copy_writes_everything() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp, "T1_raw.nii.gz", b"voxels");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let paths = scan_paths(&out, 1);

        materializer.materialize(&source, &paths).unwrap();

        assert_eq!(fs::read(&paths.image).unwrap(), b"voxels");
        assert!(!fs::symlink_metadata(&paths.image)
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_to_string(&paths.sidecar).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&paths.scans_json).unwrap(), "{}");
        assert_eq!(
            fs::read_to_string(&paths.scans_tsv).unwrap(),
            "filename\tacq_time\nanat/sub-01_ses-pre_run-001_T1w.nii.gz\t1970-01-01T00:00:00\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_materialize_symlink_points_at_canonical_source() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp, "T1_raw.nii.gz", b"voxels");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Symlink).unwrap();
        let paths = scan_paths(&out, 1);

        materializer.materialize(&source, &paths).unwrap();

        let meta = fs::symlink_metadata(&paths.image).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(
            fs::read_link(&paths.image).unwrap(),
            source.canonicalize().unwrap()
        );
        assert_eq!(fs::read(&paths.image).unwrap(), b"voxels");
    }

    #[test]
    fn test_scans_header_written_once() {
        let temp = TempDir::new().unwrap();
        let first = write_source(&temp, "a.nii.gz", b"a");
        let second = write_source(&temp, "b.nii.gz", b"b");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();

        materializer.materialize(&first, &scan_paths(&out, 1)).unwrap();
        materializer.materialize(&second, &scan_paths(&out, 2)).unwrap();

        let table = fs::read_to_string(scan_paths(&out, 1).scans_tsv).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "filename\tacq_time");
        assert!(lines[1].starts_with("anat/sub-01_ses-pre_run-001_T1w.nii.gz\t"));
        assert!(lines[2].starts_with("anat/sub-01_ses-pre_run-002_T1w.nii.gz\t"));
    }

    #[test]
    fn test_materialize_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp, "a.nii.gz", b"new");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let paths = scan_paths(&out, 1);
        fs::create_dir_all(paths.image.parent().unwrap()).unwrap();
        fs::write(&paths.image, b"old").unwrap();

        let result = materializer.materialize(&source, &paths);

        assert!(matches!(result, Err(FilesError::DestinationExists(_))));
        assert_eq!(fs::read(&paths.image).unwrap(), b"old");
        assert!(!paths.scans_tsv.exists());
    }

    #[test]
    fn test_materialize_missing_source() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let paths = scan_paths(&out, 1);

        let result = materializer.materialize(&temp.path().join("missing.nii.gz"), &paths);

        assert!(matches!(result, Err(FilesError::Io(_))));
        assert!(!paths.sidecar.exists());
    }

    #[test]
    fn test_materialize_failure_after_placement_removes_image() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp, "T1_raw.nii.gz", b"voxels");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let paths = scan_paths(&out, 1);
        // A directory where the sidecar should go makes the sidecar write fail.
        fs::create_dir_all(&paths.sidecar).unwrap();

        let result = materializer.materialize(&source, &paths);

        assert!(matches!(result, Err(FilesError::Io(_))));
        assert!(fs::symlink_metadata(&paths.image).is_err());
        assert!(paths.sidecar.is_dir());
        assert!(!paths.scans_tsv.exists());

        // Once the obstruction is gone the same run index can be used.
        fs::remove_dir(&paths.sidecar).unwrap();
        materializer.materialize(&source, &paths).unwrap();
        assert_eq!(fs::read(&paths.image).unwrap(), b"voxels");
        assert_eq!(fs::read_to_string(&paths.sidecar).unwrap(), "{}");
        assert_eq!(fs::read_to_string(&paths.scans_tsv).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_materialize_failure_after_sidecar_removes_both() {
        let temp = TempDir::new().unwrap();
        let source = write_source(&temp, "T1_raw.nii.gz", b"voxels");
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let paths = scan_paths(&out, 1);
        fs::create_dir_all(&paths.scans_tsv).unwrap();

        let result = materializer.materialize(&source, &paths);

        assert!(result.is_err());
        assert!(!paths.image.exists());
        assert!(!paths.sidecar.exists());
    }

    #[test]
    fn test_write_dataset_artifacts() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();
        let subjects = vec![Label::new("02").unwrap(), Label::new("01").unwrap()];

        materializer.write_dataset_artifacts(&subjects).unwrap();

        let description: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("dataset_description.json")).unwrap())
                .unwrap();
        assert_eq!(description["BIDSVersion"], "1.0.1");
        assert_eq!(
            fs::read_to_string(out.join("participants.json")).unwrap(),
            "{}"
        );
        assert_eq!(fs::read_to_string(out.join("README")).unwrap(), "TODO");
        assert_eq!(
            fs::read_to_string(out.join("participants.tsv")).unwrap(),
            "participant_id\tage\tsex\nsub-02\tn/a\tn/a\nsub-01\tn/a\tn/a\n"
        );
    }

    #[test]
    fn test_write_dataset_artifacts_overwrites() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("out");
        let materializer = Materializer::new(&out, Placement::Copy).unwrap();

        materializer
            .write_dataset_artifacts(&[Label::new("01").unwrap()])
            .unwrap();
        materializer
            .write_dataset_artifacts(&[Label::new("01").unwrap()])
            .unwrap();

        let table = fs::read_to_string(out.join("participants.tsv")).unwrap();
        assert_eq!(table.lines().count(), 2);
    }
}
