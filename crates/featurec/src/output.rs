//! All-or-nothing writing of generated artifacts.

use crate::error::{GenerateErrorExt, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const PARTIAL_SUFFIX: &str = ".partial";

/// One artifact to write.
#[derive(Debug, Clone, Copy)]
pub struct Output<'a> {
    pub path: &'a Path,
    pub contents: &'a str,
}

/// Writes every output, or none of them.
///
/// Each artifact is first written next to its destination as `<name>.partial`
/// and only renamed into place once every artifact is staged. On failure the
/// staged files and any artifact already renamed by this call are removed.
///
/// # Errors
/// Returns the first I/O error, with the affected path as context.
pub fn write_outputs(outputs: &[Output<'_>]) -> Result<()> {
    let mut staged = StagedOutputs::new();
    for output in outputs {
        staged.stage(*output)?;
    }
    staged.commit()
}

/// Artifacts written to `<name>.partial` siblings, waiting to be renamed into place.
///
/// Dropping the set without [`StagedOutputs::commit`] removes every partial file.
#[derive(Debug, Default)]
pub struct StagedOutputs<'a> {
    staged: Vec<(&'a Path, PathBuf)>,
}

impl<'a> StagedOutputs<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `output` to its partial file, creating parent directories.
    ///
    /// # Errors
    /// Returns the I/O error; nothing of this output is left behind.
    pub fn stage(&mut self, output: Output<'a>) -> Result<()> {
        let partial = partial_path(output.path);
        if let Err(e) = write_partial(&output, &partial) {
            discard([partial.as_path()]);
            return Err(e);
        }
        self.staged.push((output.path, partial));
        Ok(())
    }

    /// Renames every partial file onto its destination, in staging order.
    ///
    /// # Errors
    /// Returns the first rename error after removing the remaining partial
    /// files and every destination this call already replaced.
    pub fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        for (done, (path, partial)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(partial, path)
                .context(format!("Failed to move {} into place", path.display()))
            {
                let committed = staged[..done].iter().map(|(p, _)| *p);
                discard(committed.chain(staged[done..].iter().map(|(_, q)| q.as_path())));
                return Err(e);
            }
            tracing::debug!(path = %path.display(), "Wrote artifact");
        }
        Ok(())
    }
}

impl Drop for StagedOutputs<'_> {
    fn drop(&mut self) {
        discard(self.staged.iter().map(|(_, partial)| partial.as_path()));
    }
}

fn write_partial(output: &Output<'_>, partial: &Path) -> Result<()> {
    ensure_parent_dir(output.path)?;
    fs::write(partial, output.contents)
        .context(format!("Failed to write {}", partial.display()))?;
    tracing::trace!(path = %partial.display(), bytes = output.contents.len(), "Staged artifact");
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

fn discard<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_all_outputs_and_creates_parents() -> Result<()> {
        let dir = tempdir()?;
        let header = dir.path().join("include/featureconfig.hpp");
        let source = dir.path().join("featureconfig.cpp");

        write_outputs(&[
            Output { path: &header, contents: "header" },
            Output { path: &source, contents: "source" },
        ])?;

        assert_eq!(fs::read_to_string(&header)?, "header");
        assert_eq!(fs::read_to_string(&source)?, "source");
        assert!(!partial_path(&header).exists());
        Ok(())
    }

    #[test]
    fn test_failure_leaves_nothing_behind() -> Result<()> {
        let dir = tempdir()?;
        let header = dir.path().join("featureconfig.hpp");
        // A regular file where a directory is needed makes staging the second output fail.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "")?;
        let source = blocker.join("featureconfig.cpp");

        let result = write_outputs(&[
            Output { path: &header, contents: "header" },
            Output { path: &source, contents: "source" },
        ]);

        assert!(result.is_err());
        assert!(!header.exists());
        assert!(!partial_path(&header).exists());
        Ok(())
    }

    #[test]
    fn test_uncommitted_outputs_are_discarded() -> Result<()> {
        let dir = tempdir()?;
        let header = dir.path().join("featureconfig.hpp");
        fs::write(&header, "previous run")?;

        {
            let mut staged = StagedOutputs::new();
            staged.stage(Output { path: &header, contents: "header" })?;
            assert!(partial_path(&header).exists());
        }

        assert!(!partial_path(&header).exists());
        assert_eq!(fs::read_to_string(&header)?, "previous run");
        Ok(())
    }

    #[test]
    fn test_commit_replaces_destinations_in_order() -> Result<()> {
        let dir = tempdir()?;
        let header = dir.path().join("featureconfig.hpp");
        let source = dir.path().join("featureconfig.cpp");
        fs::write(&header, "old")?;

        let mut staged = StagedOutputs::new();
        staged.stage(Output { path: &header, contents: "new header" })?;
        staged.stage(Output { path: &source, contents: "new source" })?;
        assert_eq!(fs::read_to_string(&header)?, "old");
        staged.commit()?;

        assert_eq!(fs::read_to_string(&header)?, "new header");
        assert_eq!(fs::read_to_string(&source)?, "new source");
        Ok(())
    }

    #[test]
    fn test_partial_path_keeps_directory() {
        assert_eq!(
            partial_path(Path::new("out/featureconfig.hpp")),
            PathBuf::from("out/featureconfig.hpp.partial")
        );
    }
}
