use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An output file under construction. Content goes to a hidden sibling
/// (`.<name>.partial`) and only replaces the real path on [`StagedFile::commit`].
/// An uncommitted stage deletes its partial file when dropped.
#[derive(Debug)]
pub(crate) struct StagedFile {
    final_path: PathBuf,
    partial_path: PathBuf,
    committed: bool,
}

impl StagedFile {
    pub(crate) fn new(final_path: &Path) -> io::Result<Self> {
        let parent = final_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)?;
        }
        let file_name = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let partial_name = format!(".{file_name}.partial");
        let partial_path = match parent {
            Some(parent) => parent.join(partial_name),
            None => PathBuf::from(partial_name),
        };
        Ok(Self {
            final_path: final_path.to_path_buf(),
            partial_path,
            committed: false,
        })
    }

    pub(crate) fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    pub(crate) fn commit(mut self) -> io::Result<()> {
        fs::rename(&self.partial_path, &self.final_path)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.partial_path);
        }
    }
}

/// Whole-buffer output: stage, write, commit.
pub(crate) fn write_output(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let staged = StagedFile::new(path)?;
    fs::write(staged.partial_path(), bytes)?;
    staged.commit()
}
