// file.rs - Output files that appear only once fully written

use std::fs::create_dir_all;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{MsaError, Result};

/// Buffered writer into a temporary file in the destination directory.
///
/// The destination path is only replaced by [`commit`](Self::commit). A writer
/// that is dropped, or a process killed mid-write, never leaves a truncated
/// file at the destination.
pub struct OutputFile {
    writer: BufWriter<NamedTempFile>,
    path: PathBuf,
}

impl OutputFile {
    /// Create the parent directory if needed and open a temporary file beside `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        create_dir_all(&dir)?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(".msadist-").suffix(".part");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // same mode File::create would use, before umask
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }
        let temp = builder.tempfile_in(&dir)?;

        Ok(Self {
            writer: BufWriter::new(temp),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and move the finished file to its destination
    pub fn commit(self) -> Result<()> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| MsaError::Io(e.into_error()))?;
        temp.persist(&self.path).map_err(|e| MsaError::Io(e.error))?;
        Ok(())
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
