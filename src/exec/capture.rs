// src/exec/capture.rs

//! Temporary files backing a child's output streams.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;

/// Output files owned by a single runner invocation.
///
/// One file when output is combined, two when stdout and stderr are kept
/// apart. The files are removed by [`CaptureFiles::close`] or, on any other
/// exit path, when the value is dropped.
#[derive(Debug)]
pub struct CaptureFiles {
    stdout: NamedTempFile,
    stderr: Option<NamedTempFile>,
}

/// Bytes read back from the capture files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub stdout: Vec<u8>,
    /// `None` in combined mode.
    pub stderr: Option<Vec<u8>>,
}

impl CaptureFiles {
    pub fn create(combined: bool) -> io::Result<Self> {
        let stdout = new_capture_file("out")?;
        let stderr = if combined {
            None
        } else {
            Some(new_capture_file("err")?)
        };
        Ok(Self { stdout, stderr })
    }

    /// Handles for the child's stdout and stderr.
    ///
    /// In combined mode both handles refer to the same file description, so
    /// the two streams interleave in write order.
    pub fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        let out = Stdio::from(self.stdout.as_file().try_clone()?);
        let err = match &self.stderr {
            Some(file) => Stdio::from(file.as_file().try_clone()?),
            None => Stdio::from(self.stdout.as_file().try_clone()?),
        };
        Ok((out, err))
    }

    /// Read everything written so far, from offset zero.
    ///
    /// Uses freshly opened handles so the child's file position is left
    /// untouched.
    pub async fn read_back(&self) -> io::Result<Captured> {
        let stdout = read_from_start(&self.stdout).await?;
        let stderr = match &self.stderr {
            Some(file) => Some(read_from_start(file).await?),
            None => None,
        };
        Ok(Captured { stdout, stderr })
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.stdout.path().to_path_buf()];
        if let Some(file) = &self.stderr {
            paths.push(file.path().to_path_buf());
        }
        paths
    }

    /// Close and delete the files, reporting deletion errors.
    pub fn close(self) -> io::Result<()> {
        let stdout_res = self.stdout.close();
        let stderr_res = match self.stderr {
            Some(file) => file.close(),
            None => Ok(()),
        };
        stdout_res.and(stderr_res)
    }
}

fn new_capture_file(kind: &str) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("systest-")
        .suffix(&format!(".{kind}"))
        .tempfile()
}

async fn read_from_start(file: &NamedTempFile) -> io::Result<Vec<u8>> {
    let mut reader = tokio::fs::File::from_std(file.reopen()?);
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}
