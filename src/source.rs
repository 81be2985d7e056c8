//! Line-delimited address sources and blacklist sinks.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::error::Result;
use crate::fs_abstraction::{real_fs, FileSystem};

/// Produces the raw address entries to analyse.
///
/// Entries are returned as read; validation and deduplication happen once,
/// in the aggregator.
#[cfg_attr(test, automock)]
pub trait AddressSource {
    fn load(&self) -> Result<Vec<String>>;
}

/// Persists the rendered blacklist, one entry per line.
#[cfg_attr(test, automock)]
pub trait BlacklistSink {
    fn write(&self, lines: &[String]) -> Result<()>;
}

/// Parse an address list (one address per line).
///
/// Blank lines and `#` comments are skipped and surrounding whitespace is
/// trimmed. Entries are not validated here.
pub fn parse_address_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render lines as newline-terminated text.
pub fn render_lines(lines: &[String]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Address list read from a file.
pub struct FileSource<'a, F: FileSystem + ?Sized = crate::fs_abstraction::RealFileSystem> {
    path: PathBuf,
    fs: &'a F,
}

impl FileSource<'static> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_fs(path, real_fs())
    }
}

impl<'a, F: FileSystem + ?Sized> FileSource<'a, F> {
    pub fn with_fs<P: AsRef<Path>>(path: P, fs: &'a F) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: FileSystem + ?Sized> AddressSource for FileSource<'_, F> {
    fn load(&self) -> Result<Vec<String>> {
        let content = self.fs.read_to_string(&self.path)?;
        let entries = parse_address_list(&content);
        debug!("Read {} entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }
}

/// Blacklist written atomically to a file.
pub struct FileSink<'a, F: FileSystem + ?Sized = crate::fs_abstraction::RealFileSystem> {
    path: PathBuf,
    fs: &'a F,
}

impl FileSink<'static> {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_fs(path, real_fs())
    }
}

impl<'a, F: FileSystem + ?Sized> FileSink<'a, F> {
    pub fn with_fs<P: AsRef<Path>>(path: P, fs: &'a F) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<F: FileSystem + ?Sized> BlacklistSink for FileSink<'_, F> {
    fn write(&self, lines: &[String]) -> Result<()> {
        self.fs
            .write_atomic(&self.path, render_lines(lines).as_bytes())?;
        debug!("Wrote {} lines to {:?}", lines.len(), self.path);
        Ok(())
    }
}

/// Blacklist printed on standard output.
#[derive(Default, Clone, Copy)]
pub struct StdoutSink;

impl BlacklistSink for StdoutSink {
    fn write(&self, lines: &[String]) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(render_lines(lines).as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}
