//! Output sink owned by a harvesting run.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::HarvestError;

/// Where formatted records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    /// Process standard output, never closed by the harvester
    Stdout,
    /// File created by the harvester
    File(PathBuf),
    /// Caller-supplied writer
    Writer,
}

/// Destination for formatted records.
///
/// Each record is written and flushed as a single unit, so the sink can be
/// closed at any point between two writes without leaving a partial record.
pub struct OutputSink {
    writer: Option<Box<dyn Write + Send>>,
    kind: SinkKind,
}

impl OutputSink {
    pub fn stdout() -> Self {
        Self {
            writer: Some(Box::new(io::stdout())),
            kind: SinkKind::Stdout,
        }
    }

    /// Creates (or truncates) the file at `path`.
    pub fn create(path: &Path) -> Result<Self, HarvestError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: Some(Box::new(BufWriter::new(file))),
            kind: SinkKind::File(path.to_path_buf()),
        })
    }

    /// Opens the sink named on the command line; `-` is standard output.
    pub fn open(target: &str) -> Result<Self, HarvestError> {
        if target == "-" {
            Ok(Self::stdout())
        } else {
            Self::create(Path::new(target))
        }
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Some(Box::new(writer)),
            kind: SinkKind::Writer,
        }
    }

    pub fn kind(&self) -> &SinkKind {
        &self.kind
    }

    pub fn is_stdout(&self) -> bool {
        self.kind == SinkKind::Stdout
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Writes one rendered record and flushes it.
    pub fn write_record(&mut self, rendered: &str) -> Result<(), HarvestError> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            HarvestError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "output sink already closed",
            ))
        })?;
        writer.write_all(rendered.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Flushes and releases the sink.
    ///
    /// Standard output is flushed but stays open. Calling this more than once
    /// is a no-op.
    pub fn close(&mut self) -> Result<(), HarvestError> {
        if self.is_stdout() {
            if let Some(writer) = self.writer.as_mut() {
                writer.flush()?;
            }
            return Ok(());
        }

        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(sink = ?self.kind, "Output sink closed");
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    /// Writer whose contents stay readable after the sink takes ownership.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
