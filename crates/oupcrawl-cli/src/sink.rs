use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oupcrawl_core::NormalizedRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Destination of harvested records.
pub trait RecordSink: Send {
    fn emit(&mut self, record: &NormalizedRecord) -> Result<()>;

    /// Flush and close. Nothing may be emitted afterwards.
    fn finish(&mut self) -> Result<()>;
}

/// Writes records as one JSON array, each record pretty-printed with a
/// four-space indent and records separated by `,\n`.
pub struct JsonArraySink<W: Write + Send> {
    writer: W,
    written: usize,
}

impl<W: Write + Send> JsonArraySink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonArraySink<BufWriter<File>> {
    /// Create `<dir>/OUP_<timestamp>.json`.
    pub fn create_in(dir: &Path) -> Result<(Self, PathBuf)> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        let name = format!("OUP_{}.json", chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
        let path = dir.join(name);
        let file = File::create(&path)
            .with_context(|| format!("creating output file {}", path.display()))?;
        Ok((Self::new(BufWriter::new(file)), path))
    }
}

impl JsonArraySink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> RecordSink for JsonArraySink<W> {
    fn emit(&mut self, record: &NormalizedRecord) -> Result<()> {
        self.writer
            .write_all(if self.written == 0 { b"[\n" } else { b",\n" })?;
        let mut ser = Serializer::with_formatter(&mut self.writer, PrettyFormatter::with_indent(b"    "));
        record.serialize(&mut ser).context("serializing record")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .write_all(if self.written == 0 { b"[]\n" } else { b"\n]\n" })?;
        self.writer.flush()?;
        Ok(())
    }
}
