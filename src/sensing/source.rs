use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::detection::LandmarkSample;

/// Capture + landmark detection, seen from the monitor.
///
/// `Ok(Some)` is one sampled frame (possibly with nothing detected),
/// `Ok(None)` ends the stream, `Err` is a failed capture or detection.
pub trait LandmarkSource: Send {
    fn next_sample(&mut self) -> Result<Option<LandmarkSample>>;
}

/// Replays newline-delimited JSON `LandmarkSample`s. Blank lines are ticks
/// where nothing was detected.
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open replay file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> LandmarkSource for JsonLinesSource<R> {
    fn next_sample(&mut self) -> Result<Option<LandmarkSample>> {
        self.buf.clear();
        let read = self
            .reader
            .read_line(&mut self.buf)
            .context("failed to read replay line")?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        let line = self.buf.trim();
        if line.is_empty() {
            return Ok(Some(LandmarkSample::empty()));
        }
        serde_json::from_str(line)
            .map(Some)
            .with_context(|| format!("invalid landmark sample on line {}", self.line_no))
    }
}
