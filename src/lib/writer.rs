//! SAM text output.

use std::io::Write;

use crate::annotate::OutputRecord;
use crate::errors::Result;

/// Output sink for reconciled records.
pub trait OutputSink {
    /// Writes all records of one fragment, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails.
    fn write_records(&mut self, records: &[OutputRecord]) -> Result<()>;
}

/// Writes header lines and records as tab-separated SAM text.
pub struct SamWriter<W: Write> {
    inner: W,
    records_written: u64,
}

impl<W: Write> SamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records_written: 0 }
    }

    /// Writes header lines; each must start with `@`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying output fails.
    pub fn write_header(&mut self, lines: &[String]) -> Result<()> {
        for line in lines {
            writeln!(self.inner, "{line}")?;
        }
        Ok(())
    }

    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> OutputSink for SamWriter<W> {
    fn write_records(&mut self, records: &[OutputRecord]) -> Result<()> {
        for record in records {
            writeln!(self.inner, "{record}")?;
        }
        self.records_written += records.len() as u64;
        Ok(())
    }
}

impl OutputSink for Vec<OutputRecord> {
    fn write_records(&mut self, records: &[OutputRecord]) -> Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}
