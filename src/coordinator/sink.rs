//! Output sinks for per-area results.
//!
//! The coordinator performs no I/O of its own; it hands each finished
//! area to the two sinks below. The CSV implementations write the
//! same row shapes the companion tooling consumes: an assignments
//! stream with one row per selected individual, and an aggregates
//! stream with one row per area.

use std::io::{self, Write};

/// Receives one row per selected individual.
pub trait AssignmentSink {
    /// Writes the stream header.
    fn write_header(&mut self) -> io::Result<()>;

    /// Writes one selected individual. The same record identifier may
    /// repeat within an area (selection is with replacement).
    fn write_row(&mut self, area_id: &str, record_id: &str) -> io::Result<()>;

    /// Flushes any buffered rows.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Receives one row of achieved totals per area.
pub trait AggregateSink {
    /// Writes the stream header; the trailing columns are the
    /// attribute names.
    fn write_header(&mut self, attributes: &[String]) -> io::Result<()>;

    /// Writes one area's achieved per-attribute totals.
    fn write_row(&mut self, area_id: &str, totals: &[f64]) -> io::Result<()>;

    /// Flushes any buffered rows.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Comma-separated assignments writer over any [`Write`].
#[derive(Debug)]
pub struct CsvAssignmentSink<W: Write> {
    out: W,
}

impl<W: Write> CsvAssignmentSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AssignmentSink for CsvAssignmentSink<W> {
    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.out, "area_id,microdata_id")
    }

    fn write_row(&mut self, area_id: &str, record_id: &str) -> io::Result<()> {
        writeln!(self.out, "{area_id},{record_id}")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Comma-separated aggregates writer over any [`Write`].
#[derive(Debug)]
pub struct CsvAggregateSink<W: Write> {
    out: W,
}

impl<W: Write> CsvAggregateSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> AggregateSink for CsvAggregateSink<W> {
    fn write_header(&mut self, attributes: &[String]) -> io::Result<()> {
        write!(self.out, "geography_code")?;
        for name in attributes {
            write!(self.out, ",{name}")?;
        }
        writeln!(self.out)
    }

    fn write_row(&mut self, area_id: &str, totals: &[f64]) -> io::Result<()> {
        write!(self.out, "{area_id}")?;
        for value in totals {
            write!(self.out, ",{value}")?;
        }
        writeln!(self.out)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// In-memory assignments collector for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryAssignmentSink {
    /// Collected `(area_id, record_id)` rows, in write order.
    pub rows: Vec<(String, String)>,
}

impl MemoryAssignmentSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentSink for MemoryAssignmentSink {
    fn write_header(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_row(&mut self, area_id: &str, record_id: &str) -> io::Result<()> {
        self.rows.push((area_id.to_string(), record_id.to_string()));
        Ok(())
    }
}

/// In-memory aggregates collector for tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryAggregateSink {
    /// The attribute names passed to `write_header`.
    pub attributes: Vec<String>,
    /// Collected `(area_id, totals)` rows, in write order.
    pub rows: Vec<(String, Vec<f64>)>,
}

impl MemoryAggregateSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AggregateSink for MemoryAggregateSink {
    fn write_header(&mut self, attributes: &[String]) -> io::Result<()> {
        self.attributes = attributes.to_vec();
        Ok(())
    }

    fn write_row(&mut self, area_id: &str, totals: &[f64]) -> io::Result<()> {
        self.rows.push((area_id.to_string(), totals.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_assignments_have_header_and_rows() {
        let mut sink = CsvAssignmentSink::new(Vec::new());
        sink.write_header().unwrap();
        sink.write_row("E02001", "p-17").unwrap();
        sink.write_row("E02001", "p-17").unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "area_id,microdata_id\nE02001,p-17\nE02001,p-17\n");
    }

    #[test]
    fn csv_aggregates_carry_attribute_names_in_header() {
        let mut sink = CsvAggregateSink::new(Vec::new());
        sink.write_header(&["age_0_15".into(), "age_16_plus".into()])
            .unwrap();
        sink.write_row("E02001", &[12.0, 30.5]).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "geography_code,age_0_15,age_16_plus\nE02001,12,30.5\n"
        );
    }

    #[test]
    fn memory_sinks_collect_rows_in_order() {
        let mut assignments = MemoryAssignmentSink::new();
        assignments.write_header().unwrap();
        assignments.write_row("A", "r1").unwrap();
        assignments.write_row("A", "r2").unwrap();
        assert_eq!(assignments.rows.len(), 2);
        assert_eq!(assignments.rows[0], ("A".into(), "r1".into()));

        let mut aggregates = MemoryAggregateSink::new();
        aggregates.write_header(&["x".into()]).unwrap();
        aggregates.write_row("A", &[1.5]).unwrap();
        assert_eq!(aggregates.attributes, vec!["x".to_string()]);
        assert_eq!(aggregates.rows[0].1, vec![1.5]);
    }
}
