use crate::collector::ParameterPoint;
use crate::counter::{CounterValue, CounterVector};
use crate::error::{Result, SweepError};
use crate::event::EVENTS;
use crate::sweep::mode_label;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Provenance columns preceding the counters.
pub const PROVENANCE: [&str; 4] = ["M", "N", "K", "MODE"];

/// On-disk layout of a saved table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
        }
    }
}

/// Result of one (coordinate, mode) run.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub m: u64,
    pub n: u64,
    pub k: u64,
    pub mode: usize,
    pub counters: CounterVector,
}

impl Row {
    pub fn new(point: &ParameterPoint, counters: CounterVector) -> Self {
        Self {
            m: point.m,
            n: point.n,
            k: point.k,
            mode: point.mode,
            counters,
        }
    }

    pub fn label(&self) -> &'static str {
        mode_label(self.mode).unwrap_or("unknown")
    }

    fn record(&self) -> Vec<String> {
        let mut record = vec![
            self.m.to_string(),
            self.n.to_string(),
            self.k.to_string(),
            self.label().to_string(),
        ];
        record.extend(self.counters.values().iter().map(|v| match v {
            CounterValue::Present(v) => v.to_string(),
            CounterValue::Missing => String::new(),
        }));
        record
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PROVENANCE.len() + EVENTS.len()))?;
        map.serialize_entry("M", &self.m)?;
        map.serialize_entry("N", &self.n)?;
        map.serialize_entry("K", &self.k)?;
        map.serialize_entry("MODE", self.label())?;
        for (event, value) in self.counters.iter() {
            map.serialize_entry(event.column, &value)?;
        }
        map.end()
    }
}

/// Rows of a sweep, in the order they were collected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<Row>,
}

impl ResultTable {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            rows: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn header() -> Vec<&'static str> {
        PROVENANCE
            .iter()
            .copied()
            .chain(EVENTS.iter().map(|e| e.column))
            .collect()
    }

    pub fn write_csv<W: Write>(&self, w: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(w);
        wtr.write_record(Self::header())?;
        for row in &self.rows {
            wtr.write_record(row.record())?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, w: W) -> Result<()> {
        serde_json::to_writer_pretty(w, &self.rows)?;
        Ok(())
    }

    /// Write the table to `path`, replacing any previous file.
    ///
    /// Goes through a sibling temporary file, so `path` never holds a
    /// partial table.
    pub fn save(&self, path: &Path, format: Format) -> Result<()> {
        let io_err = |source: io::Error| SweepError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let tmp = path.with_extension(format!("{}.tmp", format.extension()));
        let written = File::create(&tmp).map_err(io_err).and_then(|file| {
            let mut w = BufWriter::new(file);
            match format {
                Format::Csv => self.write_csv(&mut w)?,
                Format::Json => self.write_json(&mut w)?,
            }
            w.flush().map_err(io_err)
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path).map_err(io_err)
    }
}
