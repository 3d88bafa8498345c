//! Reading publication
//!
//! Every reading the session produces is handed to a [`ReadingPublisher`],
//! which writes it as one JSON object per line or as `Name = value` text.

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use uvr_can_codec::Reading;

/// One published reading as written to the JSON-lines output
#[derive(Debug, Serialize)]
pub struct PublishedReading<'a> {
    /// RFC 3339 local time of publication
    pub timestamp: String,
    pub name: String,
    #[serde(flatten)]
    pub reading: &'a Reading,
}

enum Sink {
    /// `Name = value` lines through the log
    Log,
    /// `Name = value` lines on stdout
    Stdout,
    /// JSON lines into a file
    Json(BufWriter<File>),
}

pub struct ReadingPublisher {
    sink: Sink,
    published: usize,
}

impl ReadingPublisher {
    /// Publish into `output` as JSON lines, or as text to the log.
    pub fn to_output_or_log(output: Option<&Path>) -> Result<Self> {
        Self::with_fallback(output, Sink::Log)
    }

    /// Publish into `output` as JSON lines, or as text to stdout.
    pub fn to_output_or_stdout(output: Option<&Path>) -> Result<Self> {
        Self::with_fallback(output, Sink::Stdout)
    }

    fn with_fallback(output: Option<&Path>, fallback: Sink) -> Result<Self> {
        let sink = match output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {:?}", path))?;
                Sink::Json(BufWriter::new(file))
            }
            None => fallback,
        };
        Ok(Self { sink, published: 0 })
    }

    pub fn publish(&mut self, reading: &Reading) -> Result<()> {
        match &mut self.sink {
            Sink::Log => log::info!("{}", reading),
            Sink::Stdout => println!("{}", reading),
            Sink::Json(writer) => {
                write_json_line(writer, reading).context("Failed to write reading")?;
                writer.flush()?;
            }
        }
        self.published += 1;
        Ok(())
    }

    pub fn publish_all<'a>(
        &mut self,
        readings: impl IntoIterator<Item = &'a Reading>,
    ) -> Result<()> {
        for reading in readings {
            self.publish(reading)?;
        }
        Ok(())
    }

    /// Number of readings published so far
    pub fn published(&self) -> usize {
        self.published
    }
}

fn write_json_line<W: Write>(writer: &mut W, reading: &Reading) -> io::Result<()> {
    let record = PublishedReading {
        timestamp: Local::now().to_rfc3339(),
        name: reading.name(),
        reading,
    };
    serde_json::to_writer(&mut *writer, &record)?;
    writeln!(writer)
}
