//! Printing command results.

use std::io::Write;

use clap::ValueEnum;
use scorekeeper::AppError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented JSON document
    Pretty,
    /// One compact JSON value per line
    Jsonl,
}

pub struct Output<W> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> Output<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn emit<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), AppError> {
        let text = match self.format {
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Jsonl => serde_json::to_string(value)?,
        };
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    /// A JSON array when pretty, one line per item otherwise.
    pub fn emit_all<T: Serialize>(&mut self, items: &[T]) -> Result<(), AppError> {
        match self.format {
            OutputFormat::Pretty => self.emit(items),
            OutputFormat::Jsonl => items.iter().try_for_each(|item| self.emit(item)),
        }
    }
}
