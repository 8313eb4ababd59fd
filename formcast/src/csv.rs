//! Utilities for working with CSV files.

use std::fs::File;
use std::io;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecordsIntoIter, WriterBuilder};

pub struct CsvWriter<W: Write = File> {
    writer: csv::Writer<W>,
}
impl CsvWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::create(path)?;
        Ok(Self::wrap(file))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn wrap(writer: W) -> Self {
        Self {
            writer: WriterBuilder::new().flexible(true).from_writer(writer),
        }
    }

    pub fn append<R>(&mut self, record: R) -> Result<(), io::Error>
    where
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        self.writer.write_record(record)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), io::Error> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}

/// Yields every record, the header included, as owned fields. Records may differ in length.
pub struct CsvReader<R: Read = File> {
    records: StringRecordsIntoIter<R>,
}
impl CsvReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        Ok(Self::wrap(file))
    }
}

impl<R: Read> CsvReader<R> {
    pub fn wrap(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self {
            records: reader.into_records(),
        }
    }

    pub fn read(&mut self) -> Option<Result<Vec<String>, io::Error>> {
        self.records.next().map(|record| {
            record
                .map(|record| record.iter().map(ToString::to_string).collect())
                .map_err(io::Error::from)
        })
    }
}

impl<R: Read> Iterator for CsvReader<R> {
    type Item = Result<Vec<String>, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}
