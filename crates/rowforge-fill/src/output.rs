use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::InsertColumn;
use crate::errors::FillError;
use crate::value::Value;

/// Flat-file flavors, differing only in delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    Csv,
    Tdv,
    Pipe,
}

impl FileFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            FileFormat::Csv => b',',
            FileFormat::Tdv => b'\t',
            FileFormat::Pipe => b'|',
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Tdv => "tsv",
            FileFormat::Pipe => "dat",
        }
    }
}

/// Streams rows for one table into a delimiter-separated file, header
/// first.
pub struct FlatFileWriter {
    writer: csv::Writer<BufWriter<File>>,
    rows: u64,
}

impl FlatFileWriter {
    pub fn create(
        path: &Path,
        format: FileFormat,
        columns: &[InsertColumn],
    ) -> Result<Self, FillError> {
        let file = BufWriter::new(File::create(path)?);
        let mut writer = csv::WriterBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(false)
            .from_writer(file);
        let header: Vec<&str> = columns.iter().map(|column| column.name.as_str()).collect();
        writer.write_record(&header)?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_row(&mut self, row: &[Value]) -> Result<(), FillError> {
        let record: Vec<String> = row.iter().map(Value::to_field).collect();
        self.writer.write_record(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the number of data rows written.
    pub fn finish(mut self) -> Result<u64, FillError> {
        self.writer.flush()?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowforge_core::TypeTag;

    fn columns() -> Vec<InsertColumn> {
        vec![
            InsertColumn {
                name: "id".to_string(),
                type_tag: TypeTag::Integer,
            },
            InsertColumn {
                name: "label".to_string(),
                type_tag: TypeTag::Text,
            },
        ]
    }

    fn write_sample(format: FileFormat) -> String {
        let dir = std::env::temp_dir().join(format!(
            "rowforge-output-test-{}-{}",
            format.extension(),
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("sample.{}", format.extension()));
        let mut writer = FlatFileWriter::create(&path, format, &columns()).unwrap();
        writer
            .write_row(&[Value::Int(1), Value::Text("alpha".to_string())])
            .unwrap();
        writer.write_row(&[Value::Int(2), Value::Null]).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        text
    }

    #[test]
    fn csv_uses_commas_and_a_header() {
        let text = write_sample(FileFormat::Csv);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,label"));
        assert_eq!(lines.next(), Some("1,alpha"));
        assert_eq!(lines.next(), Some("2,"));
    }

    #[test]
    fn tdv_uses_tabs() {
        let text = write_sample(FileFormat::Tdv);
        assert!(text.starts_with("id\tlabel"));
    }

    #[test]
    fn pipe_uses_pipes() {
        let text = write_sample(FileFormat::Pipe);
        assert!(text.starts_with("id|label"));
    }
}
