//! Company backup export
//!
//! One CSV per table, zipped in memory. The archive is small enough
//! (one company) to build without streaming.

pub mod csv;

use std::io::{Cursor, Write};

use shared::error::AppError;
use zip::write::FileOptions;

pub use csv::CsvWriter;

/// A rendered CSV file inside the archive
#[derive(Debug)]
pub struct CsvFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Pack the CSV files into a deflated zip archive
pub fn build_zip(files: &[CsvFile]) -> Result<Vec<u8>, AppError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for file in files {
            zip.start_file(file.name.as_str(), options)
                .map_err(|e| AppError::internal(e.to_string()))?;
            zip.write_all(&file.content)
                .map_err(|e| AppError::internal(e.to_string()))?;
        }
        zip.finish().map_err(|e| AppError::internal(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// `luanova-backup-{company_id}-{yyyymmdd}.zip`
pub fn archive_name(company_id: i64, now_millis: i64) -> String {
    let date = chrono::DateTime::from_timestamp_millis(now_millis)
        .map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "export".to_string());
    format!("luanova-backup-{company_id}-{date}.zip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn zip_contains_every_file() {
        let files = vec![
            CsvFile {
                name: "company.csv".into(),
                content: b"id,name\r\n1,Padaria\r\n".to_vec(),
            },
            CsvFile {
                name: "products.csv".into(),
                content: b"id\r\n".to_vec(),
            },
        ];
        let bytes = build_zip(&files).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("company.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "id,name\r\n1,Padaria\r\n");
    }

    #[test]
    fn archive_name_uses_utc_date() {
        // 2025-03-04T12:00:00Z
        assert_eq!(
            archive_name(42, 1_741_089_600_000),
            "luanova-backup-42-20250304.zip"
        );
    }
}
