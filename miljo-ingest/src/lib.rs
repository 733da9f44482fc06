//! miljo-ingest: workbook reading (Excel/CSV) into the shared grid model.

pub mod workbook;

pub use workbook::{IngestError, read_workbook_bytes, read_workbook_path};
