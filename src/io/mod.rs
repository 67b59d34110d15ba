//! Workbook adapters: reading sheets, locating the Work Values source and
//! writing the enriched export.

pub mod excel_read;
pub mod excel_write;
pub mod source;
