//! Core library for the onet-work-values command line application.
//!
//! The pipeline reads a company job titles workbook, normalizes its headers,
//! joins O*NET Work Values by SOC code and writes an enriched workbook. IO
//! adapters live under [`io`], the data representations inside [`model`],
//! header and SOC handling in [`normalize`], the Work Values layouts in
//! [`values`], the join in [`enrich`], and the orchestration in
//! [`pipeline`].

pub mod enrich;
pub mod error;
pub mod input;
pub mod io;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod values;

pub use error::{EnrichError, Result};
