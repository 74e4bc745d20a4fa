//! CSV ingestion for clinical-trial datasets.
//!
//! A dataset is a directory holding one CSV file per domain
//! (`population.csv`, `ae.csv`, `lab.csv`, ...) and an optional
//! `study.toml`. [`CsvSource`] serves such directories to the filter
//! engine as a raw data source.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use acuity_ingest::open;
//!
//! let (source, datasets) = open(Path::new("data/STUDY001"))?;
//! ```

mod discovery;
mod error;
mod reader;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use reader::{CsvRecord, DOMAIN_FILES, read_records};

// === Sources ===
pub use source::{CsvSource, STUDY_FILE};

// === Discovery ===
pub use discovery::{POPULATION_FILE, discover_datasets, is_dataset_dir, list_domain_files, open};
