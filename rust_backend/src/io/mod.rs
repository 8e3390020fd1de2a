//! Output collaborators.
//!
//! Writers render an already computed [`ResultTable`](crate::services::ResultTable);
//! none of them make decisions about visibility.
//!
//! # Example
//!
//! ```no_run
//! use crescent_vis::io::csv_writer::write_csv;
//! use crescent_vis::models::ModelSelection;
//! use crescent_vis::services::ResultTable;
//! use std::path::Path;
//!
//! let table = ResultTable::new(&ModelSelection::all());
//! write_csv(&table, Path::new("data/empty.csv")).expect("Failed to write");
//! ```

pub mod cleanup;
pub mod csv_writer;
pub mod json_writer;
pub mod plots;

pub use cleanup::clean_data_dir;
pub use csv_writer::write_csv;
pub use json_writer::write_json;
pub use plots::{write_legend, PlotConfig, PlotRenderer};
