pub mod csv_writer;
pub mod json_writer;

pub use csv_writer::{rounded, DailyCsvReader, DailyCsvWriter};
pub use json_writer::JsonWriter;
