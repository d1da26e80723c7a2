//! I/O operations for reading geospatial data

mod shapefile;
mod wells;

pub use shapefile::{read_shapefile, read_shapefile_from_buffer};
pub use wells::{read_well_table, read_well_table_from_buffer};
