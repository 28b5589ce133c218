//! Export module for saving terrain data as RAW arrays.
//!
//! Heights go out as 16-bit or 32-bit RAW for game engine imports; biome maps
//! and erosion traces as flat little-endian arrays.

mod raw;

pub use raw::{
    expected_file_size, export_biome_ids_raw, export_heights_raw, export_trace_raw, RawExportError,
    RawFormat,
};
