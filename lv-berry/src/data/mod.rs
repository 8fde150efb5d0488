//! 基础数据结构与解析.

mod contour;
mod raster;

pub mod decode;

pub use contour::{parse_contour_file, ParseContourError, Polygon};
pub use decode::{DecodedSlice, SliceDecoder};
pub use raster::poly_to_mask;

#[cfg(feature = "dicom")]
pub use decode::DcmDecoder;
