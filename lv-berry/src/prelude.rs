//! 🫀欢迎光临🫀
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Mask};

pub use crate::consts::{I_CONTOUR_DIR, MASK_BACKGROUND, MASK_FOREGROUND, O_CONTOUR_DIR};

pub use crate::data::{parse_contour_file, poly_to_mask, DecodedSlice, Polygon, SliceDecoder};

#[cfg(feature = "dicom")]
pub use crate::data::DcmDecoder;

pub use crate::patient::{
    contour_slice_index, dicom_slice_index, DecodedRecord, FileLists, Patient, PatientError,
    SliceRecord,
};

pub use crate::dataset::{
    home_dataset_dir_with, ContourDataset, ContourKind, GetSampleError, Sample,
};

pub use crate::morph::KernelShape;

pub use crate::post_proc::{propose_i_contour, KernelSpec, ProposalError, Threshold};

pub use crate::metrics::dice_score;
