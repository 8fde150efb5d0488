//! 后处理算法: 从图像与外轮廓掩码推导内轮廓提案.

mod inner;
mod otsu;

pub use inner::{propose_i_contour, KernelSpec, ProposalError, Threshold};
pub use otsu::otsu_threshold;
