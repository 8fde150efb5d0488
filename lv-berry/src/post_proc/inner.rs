//! 内轮廓提案.
//!
//! 给定图像与外轮廓掩码, 按固定顺序执行: ROI 提取 -> 阈值化 ->
//! 闭运算 -> 开运算. 顺序不可交换: 先闭后开才能先补孔再去噪.
//! 产出只是提案, 不保证与真值内轮廓一致.

use super::otsu_threshold;
use crate::consts::{is_background, MASK_BACKGROUND, MASK_FOREGROUND};
use crate::morph::{closing, opening, structuring_element, KernelShape};
use crate::Mask;
use ndarray::{Array2, Zip};

/// 阈值设置.
#[derive(Copy, Clone, Debug)]
pub enum Threshold {
    /// 在 ROI 的非零像素上用 Otsu 方法自动估计.
    ///
    /// 零值像素 (多为外轮廓之外的背景) 被排除在直方图之外,
    /// 避免把分割点拉向背景.
    Auto,

    /// 固定阈值.
    Fixed(f32),
}

/// 形态学参数: 单值 (两阶段共用) 或逐阶段.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelSpec<T> {
    /// 闭/开两个阶段共用同一设置.
    Same(T),

    /// 逐阶段设置: (闭运算, 开运算).
    PerStage(T, T),
}

impl<T: Copy> KernelSpec<T> {
    #[inline]
    const fn is_same(&self) -> bool {
        matches!(self, Self::Same(_))
    }

    /// 展开为 (闭运算设置, 开运算设置).
    #[inline]
    const fn split(&self) -> (T, T) {
        match *self {
            Self::Same(v) => (v, v),
            Self::PerStage(a, b) => (a, b),
        }
    }
}

/// 内轮廓提案错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalError {
    /// ROI 内没有非零像素, 无法估计直方图阈值.
    EmptyRoi,

    /// 形状与大小参数一个为单值另一个为逐阶段, 配置不一致.
    KernelSpecMismatch,
}

/// 由图像与外轮廓掩码推导内轮廓提案掩码.
///
/// `shape` 与 `size` 必须同为 [`KernelSpec::Same`] 或同为
/// [`KernelSpec::PerStage`], 否则返回
/// [`ProposalError::KernelSpecMismatch`].
///
/// 相同输入与参数下输出确定.
///
/// # Panics
///
/// `image` 与 `o_mask` 形状不一致, 或结构元大小为零时程序 panic.
pub fn propose_i_contour(
    image: &Array2<f32>,
    o_mask: &Mask,
    threshold: Threshold,
    shape: KernelSpec<KernelShape>,
    size: KernelSpec<usize>,
) -> Result<Mask, ProposalError> {
    if shape.is_same() != size.is_same() {
        return Err(ProposalError::KernelSpecMismatch);
    }
    let (close_shape, open_shape) = shape.split();
    let (close_size, open_size) = size.split();

    // 1. ROI: 外轮廓之外一律置零.
    let roi = Zip::from(image)
        .and(o_mask)
        .map_collect(|&v, &m| if is_background(m) { 0.0 } else { v });

    // 2. 阈值.
    let threshold = match threshold {
        Threshold::Fixed(t) => t,
        Threshold::Auto => {
            let nonzero: Vec<f32> = roi.iter().copied().filter(|&v| v != 0.0).collect();
            otsu_threshold(&nonzero).ok_or(ProposalError::EmptyRoi)?
        }
    };

    // 3. 严格大于阈值才算前景.
    let binary: Mask = roi.mapv(|v| {
        if v > threshold {
            MASK_FOREGROUND
        } else {
            MASK_BACKGROUND
        }
    });

    // 4, 5. 先闭后开.
    let closed = closing(&binary, &structuring_element(close_shape, close_size));
    Ok(opening(&closed, &structuring_element(open_shape, open_size)))
}
