//! Otsu 自动阈值.

use itertools::Itertools;

/// 直方图分箱数.
const BINS: usize = 256;

/// 对给定样本求 Otsu 阈值 (最大化类间方差的分割点).
///
/// 浮点样本先按 `[min, max]` 均分为 256 箱, 再做类间方差扫描,
/// 返回最优分箱的中心值. 样本为空时返回 `None`; 所有样本相等时
/// 直接返回该值.
pub fn otsu_threshold(values: &[f32]) -> Option<f32> {
    let (&min, &max) = values
        .iter()
        .minmax_by(|a, b| a.total_cmp(b))
        .into_option()?;
    if min == max {
        return Some(min);
    }

    let bin_width = (max - min) / BINS as f32;
    let mut hist = [0u64; BINS];
    for &v in values {
        let bin = (((v - min) / bin_width) as usize).min(BINS - 1);
        hist[bin] += 1;
    }

    let total = values.len() as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut weight_bg = 0.0;
    let mut sum_bg = 0.0;
    let mut best_variance = f64::MIN;
    let mut best_bin = 0usize;

    for (i, &count) in hist.iter().enumerate() {
        weight_bg += count as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += i as f64 * count as f64;

        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    Some(min + (best_bin as f32 + 0.5) * bin_width)
}
