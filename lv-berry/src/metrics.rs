//! 评估指标.

use crate::Mask;

/// Sørensen–Dice 系数: `2 * |pred ∩ targ| / (|pred| + |targ|)`.
///
/// 入参为 0/1 掩码. 两掩码皆空时返回 `NaN` (0 / 0).
///
/// # Panics
///
/// `pred` 与 `targ` 形状不一致时程序 panic.
pub fn dice_score(pred: &Mask, targ: &Mask) -> f64 {
    assert_eq!(pred.dim(), targ.dim(), "掩码形状不一致");

    let mut intersection = 0u64;
    let mut total = 0u64;
    for (&p, &t) in pred.iter().zip(targ.iter()) {
        intersection += u64::from(p) * u64::from(t);
        total += u64::from(p) + u64::from(t);
    }
    2.0 * intersection as f64 / total as f64
}
