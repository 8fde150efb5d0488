//! 多边形光栅化.
//!
//! 将顶点序列转换为 (高, 宽) 的 0/1 掩码: 先以奇偶规则扫描线填充内部,
//! 再用背景色描边闭合轮廓. 因此轮廓线自身经过的像素 **不保证** 属于
//! 前景, 只有纯内部的像素会被保留. 这一 "描边清零" 行为是刻意的,
//! 下游的 ROI 统计依赖它.

use crate::consts::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::Mask;
use itertools::Itertools;
use ndarray::Array2;

/// 将多边形转换为形状 (`height`, `width`) 的 0/1 掩码.
///
/// 顶点单位为像素坐标, 首尾隐式相连. 顶点数不足 3 的退化多边形
/// 返回全背景掩码, 不报错. 自交多边形按奇偶规则处理.
pub fn poly_to_mask(polygon: &[(f32, f32)], width: usize, height: usize) -> Mask {
    let mut mask = Array2::from_elem((height, width), MASK_BACKGROUND);
    if polygon.len() < 3 || width == 0 || height == 0 {
        return mask;
    }
    fill_interior(&mut mask, polygon);
    stroke_outline(&mut mask, polygon);
    mask
}

/// 奇偶规则扫描线填充.
///
/// 每条扫描线收集与各边的交点. 区间按 "半开" 规则计数
/// (`y1 <= y < y2`), 保证经过顶点的扫描线不会把同一顶点算两次.
fn fill_interior(mask: &mut Mask, polygon: &[(f32, f32)]) {
    let (height, width) = mask.dim();
    let mut xs: Vec<f32> = Vec::with_capacity(polygon.len());

    for h in 0..height {
        let y = h as f32;
        xs.clear();
        for (&(x1, y1), &(x2, y2)) in polygon.iter().circular_tuple_windows() {
            if (y1 <= y && y < y2) || (y2 <= y && y < y1) {
                xs.push(x1 + (y - y1) * (x2 - x1) / (y2 - y1));
            }
        }
        xs.sort_by(|a, b| a.total_cmp(b));

        for pair in xs.chunks_exact(2) {
            let lo = pair[0].ceil() as i64;
            let hi = pair[1].floor() as i64;
            let lo = lo.max(0) as usize;
            if hi < 0 {
                continue;
            }
            let hi = (hi as usize).min(width.saturating_sub(1));
            for w in lo..=hi {
                mask[(h, w)] = MASK_FOREGROUND;
            }
        }
    }
}

/// 用背景色描出闭合轮廓 (含末顶点到首顶点的闭合边).
fn stroke_outline(mask: &mut Mask, polygon: &[(f32, f32)]) {
    for (&a, &b) in polygon.iter().circular_tuple_windows() {
        draw_line(mask, a, b);
    }
}

/// 整数 Bresenham 画线, 端点四舍五入到像素. 越界部分直接忽略.
fn draw_line(mask: &mut Mask, (x0, y0): (f32, f32), (x1, y1): (f32, f32)) {
    let (mut x, mut y) = (x0.round() as i64, y0.round() as i64);
    let (x1, y1) = (x1.round() as i64, y1.round() as i64);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        erase(mask, x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[inline]
fn erase(mask: &mut Mask, x: i64, y: i64) {
    if x >= 0 && y >= 0 {
        if let Some(p) = mask.get_mut((y as usize, x as usize)) {
            *p = MASK_BACKGROUND;
        }
    }
}
