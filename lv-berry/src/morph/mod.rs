//! 二维二值形态学操作.
//!
//! 结构元语义与 OpenCV `getStructuringElement` 保持一致 (锚点取
//! `size / 2`); 膨胀/腐蚀的越界像素分别按背景/前景处理, 与 OpenCV
//! `morphologyEx` 的默认边界一致.

use crate::consts::{MASK_BACKGROUND, MASK_FOREGROUND};
use crate::Mask;
use ndarray::Array2;

/// 结构元形状.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelShape {
    /// 实心矩形.
    Rect,

    /// 内接椭圆 (此处为内接圆, 结构元恒为方形).
    Ellipse,

    /// 过中心的十字.
    Cross,
}

/// 构建 `size x size` 的 0/1 结构元.
///
/// `size` 为零时程序 panic.
pub fn structuring_element(shape: KernelShape, size: usize) -> Array2<u8> {
    assert!(size >= 1, "结构元大小至少为 1");
    let c = size / 2;
    let mut kernel = Array2::from_elem((size, size), 0u8);

    match shape {
        KernelShape::Rect => kernel.fill(1),
        KernelShape::Cross => {
            for k in 0..size {
                kernel[(c, k)] = 1;
                kernel[(k, c)] = 1;
            }
        }
        KernelShape::Ellipse if size == 1 => kernel[(0, 0)] = 1,
        KernelShape::Ellipse => {
            let r = c as f64;
            for i in 0..size {
                let dy = i as f64 - r;
                if dy.abs() > r {
                    continue;
                }
                // 与 OpenCV 相同: 行半宽取最近整数.
                let dx = (r * r - dy * dy).sqrt().round() as usize;
                let lo = c.saturating_sub(dx);
                let hi = (c + dx).min(size - 1);
                for j in lo..=hi {
                    kernel[(i, j)] = 1;
                }
            }
        }
    }
    kernel
}

/// 二值膨胀: 结构元覆盖范围内存在前景即输出前景.
pub fn dilate(mask: &Mask, kernel: &Array2<u8>) -> Mask {
    morph(mask, kernel, true)
}

/// 二值腐蚀: 结构元覆盖范围内全部为前景才输出前景.
pub fn erode(mask: &Mask, kernel: &Array2<u8>) -> Mask {
    morph(mask, kernel, false)
}

/// 闭运算: 先膨胀后腐蚀, 填补前景内的小孔.
pub fn closing(mask: &Mask, kernel: &Array2<u8>) -> Mask {
    erode(&dilate(mask, kernel), kernel)
}

/// 开运算: 先腐蚀后膨胀, 去除小的孤立前景.
pub fn opening(mask: &Mask, kernel: &Array2<u8>) -> Mask {
    dilate(&erode(mask, kernel), kernel)
}

fn morph(mask: &Mask, kernel: &Array2<u8>, dilating: bool) -> Mask {
    let (h, w) = mask.dim();
    let (kh, kw) = kernel.dim();
    let (ah, aw) = ((kh / 2) as isize, (kw / 2) as isize);

    let mut ans = Array2::from_elem((h, w), MASK_BACKGROUND);
    for i in 0..h {
        for j in 0..w {
            // 腐蚀假定全部命中, 膨胀假定全部落空, 扫描中途短路.
            let mut hit = !dilating;
            'scan: for ki in 0..kh {
                for kj in 0..kw {
                    if kernel[(ki, kj)] == 0 {
                        continue;
                    }
                    let y = i as isize + ki as isize - ah;
                    let x = j as isize + kj as isize - aw;
                    let fg = if y < 0 || x < 0 || y >= h as isize || x >= w as isize {
                        !dilating
                    } else {
                        mask[(y as usize, x as usize)] != MASK_BACKGROUND
                    };
                    if fg == dilating {
                        hit = dilating;
                        break 'scan;
                    }
                }
            }
            if hit {
                ans[(i, j)] = MASK_FOREGROUND;
            }
        }
    }
    ans
}
