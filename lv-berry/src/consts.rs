//! 通用常量.

/// 掩码中背景的像素值.
pub const MASK_BACKGROUND: u8 = 0;

/// 掩码中前景的像素值.
pub const MASK_FOREGROUND: u8 = 1;

/// 病人标注目录下, 内轮廓文件子目录名.
pub const I_CONTOUR_DIR: &str = "i-contours";

/// 病人标注目录下, 外轮廓文件子目录名.
pub const O_CONTOUR_DIR: &str = "o-contours";

/// 像素是否是前景?
#[inline]
pub const fn is_foreground(p: u8) -> bool {
    !matches!(p, MASK_BACKGROUND)
}

/// 像素是否是背景?
#[inline]
pub const fn is_background(p: u8) -> bool {
    matches!(p, MASK_BACKGROUND)
}
