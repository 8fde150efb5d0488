//! 切片图像解码接口.
//!
//! 解码器只负责 "文件 -> 原始二维数组 + 线性校准系数", 具体格式的
//! 细节由实现方决定. 核心流程通过 [`SliceDecoder`] 这一接口消费
//! 解码结果, 便于在测试中替换为桩实现.

use ndarray::Array2;
use std::path::Path;

/// 单张切片的解码结果: 原始像素与线性校准系数.
#[derive(Debug, Clone)]
pub struct DecodedSlice {
    /// 原始像素, 形状 (高, 宽).
    pub pixels: Array2<f32>,

    /// RescaleSlope. 标签缺失时为 0.0.
    pub slope: f64,

    /// RescaleIntercept. 标签缺失时为 0.0.
    pub intercept: f64,
}

impl DecodedSlice {
    /// 求内存表示: 仅当 slope 与 intercept **均非零** 时应用
    /// `raw * slope + intercept`, 否则原样返回原始像素.
    ///
    /// 任一系数为零都视作 "无校准信息", 而不是 "校准到零".
    pub fn rescaled(self) -> Array2<f32> {
        if self.slope != 0.0 && self.intercept != 0.0 {
            let (k, b) = (self.slope as f32, self.intercept as f32);
            self.pixels.mapv_into(|v| v * k + b)
        } else {
            self.pixels
        }
    }
}

/// 切片解码器接口.
pub trait SliceDecoder {
    /// 解码 `path` 指向的切片文件.
    ///
    /// 文件损坏或格式不受支持时返回 `None`; 调用方应将对应切片整体
    /// 降级为缺失, 而不是部分填充.
    fn decode(&self, path: &Path) -> Option<DecodedSlice>;
}

impl<T: SliceDecoder + ?Sized> SliceDecoder for &T {
    fn decode(&self, path: &Path) -> Option<DecodedSlice> {
        (**self).decode(path)
    }
}

#[cfg(feature = "dicom")]
pub use dcm::DcmDecoder;

#[cfg(feature = "dicom")]
mod dcm {
    use super::{DecodedSlice, SliceDecoder};
    use dicom::core::Tag;
    use dicom::dictionary_std::tags;
    use dicom::object::{open_file, DefaultDicomObject};
    use dicom_pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder};
    use ndarray::Array2;
    use std::path::Path;

    /// 基于 dicom-rs 的默认切片解码器.
    #[derive(Copy, Clone, Debug, Default)]
    pub struct DcmDecoder;

    impl DcmDecoder {
        fn try_decode(path: &Path) -> Option<DecodedSlice> {
            let obj = open_file(path).ok()?;
            let data = obj.decode_pixel_data().ok()?;
            let (rows, cols) = (data.rows() as usize, data.columns() as usize);

            // 不在此处应用 Modality LUT; 校准由上层按策略处理.
            let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
            let mut raw = data.to_vec_with_options::<f32>(&options).ok()?;
            // 多帧文件仅取首帧.
            raw.truncate(rows * cols);
            let pixels = Array2::from_shape_vec((rows, cols), raw).ok()?;

            Some(DecodedSlice {
                pixels,
                slope: tag_f64(&obj, tags::RESCALE_SLOPE),
                intercept: tag_f64(&obj, tags::RESCALE_INTERCEPT),
            })
        }
    }

    /// 读取浮点标签值, 缺失或不可转换时取 0.0.
    fn tag_f64(obj: &DefaultDicomObject, tag: Tag) -> f64 {
        obj.element_opt(tag)
            .ok()
            .flatten()
            .and_then(|e| e.to_float64().ok())
            .unwrap_or(0.0)
    }

    impl SliceDecoder for DcmDecoder {
        fn decode(&self, path: &Path) -> Option<DecodedSlice> {
            let ans = Self::try_decode(path);
            if ans.is_none() {
                log::warn!("DICOM 文件解码失败: {}", path.display());
            }
            ans
        }
    }
}


#[cfg(test)]
mod tests {
    use super::DecodedSlice;
    use ndarray::array;

    fn slice(slope: f64, intercept: f64) -> DecodedSlice {
        DecodedSlice {
            pixels: array![[1.0f32, 2.0], [3.0, 4.0]],
            slope,
            intercept,
        }
    }

    #[test]
    fn test_rescale_applied_when_both_nonzero() {
        let out = slice(2.0, 1.0).rescaled();
        assert_eq!(out, array![[3.0f32, 5.0], [7.0, 9.0]]);
    }

    /// 任一系数为零都代表 "无校准信息", 原样保留.
    #[test]
    fn test_rescale_skipped_when_any_zero() {
        let raw = array![[1.0f32, 2.0], [3.0, 4.0]];
        assert_eq!(slice(0.0, 0.0).rescaled(), raw);
        assert_eq!(slice(2.0, 0.0).rescaled(), raw);
        assert_eq!(slice(0.0, 5.0).rescaled(), raw);
    }
}
