//! 数据集操作.
//!
//! 将多个病人的对齐切片展平为一个可随机访问的 (图像, 掩码) 样本源,
//! 供训练循环按下标取样.

use crate::data::decode::SliceDecoder;
use crate::data::{parse_contour_file, poly_to_mask, ParseContourError};
use crate::patient::{Patient, PatientError};
use ndarray::{Array3, Axis};
use std::path::{Path, PathBuf};

/// 轮廓类型选择器.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContourKind {
    /// 内轮廓.
    Inner,

    /// 外轮廓.
    Outer,
}

/// 单个训练样本: 通道前置的 (图像, 掩码) 对.
///
/// 两个数组形状均为 (1, 高, 宽); 掩码取值为 0/1.
#[derive(Debug, Clone)]
pub struct Sample {
    /// 图像数组.
    pub image: Array3<f32>,

    /// 掩码数组.
    pub mask: Array3<f32>,
}

/// 随机取样错误.
#[derive(Debug)]
pub enum GetSampleError {
    /// 访问下标越界: (下标, 样本总数).
    IndexOutOfRange(usize, usize),

    /// 图像解码失败.
    Decode(PathBuf),

    /// 轮廓文件解析失败.
    Contour(ParseContourError),
}

/// 以 (DICOM, 轮廓) 文件对为单位的扁平样本源.
///
/// [`ContourDataset::get`] 每次调用都重新解码且无任何可变状态,
/// 因此同一实例可以被多个工作线程以不相交下标并发取样.
pub struct ContourDataset<D> {
    pairs: Vec<(PathBuf, PathBuf)>,
    decoder: D,
}

impl<D: SliceDecoder> ContourDataset<D> {
    /// 从给定病人集合构建指定轮廓类型的样本源.
    ///
    /// 只收录所选轮廓存在的切片. 收录顺序: 病人按给定次序,
    /// 病人内部按切片编号升序.
    pub fn new(patients: &[Patient], kind: ContourKind, decoder: D) -> Result<Self, PatientError> {
        let mut pairs = Vec::new();
        for patient in patients {
            for record in patient.slice_records()?.values() {
                let contour = match kind {
                    ContourKind::Inner => record.i_contour.as_ref(),
                    ContourKind::Outer => record.o_contour.as_ref(),
                };
                if let Some(contour) = contour {
                    pairs.push((record.dicom.clone(), contour.clone()));
                }
            }
        }
        log::debug!("样本源构建完成: {kind:?} 轮廓, 共 {} 个样本", pairs.len());
        Ok(Self { pairs, decoder })
    }

    /// 样本总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// 样本源是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 收录的 (DICOM, 轮廓) 文件对.
    #[inline]
    pub fn pairs(&self) -> &[(PathBuf, PathBuf)] {
        &self.pairs
    }

    /// 取第 `idx` 个样本.
    ///
    /// 每次调用都重新解码图像并重新光栅化轮廓, 不做任何缓存;
    /// 掩码按解码出的图像尺寸光栅化, 形状始终与图像一致.
    pub fn get(&self, idx: usize) -> Result<Sample, GetSampleError> {
        let Some((dicom, contour)) = self.pairs.get(idx) else {
            return Err(GetSampleError::IndexOutOfRange(idx, self.len()));
        };

        let image = self
            .decoder
            .decode(dicom)
            .ok_or_else(|| GetSampleError::Decode(dicom.clone()))?
            .rescaled();
        let (height, width) = image.dim();

        let polygon = parse_contour_file(contour).map_err(GetSampleError::Contour)?;
        let mask = poly_to_mask(&polygon, width, height);

        Ok(Sample {
            image: image.insert_axis(Axis(0)),
            mask: mask.mapv(f32::from).insert_axis(Axis(0)),
        })
    }
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

#[cfg(test)]
mod tests {
    use super::{ContourDataset, ContourKind, GetSampleError};
    use crate::data::decode::testing::RampDecoder;
    use crate::patient::Patient;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const SQUARE: &str = "1.0 1.0\n6.0 1.0\n6.0 6.0\n1.0 6.0\n";

    /// 规格化的单病人目录: 图像 1..=3, 外轮廓 1 和 2, 内轮廓仅 1.
    fn build_fixture(root: &Path) {
        let dicom_dir = root.join("dicoms/P1");
        fs::create_dir_all(&dicom_dir).unwrap();
        for name in ["1.dcm", "2.dcm", "3.dcm"] {
            File::create(dicom_dir.join(name)).unwrap();
        }

        let entries = [
            ("i-contours", "icontour", vec![1u32]),
            ("o-contours", "ocontour", vec![1, 2]),
        ];
        for (sub, kind, indices) in entries {
            let dir = root.join("contours/C1").join(sub);
            fs::create_dir_all(&dir).unwrap();
            for idx in indices {
                let name = format!("IM-0001-{idx:04}-{kind}-manual.txt");
                let mut file = File::create(dir.join(name)).unwrap();
                file.write_all(SQUARE.as_bytes()).unwrap();
            }
        }
    }

    fn patients(root: &Path) -> Vec<Patient> {
        vec![Patient::new(
            "P1",
            "C1",
            root.join("dicoms"),
            root.join("contours"),
        )]
    }

    #[test]
    fn test_end_to_end_lengths() {
        let _ = simple_logger::SimpleLogger::new().init();

        let root = TempDir::new().unwrap();
        build_fixture(root.path());
        let all = patients(root.path());

        let inner = ContourDataset::new(&all, ContourKind::Inner, RampDecoder::plain()).unwrap();
        assert_eq!(inner.len(), 1);

        let outer = ContourDataset::new(&all, ContourKind::Outer, RampDecoder::plain()).unwrap();
        assert_eq!(outer.len(), 2);
        assert!(!outer.is_empty());
    }

    #[test]
    fn test_inner_returns_slice_one_pair() {
        let root = TempDir::new().unwrap();
        build_fixture(root.path());
        let all = patients(root.path());

        let inner = ContourDataset::new(&all, ContourKind::Inner, RampDecoder::plain()).unwrap();
        let (dicom, contour) = &inner.pairs()[0];
        assert!(dicom.ends_with("1.dcm"));
        assert!(contour
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains("-0001-icontour"));
    }

    #[test]
    fn test_get_sample_shapes() {
        let root = TempDir::new().unwrap();
        build_fixture(root.path());
        let all = patients(root.path());

        let outer = ContourDataset::new(&all, ContourKind::Outer, RampDecoder::plain()).unwrap();
        let sample = outer.get(0).unwrap();

        // 通道前置的 (1, H, W).
        assert_eq!(sample.image.dim(), (1, 8, 8));
        assert_eq!(sample.mask.dim(), (1, 8, 8));
        assert!(sample.mask.iter().all(|&v| v == 0.0 || v == 1.0));
        // SQUARE 的内部 (描边之外) 为 4x4.
        assert_eq!(sample.mask.iter().filter(|&&v| v == 1.0).count(), 16);
    }

    /// 重复取样结果一致 (无状态, 幂等).
    #[test]
    fn test_get_idempotent() {
        let root = TempDir::new().unwrap();
        build_fixture(root.path());
        let all = patients(root.path());

        let outer = ContourDataset::new(&all, ContourKind::Outer, RampDecoder::plain()).unwrap();
        let a = outer.get(1).unwrap();
        let b = outer.get(1).unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(a.mask, b.mask);
    }

    #[test]
    fn test_get_out_of_range() {
        let root = TempDir::new().unwrap();
        build_fixture(root.path());
        let all = patients(root.path());

        let inner = ContourDataset::new(&all, ContourKind::Inner, RampDecoder::plain()).unwrap();
        assert!(matches!(
            inner.get(1),
            Err(GetSampleError::IndexOutOfRange(1, 1))
        ));
    }
}
