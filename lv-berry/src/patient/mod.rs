//! 病人对象: 文件定位, 切片对齐与解码数组缓存.
//!
//! [`Patient`] 内部维护三个惰性阶段, 依次为:
//!
//! 1. 文件列表 ([`Patient::file_lists`]): 列出 DICOM 目录与内/外轮廓
//!    子目录下的可见文件;
//! 2. 切片记录 ([`Patient::slice_records`]): 从文件名提取切片编号,
//!    以 DICOM 集合的编号为键对齐三个集合;
//! 3. 解码数组 ([`Patient::decoded_records`]): 解码图像并按图像尺寸
//!    光栅化存在的轮廓文件.
//!
//! 每个阶段至多计算一次, 由 `OnceCell` 保证; 后继阶段自动触发前驱.

mod locate;

pub use locate::{contour_slice_index, dicom_slice_index};

use crate::consts::{I_CONTOUR_DIR, O_CONTOUR_DIR};
use crate::data::decode::SliceDecoder;
use crate::data::{parse_contour_file, poly_to_mask, ParseContourError};
use crate::Mask;
use ndarray::Array2;
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 病人数据处理错误.
#[derive(Debug)]
pub enum PatientError {
    /// 底层目录/文件读取错误.
    Io(std::io::Error),

    /// 文件名不符合切片编号约定.
    MalformedFilename(PathBuf),

    /// 同一文件集合内切片编号重复.
    DuplicateSliceIndex(u32),

    /// 轮廓文件内容解析失败.
    Contour(ParseContourError),
}

impl From<std::io::Error> for PatientError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ParseContourError> for PatientError {
    fn from(e: ParseContourError) -> Self {
        Self::Contour(e)
    }
}

/// 病人三类文件的列表 (阶段一产物).
#[derive(Debug, Clone)]
pub struct FileLists {
    /// DICOM 图像文件.
    pub dicoms: Vec<PathBuf>,

    /// 内轮廓标注文件.
    pub i_contours: Vec<PathBuf>,

    /// 外轮廓标注文件.
    pub o_contours: Vec<PathBuf>,
}

/// 对齐后的单切片文件记录 (阶段二产物).
///
/// 记录的存在以图像为准: 没有对应图像的轮廓编号不会出现在任何记录中.
/// 轮廓缺失是正常状态, 不是错误.
#[derive(Debug, Clone)]
pub struct SliceRecord {
    /// DICOM 图像文件.
    pub dicom: PathBuf,

    /// 内轮廓标注文件.
    pub i_contour: Option<PathBuf>,

    /// 外轮廓标注文件.
    pub o_contour: Option<PathBuf>,
}

/// 解码后的单切片数组记录 (阶段三产物).
///
/// `None` 一律表示 "缺失", 与 "内容为全零的掩码" 是两种不同状态.
/// 图像解码失败时三个字段全部缺失: 掩码离开图像尺寸没有意义.
#[derive(Debug, Clone, Default)]
pub struct DecodedRecord {
    /// 解码 (并按需校准) 后的图像.
    pub image: Option<Array2<f32>>,

    /// 内轮廓掩码, 形状与图像一致.
    pub i_mask: Option<Mask>,

    /// 外轮廓掩码, 形状与图像一致.
    pub o_mask: Option<Mask>,
}

impl DecodedRecord {
    /// (图像, 内掩码, 外掩码) 三元组访问器.
    #[inline]
    pub fn arrays(&self) -> (Option<&Array2<f32>>, Option<&Mask>, Option<&Mask>) {
        (self.image.as_ref(), self.i_mask.as_ref(), self.o_mask.as_ref())
    }

    /// 内外掩码是否都存在?
    #[inline]
    pub fn has_both_masks(&self) -> bool {
        self.i_mask.is_some() && self.o_mask.is_some()
    }
}

/// 一个病人: 不可变的身份信息加上三级惰性缓存.
///
/// 身份由 (DICOM 序列目录编号, 标注序列目录编号) 与两个根目录组成.
pub struct Patient {
    dicom_id: String,
    contour_id: String,
    dicoms_root: PathBuf,
    contours_root: PathBuf,

    files: OnceCell<FileLists>,
    records: OnceCell<BTreeMap<u32, SliceRecord>>,
    decoded: OnceCell<BTreeMap<u32, DecodedRecord>>,
}

impl Patient {
    /// 构建病人对象. 不做任何 I/O.
    pub fn new<S1, S2, P1, P2>(
        dicom_id: S1,
        contour_id: S2,
        dicoms_root: P1,
        contours_root: P2,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        P1: Into<PathBuf>,
        P2: Into<PathBuf>,
    {
        Self {
            dicom_id: dicom_id.into(),
            contour_id: contour_id.into(),
            dicoms_root: dicoms_root.into(),
            contours_root: contours_root.into(),
            files: OnceCell::new(),
            records: OnceCell::new(),
            decoded: OnceCell::new(),
        }
    }

    /// DICOM 序列目录编号.
    #[inline]
    pub fn dicom_id(&self) -> &str {
        &self.dicom_id
    }

    /// 标注序列目录编号.
    #[inline]
    pub fn contour_id(&self) -> &str {
        &self.contour_id
    }

    /// 阶段一: 三类文件列表. 惰性构建, 至多一次.
    pub fn file_lists(&self) -> Result<&FileLists, PatientError> {
        self.files.get_or_try_init(|| {
            let dicoms = locate::list_visible_files(&self.dicoms_root.join(&self.dicom_id))?;
            let contour_dir = self.contours_root.join(&self.contour_id);
            let i_contours = locate::list_visible_files(&contour_dir.join(I_CONTOUR_DIR))?;
            let o_contours = locate::list_visible_files(&contour_dir.join(O_CONTOUR_DIR))?;

            log::debug!(
                "病人 {}: dicom {} 个, 内轮廓 {} 个, 外轮廓 {} 个",
                self.dicom_id,
                dicoms.len(),
                i_contours.len(),
                o_contours.len()
            );
            Ok(FileLists {
                dicoms,
                i_contours,
                o_contours,
            })
        })
    }

    /// 阶段二: 切片编号 -> 对齐记录, 按编号升序.
    ///
    /// 记录集以 DICOM 集合的编号为准; 只出现在轮廓集合中的编号
    /// 不可达, 被有意丢弃.
    pub fn slice_records(&self) -> Result<&BTreeMap<u32, SliceRecord>, PatientError> {
        self.records.get_or_try_init(|| {
            let files = self.file_lists()?;
            let dicoms = locate::slice_index_map(&files.dicoms, dicom_slice_index)?;
            let mut inners = locate::slice_index_map(&files.i_contours, contour_slice_index)?;
            let mut outers = locate::slice_index_map(&files.o_contours, contour_slice_index)?;

            let mut ans = BTreeMap::new();
            for (idx, dicom) in dicoms {
                ans.insert(
                    idx,
                    SliceRecord {
                        dicom,
                        i_contour: inners.remove(&idx),
                        o_contour: outers.remove(&idx),
                    },
                );
            }
            Ok(ans)
        })
    }

    /// 阶段三: 切片编号 -> 解码数组记录, 按编号升序.
    ///
    /// 图像解码失败的切片整体降级为缺失 (不影响其它切片); 存在的
    /// 轮廓文件按图像 (宽, 高) 光栅化, 缺失的轮廓保持缺失.
    pub fn decoded_records<D: SliceDecoder>(
        &self,
        decoder: &D,
    ) -> Result<&BTreeMap<u32, DecodedRecord>, PatientError> {
        self.decoded.get_or_try_init(|| {
            let mut ans = BTreeMap::new();
            for (&idx, record) in self.slice_records()? {
                ans.insert(idx, decode_record(decoder, idx, record)?);
            }
            Ok(ans)
        })
    }

    /// 内外掩码皆存在的切片编号, 升序.
    ///
    /// 启发式推导的效果评估需要这样的 (内, 外) 成对切片.
    pub fn slices_with_both_masks<D: SliceDecoder>(
        &self,
        decoder: &D,
    ) -> Result<Vec<u32>, PatientError> {
        Ok(self
            .decoded_records(decoder)?
            .iter()
            .filter(|(_, record)| record.has_both_masks())
            .map(|(&idx, _)| idx)
            .collect())
    }
}

fn decode_record<D: SliceDecoder>(
    decoder: &D,
    idx: u32,
    record: &SliceRecord,
) -> Result<DecodedRecord, PatientError> {
    let Some(decoded) = decoder.decode(&record.dicom) else {
        log::warn!(
            "切片 {idx} 图像解码失败, 整条记录降级为缺失: {}",
            record.dicom.display()
        );
        return Ok(DecodedRecord::default());
    };

    let image = decoded.rescaled();
    let (height, width) = image.dim();
    let i_mask = rasterize_contour(record.i_contour.as_deref(), width, height)?;
    let o_mask = rasterize_contour(record.o_contour.as_deref(), width, height)?;

    Ok(DecodedRecord {
        image: Some(image),
        i_mask,
        o_mask,
    })
}

fn rasterize_contour(
    path: Option<&Path>,
    width: usize,
    height: usize,
) -> Result<Option<Mask>, PatientError> {
    match path {
        Some(p) => {
            let polygon = parse_contour_file(p)?;
            Ok(Some(poly_to_mask(&polygon, width, height)))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{Patient, PatientError};
    use crate::data::decode::testing::RampDecoder;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    /// 在 `root` 下搭建单病人目录结构.
    ///
    /// `dicoms` 为 DICOM 文件名; `inners`/`outers` 为 (编号, 内容)
    /// 对, 文件名按轮廓命名约定生成.
    fn build_patient_dirs(
        root: &Path,
        dicoms: &[&str],
        inners: &[(u32, &str)],
        outers: &[(u32, &str)],
    ) {
        let dicom_dir = root.join("dicoms/P1");
        fs::create_dir_all(&dicom_dir).unwrap();
        for name in dicoms {
            File::create(dicom_dir.join(name)).unwrap();
        }

        for (sub, entries) in [("i-contours", inners), ("o-contours", outers)] {
            let dir = root.join("contours/C1").join(sub);
            fs::create_dir_all(&dir).unwrap();
            let kind = if sub.starts_with('i') { "icontour" } else { "ocontour" };
            for &(idx, content) in entries {
                let name = format!("IM-0001-{idx:04}-{kind}-manual.txt");
                let mut file = File::create(dir.join(name)).unwrap();
                file.write_all(content.as_bytes()).unwrap();
            }
        }
    }

    /// 8x8 图像内的小方形轮廓.
    const SQUARE: &str = "1.0 1.0\n6.0 1.0\n6.0 6.0\n1.0 6.0\n";

    fn patient(root: &Path) -> Patient {
        Patient::new("P1", "C1", root.join("dicoms"), root.join("contours"))
    }

    #[test]
    fn test_alignment_contour_presence() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(
            root.path(),
            &["1.dcm", "2.dcm", "3.dcm", "4.dcm", ".DS_Store"],
            &[(1, SQUARE), (3, SQUARE)],
            &[(1, SQUARE), (2, SQUARE)],
        );

        let p = patient(root.path());
        let records = p.slice_records().unwrap();

        // 隐藏文件被过滤, 记录以图像编号为准.
        assert_eq!(records.len(), 4);
        let keys: Vec<u32> = records.keys().copied().collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);

        // 轮廓存在性对内外对称: 任一单独缺失都不是错误.
        assert!(records[&1].i_contour.is_some());
        assert!(records[&1].o_contour.is_some());
        assert!(records[&2].i_contour.is_none());
        assert!(records[&2].o_contour.is_some());
        assert!(records[&3].i_contour.is_some());
        assert!(records[&3].o_contour.is_none());
        assert!(records[&4].i_contour.is_none());
        assert!(records[&4].o_contour.is_none());
    }

    /// 只出现在轮廓集合中的编号不可达.
    #[test]
    fn test_contour_without_image_unreachable() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(root.path(), &["2.dcm"], &[(9, SQUARE)], &[]);

        let p = patient(root.path());
        let records = p.slice_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.contains_key(&2));
        assert!(!records.contains_key(&9));
    }

    #[test]
    fn test_malformed_dicom_name_propagates() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(root.path(), &["1.dcm", "slice-two.dcm"], &[], &[]);

        let p = patient(root.path());
        assert!(matches!(
            p.slice_records(),
            Err(PatientError::MalformedFilename(_))
        ));
    }

    #[test]
    fn test_duplicate_slice_index() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(root.path(), &["1.dcm", "01.dcm"], &[], &[]);

        let p = patient(root.path());
        assert!(matches!(
            p.slice_records(),
            Err(PatientError::DuplicateSliceIndex(1))
        ));
    }

    #[test]
    fn test_decoded_records_mask_shape_and_absence() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(
            root.path(),
            &["1.dcm", "2.dcm"],
            &[(1, SQUARE)],
            &[(1, SQUARE)],
        );

        let p = patient(root.path());
        let decoded = p.decoded_records(&RampDecoder::plain()).unwrap();

        let rec1 = &decoded[&1];
        let image = rec1.image.as_ref().unwrap();
        assert_eq!(image.dim(), (8, 8));
        assert_eq!(rec1.i_mask.as_ref().unwrap().dim(), image.dim());
        assert_eq!(rec1.o_mask.as_ref().unwrap().dim(), image.dim());

        // 轮廓缺失 => 掩码缺失, 而非全零掩码.
        let rec2 = &decoded[&2];
        assert!(rec2.image.is_some());
        assert!(rec2.i_mask.is_none());
        assert!(rec2.o_mask.is_none());
    }

    /// 图像解码失败时整条记录降级为缺失, 其它切片不受影响.
    #[test]
    fn test_decode_failure_degrades_whole_slice() {
        let root = TempDir::new().unwrap();
        // 含 "bad" 的文件名会被桩解码器拒绝; 编号从文件名前缀提取,
        // 因此用一个仍满足编号约定的名字.
        build_patient_dirs(root.path(), &["1.dcm"], &[(1, SQUARE)], &[(1, SQUARE)]);
        let dicom_dir = root.path().join("dicoms/P1");
        fs::rename(dicom_dir.join("1.dcm"), dicom_dir.join("1.bad.dcm")).unwrap();

        let p = patient(root.path());
        let decoded = p.decoded_records(&RampDecoder::plain()).unwrap();
        let rec = &decoded[&1];
        assert!(rec.image.is_none());
        assert!(rec.i_mask.is_none());
        assert!(rec.o_mask.is_none());
    }

    #[test]
    fn test_slices_with_both_masks() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(
            root.path(),
            &["1.dcm", "2.dcm", "3.dcm"],
            &[(1, SQUARE), (3, SQUARE)],
            &[(1, SQUARE), (2, SQUARE), (3, SQUARE)],
        );

        let p = patient(root.path());
        let both = p.slices_with_both_masks(&RampDecoder::plain()).unwrap();
        assert_eq!(both, vec![1, 3]);
    }

    /// 阶段缓存: 同一引用上的重复调用返回同一份数据.
    #[test]
    fn test_stage_memoization() {
        let root = TempDir::new().unwrap();
        build_patient_dirs(root.path(), &["1.dcm"], &[], &[]);

        let p = patient(root.path());
        let first = p.slice_records().unwrap() as *const _;
        let second = p.slice_records().unwrap() as *const _;
        assert_eq!(first, second);
    }
}
