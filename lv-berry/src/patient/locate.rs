//! 病人文件定位与切片编号提取.

use super::PatientError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 列出 `dir` 下所有可见文件 (跳过以 `.` 开头的隐藏项), 按路径排序.
pub(super) fn list_visible_files(dir: &Path) -> Result<Vec<PathBuf>, PatientError> {
    let mut ans = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        ans.push(entry.path());
    }
    ans.sort();
    Ok(ans)
}

/// 从 DICOM 文件名提取切片编号: 第一个 `.` 之前的整数 token.
///
/// 如 `48.dcm` -> 48. 提取失败返回
/// [`PatientError::MalformedFilename`], 这是上游命名约定被破坏的信号,
/// 必须向外传播而不能静默跳过.
pub fn dicom_slice_index(path: &Path) -> Result<u32, PatientError> {
    let name = file_name(path)?;
    name.split('.')
        .next()
        .and_then(|tok| tok.parse::<u32>().ok())
        .ok_or_else(|| PatientError::MalformedFilename(path.to_owned()))
}

/// 从轮廓文件名提取切片编号: 以 `-` 分隔的第三个 token.
///
/// 如 `IM-0001-0048-icontour-manual.txt` -> 48.
pub fn contour_slice_index(path: &Path) -> Result<u32, PatientError> {
    let name = file_name(path)?;
    name.split('-')
        .nth(2)
        .and_then(|tok| tok.parse::<u32>().ok())
        .ok_or_else(|| PatientError::MalformedFilename(path.to_owned()))
}

fn file_name(path: &Path) -> Result<&str, PatientError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PatientError::MalformedFilename(path.to_owned()))
}

/// 以 `extract` 提取编号, 构建编号 -> 路径的升序映射.
///
/// 同一集合内编号必须唯一, 重复时返回
/// [`PatientError::DuplicateSliceIndex`].
pub(super) fn slice_index_map<F>(
    paths: &[PathBuf],
    extract: F,
) -> Result<BTreeMap<u32, PathBuf>, PatientError>
where
    F: Fn(&Path) -> Result<u32, PatientError>,
{
    let mut ans = BTreeMap::new();
    for path in paths {
        let idx = extract(path)?;
        if ans.insert(idx, path.clone()).is_some() {
            return Err(PatientError::DuplicateSliceIndex(idx));
        }
    }
    Ok(ans)
}
