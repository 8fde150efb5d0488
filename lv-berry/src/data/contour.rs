//! 轮廓标注文件解析.
//!
//! 标注文件为纯文本, 每行一个顶点, 两个以空白分隔的浮点数 (x, y).
//! 文件没有头部, 也没有闭合哨兵行: 首尾顶点的连接是隐式的.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 多边形: 像素坐标系下有序的 (x, y) 顶点序列, 隐式闭合.
pub type Polygon = Vec<(f32, f32)>;

/// 轮廓文件解析错误.
#[derive(Debug)]
pub enum ParseContourError {
    /// 底层 I/O 错误.
    Io(std::io::Error),

    /// 某一行不是两个浮点数. 参数为 1 起始的行号.
    Malformed(usize),
}

impl From<std::io::Error> for ParseContourError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// 解析给定轮廓标注文件, 返回顶点序列.
///
/// 每行取前两个空白分隔 token 作为 (x, y); 无法解析为浮点数的行
/// (包括空行) 返回 [`ParseContourError::Malformed`].
pub fn parse_contour_file<P: AsRef<Path>>(path: P) -> Result<Polygon, ParseContourError> {
    let file = File::open(path.as_ref())?;
    let mut ans = Polygon::new();

    for (no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let mut tokens = line.split_whitespace();
        let vertex = match (tokens.next(), tokens.next()) {
            (Some(x), Some(y)) => x.parse::<f32>().ok().zip(y.parse::<f32>().ok()),
            _ => None,
        };
        match vertex {
            Some(v) => ans.push(v),
            None => return Err(ParseContourError::Malformed(no + 1)),
        }
    }
    Ok(ans)
}
