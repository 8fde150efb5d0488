#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供心脏 MRI 左心室数据集 (DICOM 图像 + 手工轮廓标注文件)
//! 的结构化信息和基础处理算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 按照 "每病人一个 DICOM 序列目录, 一个标注目录
//!   (内含 `i-contours/` 与 `o-contours/` 两个子目录)" 的模式组织数据,
//!   没有对其它源的数据进行直接适配 (但如果新数据按照该模式进行组织,
//!   也可以工作).
//! 2. 在非期望情况下 (如形状不一致的数组运算), 程序会直接 panic,
//!   而不会导致内存错误. As what Rust promises.
//!
//! # 功能总览
//!
//! ### 切片定位与对齐 ✅
//!
//! 从文件名提取切片编号, 将 DICOM 集合与内/外轮廓集合按编号合并为
//! 升序的切片记录. 轮廓缺失是正常状态, 不是错误.
//!
//! 实现位于 `lv-berry/src/patient`.
//!
//! ### 多边形光栅化 ✅
//!
//! 将标注文件中的 (x, y) 顶点序列转换为 (高, 宽) 的 0/1 掩码.
//! 采用奇偶规则填充内部, 并以背景色描边轮廓本身.
//!
//! 实现位于 `lv-berry/src/data/raster.rs`.
//!
//! ### 解码数组缓存 ✅
//!
//! 病人对象内部的三阶段惰性缓存: 文件列表 -> 切片记录 -> 解码数组.
//! 每个阶段至多计算一次.
//!
//! 实现位于 `lv-berry/src/patient`.
//!
//! ### 内轮廓启发式推导 ✅
//!
//! 由图像与外轮廓掩码推导内轮廓提案: ROI 提取, Otsu 自动阈值,
//! 闭运算, 开运算, 顺序固定.
//!
//! 实现位于 `lv-berry/src/post_proc`.
//!
//! ### 训练样本源 ✅
//!
//! 将多个病人的对齐记录展平为可随机访问的 (图像, 掩码) 样本列表,
//! 每次访问即时解码.
//!
//! 实现位于 `lv-berry/src/dataset`.
//!
//! ### 评估指标 ✅
//!
//! Sørensen–Dice 系数.
//!
//! 实现位于 `lv-berry/src/metrics.rs`.

/// 二维索引 (高, 宽), 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 二维 0/1 掩码, 形状为 (高, 宽).
///
/// 约定 [`consts::MASK_BACKGROUND`] 为背景, [`consts::MASK_FOREGROUND`]
/// 为前景.
pub type Mask = ndarray::Array2<u8>;

pub mod consts;

/// 基础数据解析与转换: 轮廓文件, 光栅化, 切片解码接口.
pub mod data;

pub mod dataset;
pub mod metrics;
pub mod morph;
pub mod patient;
pub mod post_proc;
pub mod prelude;

pub use data::{parse_contour_file, poly_to_mask, DecodedSlice, ParseContourError, SliceDecoder};

#[cfg(feature = "dicom")]
pub use data::DcmDecoder;

pub use patient::{DecodedRecord, FileLists, Patient, PatientError, SliceRecord};
