#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供肺部 CT 序列的读取、逐切片肺分割, 以及基于分类器的肺边界修正算法.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 库内部统一使用 `(h, w)` (行, 列) 索引, 而不是 `(x, y)`.
//!   边界修正算法的三个特征对两个坐标轴是对称的, 因此两种写法等价.
//! 2. 数据相关的异常 (分类器输入形状错误, DICOM 文件损坏等) 以 `Result` 返回;
//!   参数构造时的非法输入 (如 [`border::BorderSpec::new`]) 会直接 panic.
//!
//! # 开发计划
//!
//! ### 8-邻域外轮廓提取 ✅
//!
//! Suzuki-Abe 边界跟踪, 只保留最外层轮廓. 另提供 Teh-Chin (L1 曲率)
//! 主导点近似, 用于寻找拐点.
//!
//! 实现位于 `lung-berry/src/eight`.
//!
//! ### 肺边界修正 ✅
//!
//! 在肺掩膜的轮廓上寻找拐点, 生成候选点对, 计算凹度 / 相对长度 / 相对位置
//! 三个特征, 交给分类器判断是否闭合两点之间的凹陷.
//!
//! 实现位于 `lung-berry/src/border`.
//!
//! ### 分类器 ✅
//!
//! 只依赖一个 `predict` 接口. 提供常量分类器、闭包分类器和预训练的 RBF 核 SVM.
//!
//! 实现位于 `lung-berry/src/classify`.
//!
//! ### 逐切片肺分割 ✅
//!
//! Otsu 阈值, 清除贴边区域, 保留最大的两个连通域, 圆盘开运算, 填充空洞.
//!
//! 实现位于 `lung-berry/src/segment`.
//!
//! ### DICOM 序列读取与 NIfTI 输出 ✅
//!
//! 按 `SliceLocation` 排序切片; 修正后的三维掩膜以单个 NIfTI 文件保存.
//!
//! 实现位于 `lung-berry/src/dataset` 和 `lung-berry/src/data`.
//!
//! ### 结节标注 (XML) 读取 ✅
//!
//! 读取 LIDC 风格标注中的结节与非结节轮廓, 按编号和 z 坐标组织.
//!
//! 实现位于 `lung-berry/src/dataset/xml.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 高精度通用索引 / 向量.
pub type Idx2dF = (f64, f64);

type Predicate = fn(u8) -> bool;

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

/// 3D CT 数据及二维切片基础数据结构.
mod data;

pub use data::{
    CtScan, CtWindow, ImgWriteRaw, ImgWriteVis, LungMask, MaskSlice, MaskSliceMut,
    OwnedMaskSlice, OwnedScanSlice, ScanSlice, VolumeAttr,
};

pub mod border;
pub mod classify;
pub mod consts;
pub mod dataset;
pub mod eight;
pub mod pipeline;
pub mod prelude;
pub mod segment;
