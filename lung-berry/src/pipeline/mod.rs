//! 整卷流程: 读取 DICOM 序列, 逐切片分割, 逐切片边界修正, 应用掩膜.

use crate::border::{border_correct, BorderSpec, Corrected};
use crate::classify::{Classifier, ClassifyError, ClassifyResult};
use crate::dataset::{read_dicom_directory, DicomSeries, LoadError};
use crate::consts::segment::STORED_ZERO_HU;
use crate::segment::segment_lungs_with_floor;
use crate::{CtScan, LungMask, MaskSliceMut, VolumeAttr};
use log::debug;
use ndarray::Array3;
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 整卷流程参数.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineSpec {
    /// 候选点对生成规则.
    pub border: BorderSpec,

    /// 随机种子. 每张切片的随机源由它和切片索引共同决定.
    pub seed: u64,
}

impl PipelineSpec {
    /// 构建参数.
    pub fn new(border: BorderSpec, seed: u64) -> Self {
        Self { border, seed }
    }

    /// 第 `z` 张切片的随机源. 与切片的处理顺序无关.
    pub fn slice_rng(&self, z: usize) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ (z as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// 整卷修正统计.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeReport {
    /// 按切片顺序排列的单切片统计.
    pub slices: Vec<Corrected>,

    /// 所有切片的合计.
    pub total: Corrected,
}

impl VolumeReport {
    fn from_slices(slices: Vec<Corrected>) -> Self {
        let mut total = Corrected::default();
        slices.iter().for_each(|c| total.merge(c));
        Self { slices, total }
    }
}

/// 整卷流程的错误.
#[derive(Debug)]
pub enum PipelineError {
    /// 读取 DICOM 序列失败.
    Load(LoadError),

    /// 分类器输入错误.
    Classify(ClassifyError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(e) => write!(f, "load: {e}"),
            Self::Classify(e) => write!(f, "classify: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Load(e) => Some(e),
            Self::Classify(e) => Some(e),
        }
    }
}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ClassifyError> for PipelineError {
    fn from(e: ClassifyError) -> Self {
        Self::Classify(e)
    }
}

/// [`read_and_correct`] 的输出.
#[derive(Debug)]
pub struct Corrected3d {
    /// 原始扫描, `(z, H, W)`.
    pub raw: CtScan,

    /// 只保留修正后肺部的扫描 (背景体素为 0).
    pub segmented: CtScan,

    /// 修正后的肺掩膜.
    pub mask: LungMask,

    /// 每张切片的 `SliceLocation`, 升序.
    pub slice_locations: Vec<f64>,

    /// 修正统计.
    pub report: VolumeReport,
}

/// 逐切片分割整个扫描, 截断下限为 [`STORED_ZERO_HU`].
pub fn segment_volume(scan: &CtScan) -> LungMask {
    segment_volume_with_floor(scan, STORED_ZERO_HU)
}

/// 逐切片分割整个扫描, 低于 `floor` 的值先被截断.
pub fn segment_volume_with_floor(scan: &CtScan, floor: f32) -> LungMask {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let slices = scan.par_map_slice(|s| segment_lungs_with_floor(&s, floor));
        } else {
            let slices: Vec<_> = scan.slice_iter().map(|s| segment_lungs_with_floor(&s, floor)).collect();
        }
    }
    let mut mask = LungMask::new(Array3::zeros(scan.shape()), scan.pix_dim());
    for (mut dst, src) in mask.slice_iter_mut().zip(slices.iter()) {
        dst.assign(&src.as_immut());
    }
    mask
}

fn correct_slice<C>(z: usize, mut slice: MaskSliceMut, clf: &C, spec: &PipelineSpec) -> ClassifyResult<Corrected>
where
    C: Classifier + ?Sized,
{
    let mut rng = spec.slice_rng(z);
    border_correct(&mut slice, clf, &spec.border, &mut rng)
}

/// 逐切片修正 `mask`. 启用 `rayon` 时各切片并行处理, 结果与顺序处理逐字节相同.
pub fn correct_volume<C>(mask: &mut LungMask, clf: &C, spec: &PipelineSpec) -> ClassifyResult<VolumeReport>
where
    C: Classifier + Sync + ?Sized,
{
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            let slices = mask
                .par_map_indexed_slice_mut(|z, s| correct_slice(z, s, clf, spec))
                .into_iter()
                .collect::<ClassifyResult<Vec<_>>>()?;
            let report = VolumeReport::from_slices(slices);
        } else {
            let report = correct_volume_sequential(mask, clf, spec)?;
        }
    }
    debug!(
        "corrected {} slices: {} pairs closed, +{} voxels",
        report.slices.len(),
        report.total.closed,
        report.total.pixels_added
    );
    Ok(report)
}

/// 按切片顺序逐个修正 `mask`.
pub fn correct_volume_sequential<C>(
    mask: &mut LungMask,
    clf: &C,
    spec: &PipelineSpec,
) -> ClassifyResult<VolumeReport>
where
    C: Classifier + ?Sized,
{
    let slices = mask
        .slice_iter_mut()
        .enumerate()
        .map(|(z, s)| correct_slice(z, s, clf, spec))
        .collect::<ClassifyResult<Vec<_>>>()?;
    Ok(VolumeReport::from_slices(slices))
}

/// 读取目录 `dir` 中的 DICOM 序列, 分割并修正肺掩膜, 再把掩膜应用到扫描上.
pub fn read_and_correct<P, C>(dir: P, clf: &C, spec: &PipelineSpec) -> Result<Corrected3d, PipelineError>
where
    P: AsRef<Path>,
    C: Classifier + Sync + ?Sized,
{
    let series = read_dicom_directory(dir.as_ref())?;
    let floor = series.stored_zero();
    let DicomSeries {
        scan,
        slice_locations,
        files,
        ..
    } = series;
    debug!("{}: {} slices, floor {floor} HU", dir.as_ref().display(), files.len());

    let mut mask = segment_volume_with_floor(&scan, floor);
    let report = correct_volume(&mut mask, clf, spec)?;
    let segmented = scan.masked(&mask);
    Ok(Corrected3d {
        raw: scan,
        segmented,
        mask,
        slice_locations,
        report,
    })
}
