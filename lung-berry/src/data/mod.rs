use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView, Axis, Ix3, Zip};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;

use crate::consts::gray::*;
use crate::{Idx2d, Idx3d};

pub mod slice;
pub mod window;

pub use slice::{
    ImgWriteRaw, ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMaskSlice, OwnedScanSlice, ScanSlice,
};

pub use window::CtWindow;

/// 三维体数据的共用属性和部分通用操作.
///
/// 形状统一按 `(z, H, W)` 组织, `z` 为切片方向.
pub trait VolumeAttr {
    /// 获取数据形状大小.
    fn shape(&self) -> Idx3d;

    /// 获取体素分辨率 (单位: 毫米), 分别为 `[z, H, W]` 方向.
    fn pix_dim(&self) -> [f32; 3];

    /// 获取数据水平切片形状大小.
    #[inline]
    fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    fn voxel(&self) -> f64 {
        self.pix_dim().iter().map(|d| *d as f64).product()
    }

    /// 构建写出 NIfTI 文件时使用的参考 header. 维度和数据类型由写出器根据数组决定.
    fn reference_header(&self) -> NiftiHeader {
        let [z, h, w] = self.pix_dim();
        let mut header = NiftiHeader::default();
        let [_, pw, ph, pz, ..] = &mut header.pixdim;
        (*pw, *ph, *pz) = (w, h, z);
        header
    }
}

/// 3D CT 扫描. CT 值以 `f32` 保存, 形状为 `(z, H, W)`.
#[derive(Debug, Clone)]
pub struct CtScan {
    data: Array3<f32>,
    pix_dim: [f32; 3],
}

impl VolumeAttr for CtScan {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    #[inline]
    fn pix_dim(&self) -> [f32; 3] {
        self.pix_dim
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for CtScan {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl CtScan {
    /// 由 `(z, H, W)` 格式的数据和 `[z, H, W]` 方向的体素分辨率创建.
    #[inline]
    pub fn new(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        Self { data, pix_dim }
    }

    /// 获取 3D 扫描 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 扫描水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 将 `mask` 的背景位置置零, 得到只保留肺部的扫描.
    ///
    /// 两者形状不一致时 panic.
    pub fn masked(&self, mask: &LungMask) -> CtScan {
        assert_eq!(self.shape(), mask.shape(), "扫描与掩膜形状不符");
        let mut data = self.data.clone();
        Zip::from(&mut data).and(&mask.data).for_each(|v, &m| {
            if is_background(m) {
                *v = 0.0;
            }
        });
        CtScan::new(data, self.pix_dim)
    }

    /// 以 NIfTI 格式保存到 `path`. 扩展名为 `.nii.gz` 时自动压缩.
    pub fn save_nifti<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        // [z, H, W] -> [W, H, z].
        let view = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.reference_header())
            .write_nifti(&view)
    }
}

/// 3D 肺掩膜. 体素值为 `LUNG_BACKGROUND` 或 `LUNG_FOREGROUND`, 形状为 `(z, H, W)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LungMask {
    data: Array3<u8>,
    pix_dim: [f32; 3],
}

impl VolumeAttr for LungMask {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    #[inline]
    fn pix_dim(&self) -> [f32; 3] {
        self.pix_dim
    }
}

impl Index<Idx3d> for LungMask {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for LungMask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl LungMask {
    /// 由 `(z, H, W)` 格式的数据和 `[z, H, W]` 方向的体素分辨率创建.
    #[inline]
    pub fn new(data: Array3<u8>, pix_dim: [f32; 3]) -> Self {
        Self { data, pix_dim }
    }

    /// 按原切片顺序堆叠二维掩膜.
    ///
    /// 如果 `slices` 为空或形状不一致, 则返回 `None`.
    pub fn stack(slices: &[OwnedMaskSlice], pix_dim: [f32; 3]) -> Option<Self> {
        let views: Vec<_> = slices.iter().map(OwnedMaskSlice::view).collect();
        let data = ndarray::stack(Axis(0), &views).ok()?;
        Some(Self { data, pix_dim })
    }

    /// 获取 3D 掩膜 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代 3D 掩膜水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = MaskSlice> {
        self.data.axis_iter(Axis(0)).map(MaskSlice::new)
    }

    /// 获取能按升序迭代 3D 掩膜水平可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = MaskSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(MaskSliceMut::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u8, Ix3> {
        self.data.view()
    }

    /// 获取前景体素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|p| is_foreground(**p)).count()
    }

    /// 以 NIfTI 格式保存到 `path`. 扩展名为 `.nii.gz` 时自动压缩.
    pub fn save_nifti<P: AsRef<Path>>(&self, path: P) -> nifti::Result<()> {
        // [z, H, W] -> [W, H, z].
        let view = self.data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.reference_header())
            .write_nifti(&view)
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl CtScan {
    /// 借助 `rayon`, 并行地对每个水平切片实施 `op` 操作, 结果按切片顺序排列.
    pub fn par_map_slice<T, F>(&self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(ScanSlice) -> T + Sync + Send,
    {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|v| op(ScanSlice::new(v)))
            .collect()
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl LungMask {
    /// 借助 `rayon`, 并行地对每个水平可变切片实施 `op` 操作, 结果按切片顺序排列.
    /// 该操作会同时携带 z 方向索引信息.
    pub fn par_map_indexed_slice_mut<T, F>(&mut self, op: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize, MaskSliceMut) -> T + Sync + Send,
    {
        self.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(z, v)| op(z, MaskSliceMut::new(v)))
            .collect()
    }
}
