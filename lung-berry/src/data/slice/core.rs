use crate::consts::gray::*;
use crate::eight::{neighbour4, neighbour8, Connectivity};
use crate::{Area2d, Areas2d, Idx2d, Predicate};
use ndarray::iter::{Iter, IterMut};
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::collections::{HashSet, VecDeque};
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 不可变、借用的二维水平肺掩膜切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LungMask`] 或 [`OwnedMaskSlice`].
    data: ArrayView2<'a, u8>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维水平肺掩膜切片.
///
/// 边界修正算法直接在该视图上就地修改掩膜.
pub struct MaskSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::LungMask`] 或 [`OwnedMaskSlice`].
    data: ArrayViewMut2<'a, u8>,
}

/// 可变方法集合.
impl<'a> MaskSliceMut<'a> {
    /// 获得 **底层** 数据的一份可变 shallow copy.
    #[inline]
    pub fn array_view_mut(&mut self) -> ArrayViewMut2<u8> {
        self.data.view_mut()
    }

    /// 获取可以迭代并修改图像像素的迭代器.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, u8, Ix2> {
        self.data.iter_mut()
    }

    /// 将 `it` 中的每个索引对应的像素改为 `new`.
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, new: u8) {
        for pos in it.into_iter() {
            self[pos] = new;
        }
    }

    /// 将所有非零像素改写为 `LUNG_FOREGROUND`.
    ///
    /// 返回被改写的像素个数.
    pub fn binarize(&mut self) -> usize {
        let mut cnt = 0usize;
        self.iter_mut()
            .filter(|p| is_foreground(**p) && **p != LUNG_FOREGROUND)
            .for_each(|p| {
                cnt += 1;
                *p = LUNG_FOREGROUND;
            });
        cnt
    }

    /// 用 `other` 覆盖 `self` 的内容. 两者形状必须一致, 否则 panic.
    pub fn assign(&mut self, other: &MaskSlice) {
        assert_eq!(self.shape(), other.shape(), "切片形状不符");
        self.data.assign(&other.data);
    }
}

impl Index<Idx2d> for MaskSliceMut<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// mask 不可变方法集合.
macro_rules! impl_mask_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得 **底层** 数据的一份不可变 shallow copy.
            #[inline]
            pub fn array_view(&self) -> ArrayView2<u8> {
                self.data.view()
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, u8, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&u8> {
                self.data.get(pos)
            }

            /// 判断给定位置是否为前景. 越界位置视为背景.
            #[inline]
            pub fn is_foreground_at(&self, pos: Idx2d) -> bool {
                matches!(self.get(pos), Some(&v) if is_foreground(v))
            }

            /// 该图是否为全背景图?
            #[inline]
            pub fn is_background(&self) -> bool {
                self.data.iter().copied().all(is_background)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计图像中前景 (非零) 像素总个数.
            #[inline]
            pub fn count_foreground(&self) -> usize {
                self.data.iter().filter(|&p| is_foreground(*p)).count()
            }

            /// 获得一份不可变的 **本体** shallow copy.
            #[inline]
            pub fn shallow_copy(&self) -> MaskSlice {
                MaskSlice { data: self.array_view() }
            }

            /// 克隆自己, 获得一个拥有所有权的切片对象.
            pub fn to_owned(&self) -> OwnedMaskSlice {
                OwnedMaskSlice {
                    data: self.data.to_owned(),
                }
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否位于图像的边缘.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                h == 0
                    || h.saturating_add(1) == self.height()
                    || w == 0
                    || w.saturating_add(1) == self.width()
            }

            /// 按照连通规则 `conn` 获得 `pos` 的邻域像素索引. 保证返回的索引都不越界.
            pub fn neighbours(&self, pos: Idx2d, conn: Connectivity) -> Vec<Idx2d> {
                match conn {
                    Connectivity::Four => neighbour4(pos)
                        .into_iter()
                        .filter(|p| self.check(*p))
                        .collect(),
                    Connectivity::Eight => neighbour8(pos)
                        .into_iter()
                        .filter(|p| self.check(*p))
                        .collect(),
                }
            }

            /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                super::iter::PosIter::new(self.shape())
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u8)> {
                self.data.indexed_iter()
            }

            /// 按照连通规则 `conn` 获取所有满足谓词 `pred` 的区域.
            /// 区域按照其第一个像素的行优先顺序排列.
            pub fn areas(&self, pred: Predicate, conn: Connectivity) -> Areas2d {
                self.areas_from_local(self.pos_iter(), pred, conn)
            }

            /// 按照 8-相邻原则获得图像中所有前景区域.
            #[inline]
            pub fn foreground_areas(&self) -> Areas2d {
                self.areas(is_foreground, Connectivity::Eight)
            }

            /// 按照 4-相邻原则获得图像中所有背景区域.
            #[inline]
            pub fn background_areas(&self) -> Areas2d {
                self.areas(is_background, Connectivity::Four)
            }

            /// 按照连通规则 `conn` 获取所有区域, 但区域范围由 `it` 指定.
            /// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到
            /// `p2` 的相邻路径, 且路径上的所有像素 (包括 `p1` 和 `p2`)
            /// 都满足谓词 `pred`.
            pub fn areas_from_local<I: IntoIterator<Item = Idx2d>>(
                &self,
                it: I,
                pred: Predicate,
                conn: Connectivity,
            ) -> Areas2d {
                let mut ans = Areas2d::with_capacity(1);
                let mut bfs_q = VecDeque::with_capacity(4);
                let mut set = HashSet::with_capacity(16);

                for pos in it.into_iter() {
                    if set.contains(&pos) || !pred(self[pos]) {
                        continue;
                    }
                    bfs_q.push_back(pos);
                    let mut this_area = Area2d::with_capacity(1);
                    while let Some(cur_pos) = bfs_q.pop_front() {
                        if !set.insert(cur_pos) {
                            continue;
                        }
                        this_area.push(cur_pos);
                        bfs_q.extend(
                            self.neighbours(cur_pos, conn)
                                .into_iter()
                                .filter(|p| pred(self[*p]) && !set.contains(p)),
                        );
                    }
                    ans.push(this_area);
                }
                ans
            }
        }
    };
}

impl_mask_slice_immut!('a, MaskSlice<'a>, ArrayView2<'a, u8>);
impl_mask_slice_immut!('a, MaskSliceMut<'a>, ArrayViewMut2<'a, u8>);

/// 拥有所有权的二维水平肺掩膜切片.
///
/// `OwnedMaskSlice` 仅提供到 `MaskSlice` 和 `MaskSliceMut`
/// 的轻量转换和底层数据移动, 不提供任何其它方法.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedMaskSlice {
    data: Array2<u8>,
}

impl OwnedMaskSlice {
    /// 从二维数组直接创建.
    #[inline]
    pub fn from_raw(data: Array2<u8>) -> Self {
        Self { data }
    }

    /// 创建形状为 `(h, w)` 的全背景切片.
    #[inline]
    pub fn zeros(shape: Idx2d) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    /// 获得底层数据的不可变视图.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immut(&self) -> MaskSlice<'_> {
        MaskSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> MaskSliceMut<'_> {
        MaskSliceMut::new(self.data.view_mut())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<u8> {
        self.data
    }
}

/// 不可变、借用的二维水平 CT 扫描切片.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::CtScan`] 或 [`OwnedScanSlice`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> ScanSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, f32>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<f32> {
        self.data.view()
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, f32, Ix2> {
        self.data.iter()
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let &[h, w] = self.data.shape() else {
            unreachable!()
        };
        (h, w)
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, CT 值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
        self.data.indexed_iter()
    }
}

/// 拥有所有权的二维水平 CT 扫描切片.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OwnedScanSlice {
    data: Array2<f32>,
}

impl OwnedScanSlice {
    /// 从二维数组直接创建.
    #[inline]
    pub fn from_raw(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immutable(&self) -> ScanSlice<'_> {
        ScanSlice::new(self.data.view())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }
}
