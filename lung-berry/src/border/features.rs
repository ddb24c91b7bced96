//! 单肺轮廓特征和点对特征.

use crate::Idx2d;
use std::collections::HashMap;

/// 坐标到其 **第一次** 出现位置的映射.
///
/// 轮廓在自接触处可能经过同一个像素两次, 此时只记录较早的一次.
#[derive(Debug, Clone, Default)]
pub struct PointIndex {
    map: HashMap<Idx2d, usize>,
}

impl PointIndex {
    /// 按顺序为 `points` 建立索引.
    pub fn new(points: &[Idx2d]) -> Self {
        let mut map = HashMap::with_capacity(points.len());
        for (i, &p) in points.iter().enumerate() {
            map.entry(p).or_insert(i);
        }
        Self { map }
    }

    /// 查找 `p` 第一次出现的位置.
    #[inline]
    pub fn get(&self, p: Idx2d) -> Option<usize> {
        self.map.get(&p).copied()
    }

    /// 不同坐标的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// 单个肺区域的完整轮廓信息.
#[derive(Debug, Clone)]
pub struct LungFeatures {
    /// 按遍历顺序排列的轮廓点.
    pub points: Vec<Idx2d>,

    /// 坐标到位置的索引.
    pub keys: PointIndex,

    /// 边界长度, 即轮廓点个数.
    pub boundary_length: usize,
}

impl LungFeatures {
    /// 轮廓上位于 `i1` 和 `i2` (含两端) 之间的较短一段.
    ///
    /// 先取正向的 `points[lo..=hi]`; 若其长度超过边界长度的一半,
    /// 改取绕过起点的另一段 `points[hi..] ++ points[..=lo]`.
    pub fn shorter_arc(&self, i1: usize, i2: usize) -> Vec<Idx2d> {
        let (lo, hi) = (i1.min(i2), i1.max(i2));
        let Some(forward) = self.points.get(lo..=hi) else {
            return vec![];
        };
        if forward.len() * 2 <= self.boundary_length {
            return forward.to_vec();
        }
        let mut arc = Vec::with_capacity(self.boundary_length - forward.len() + 2);
        arc.extend_from_slice(&self.points[hi..]);
        arc.extend_from_slice(&self.points[..=lo]);
        arc
    }
}

/// 提取单个肺区域完整轮廓 `contour` 的点列、索引和边界长度.
pub fn single_lung_features(contour: &[Idx2d]) -> LungFeatures {
    LungFeatures {
        points: contour.to_vec(),
        keys: PointIndex::new(contour),
        boundary_length: contour.len(),
    }
}

/// 一个候选点对的三个特征.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairFeatures {
    /// 凹度: 两点间轮廓长度与直线距离之比. 进入分类器时总是大于 1.
    pub f_con: f64,

    /// 两点间轮廓长度占整条边界的比例.
    pub f_len: f64,

    /// 两点中点到质心的距离, 以平均距离归一化.
    pub f_pos: f64,
}

impl PairFeatures {
    /// 分类器输入顺序: `[f_con, f_len, f_pos]`.
    #[inline]
    pub fn as_array(&self) -> [f64; 3] {
        [self.f_con, self.f_len, self.f_pos]
    }
}
