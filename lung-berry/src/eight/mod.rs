//! 邻域相关的轮廓提取算法.

mod approx;
mod trace;

pub use approx::approx_tc89_l1;
pub use trace::{external_contours, trace_border};

use crate::Idx2d;

/// 首尾相连 (闭合) 的轮廓点序列, 按遍历顺序排列.
pub type Contour = Vec<Idx2d>;

/// 像素连通规则.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Connectivity {
    /// 4-邻接.
    Four,

    /// 8-邻接.
    Eight,
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(h, w)` 的 8-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour8((h, w): Idx2d) -> [Idx2d; 8] {
    [
        (h.wrapping_sub(1), w.wrapping_sub(1)),
        (h.wrapping_sub(1), w),
        (h.wrapping_sub(1), w.saturating_add(1)),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
        (h.saturating_add(1), w.wrapping_sub(1)),
        (h.saturating_add(1), w),
        (h.saturating_add(1), w.saturating_add(1)),
    ]
}

/// 链码方向, 按屏幕上的逆时针顺序排列: 东, 东北, 北, 西北, 西, 西南, 南, 东南.
/// 分量为 `(dh, dw)`, 高度方向向下增长.
pub(crate) const CHAIN: [(isize, isize); 8] = [
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// 从 `from` 指向 8-相邻的 `to` 的链码. 两点不相邻时返回 `None`.
#[inline]
pub(crate) fn chain_code(from: Idx2d, to: Idx2d) -> Option<usize> {
    let dh = to.0 as isize - from.0 as isize;
    let dw = to.1 as isize - from.1 as isize;
    CHAIN.iter().position(|&d| d == (dh, dw))
}
