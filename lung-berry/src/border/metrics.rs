//! 全局距离度量.

use crate::eight::Contour;
use crate::{Idx2d, Idx2dF};

/// 一张切片上所有轮廓点相对于质心的距离统计.
///
/// 每张切片只计算一次, 在评估该切片的所有候选点对时保持不变.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceMetrics {
    /// 所有轮廓点 (两肺合并) 的坐标均值.
    pub centroid: Idx2dF,

    /// 轮廓点到质心的最大距离.
    pub max_dist: f64,

    /// 轮廓点到质心的平均距离.
    pub avg_dist: f64,
}

/// 两点之间的欧氏距离.
#[inline]
pub fn euclidean((h1, w1): Idx2dF, (h2, w2): Idx2dF) -> f64 {
    (h1 - h2).hypot(w1 - w2)
}

#[inline]
pub(crate) fn as_f64((h, w): Idx2d) -> Idx2dF {
    (h as f64, w as f64)
}

/// 把 `contours` 中的所有点合并为一个点集, 计算质心、最大距离和平均距离.
///
/// 所有轮廓都没有点时返回 `None`.
pub fn distance_metrics(contours: &[Contour]) -> Option<DistanceMetrics> {
    let n = contours.iter().map(Vec::len).sum::<usize>();
    if n == 0 {
        return None;
    }
    let points = || contours.iter().flatten().copied().map(as_f64);

    let (sum_h, sum_w) = points().fold((0.0, 0.0), |(sh, sw), (h, w)| (sh + h, sw + w));
    let centroid = (sum_h / n as f64, sum_w / n as f64);

    let (max_dist, total) = points()
        .map(|p| euclidean(p, centroid))
        .fold((0.0_f64, 0.0), |(mx, s), d| (mx.max(d), s + d));

    Some(DistanceMetrics {
        centroid,
        max_dist,
        avg_dist: total / n as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square() {
        let square = vec![(0, 0), (0, 4), (4, 4), (4, 0)];
        let m = distance_metrics(&[square]).unwrap();
        assert_eq!(m.centroid, (2.0, 2.0));
        assert!((m.max_dist - 8.0_f64.sqrt()).abs() < 1e-12);
        assert!((m.avg_dist - 8.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_two_regions_share_centroid() {
        let left = vec![(0, 0), (2, 0)];
        let right = vec![(0, 10), (2, 10)];
        let m = distance_metrics(&[left, right]).unwrap();
        assert_eq!(m.centroid, (1.0, 5.0));
        assert!((m.max_dist - 26.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty() {
        assert!(distance_metrics(&[]).is_none());
        assert!(distance_metrics(&[vec![]]).is_none());
    }
}
