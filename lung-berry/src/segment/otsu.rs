//! Otsu 阈值.

use itertools::Itertools;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// 在 `bins` 个等宽桶的直方图上求 Otsu 阈值 (返回某个桶的中心).
///
/// 所有值相等时返回该值; 输入为空或全为非有限值时返回 `None`.
/// 非有限值不参与统计.
pub fn otsu_threshold<I: IntoIterator<Item = f32>>(values: I, bins: usize) -> Option<f32> {
    assert!(bins >= 2);
    let values: Vec<f64> = values
        .into_iter()
        .filter(|v| v.is_finite())
        .map(f64::from)
        .collect();
    let (OrderedFloat(lo), OrderedFloat(hi)) =
        values.iter().copied().map(OrderedFloat).minmax().into_option()?;
    if lo == hi {
        return Some(lo as f32);
    }

    let width = (hi - lo) / bins as f64;
    let mut hist = vec![0.0_f64; bins];
    for v in values.iter() {
        let i = (((v - lo) / width) as usize).min(bins - 1);
        hist[i] += 1.0;
    }
    let centers: Vec<f64> = (0..bins).map(|i| lo + width * (i as f64 + 0.5)).collect();

    // 前缀 (背景类) 和后缀 (前景类) 的权重与均值.
    let mut w1 = Vec::with_capacity(bins);
    let mut m1 = Vec::with_capacity(bins);
    let (mut w, mut s) = (0.0, 0.0);
    for (h, c) in hist.iter().zip(centers.iter()) {
        w += h;
        s += h * c;
        w1.push(w);
        m1.push(if w > 0.0 { s / w } else { 0.0 });
    }
    let mut w2 = vec![0.0; bins];
    let mut m2 = vec![0.0; bins];
    let (mut w, mut s) = (0.0, 0.0);
    for i in (0..bins).rev() {
        w += hist[i];
        s += hist[i] * centers[i];
        w2[i] = w;
        m2[i] = if w > 0.0 { s / w } else { 0.0 };
    }

    // 类间方差最大的第一个桶.
    let (best, _) = (0..bins - 1)
        .map(|i| (i, w1[i] * w2[i + 1] * (m1[i] - m2[i + 1]).powi(2)))
        .min_by_key(|&(_, var)| Reverse(OrderedFloat(var)))?;
    Some(centers[best] as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_levels() {
        let values = std::iter::repeat(10.0).take(50).chain(std::iter::repeat(200.0).take(50));
        let t = otsu_threshold(values, 256).unwrap();
        assert!((10.0..200.0).contains(&t));
    }

    #[test]
    fn test_constant_and_empty() {
        assert_eq!(otsu_threshold([3.0; 8], 256), Some(3.0));
        assert_eq!(otsu_threshold([], 256), None);
        assert_eq!(otsu_threshold([f32::NAN], 256), None);
    }

    #[test]
    fn test_separates_clusters() {
        let values = [0.0, 1.0, 2.0, 1.0, 100.0, 101.0, 99.0, 100.0];
        let t = otsu_threshold(values, 16).unwrap();
        assert!(t > 2.0 && t < 99.0);
    }
}
