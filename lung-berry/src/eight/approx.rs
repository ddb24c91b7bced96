//! Teh-Chin 主导点检测 (L1 曲率版本).
//!
//! 输入是一条完整的闭合 8-链码轮廓, 输出是其中的主导点,
//! 保持在原轮廓中的相对顺序.

use super::Contour;
use crate::Idx2d;

type Pt = (i64, i64);

/// 对闭合轮廓 `contour` 做 Teh-Chin L1 近似, 返回保留下来的主导点.
///
/// 输出一定是输入的子序列. 少于 3 个点的轮廓原样返回.
pub fn approx_tc89_l1(contour: &[Idx2d]) -> Contour {
    let len = contour.len();
    if len < 3 {
        return contour.to_vec();
    }
    let pts: Vec<Pt> = contour
        .iter()
        .map(|&(h, w)| (h as i64, w as i64))
        .collect();
    let ring = Ring { pts: &pts };

    // 链码方向不变的点不可能是主导点.
    let mut alive: Vec<bool> = (0..len as isize)
        .map(|i| {
            let (a, b, c) = (ring.at(i - 1), ring.at(i), ring.at(i + 1));
            (b.0 - a.0, b.1 - a.1) != (c.0 - b.0, c.1 - b.1)
        })
        .collect();
    if !alive.iter().any(|&x| x) {
        return contour.to_vec();
    }

    let mut support = vec![0_usize; len];
    let mut curvature = vec![0_i64; len];
    for i in (0..len).filter(|&i| alive[i]) {
        support[i] = ring.support_region(i);
        curvature[i] = ring.l1_curvature(i, support[i]);
    }

    // 非极大值抑制.
    for i in 0..len {
        if !alive[i] {
            continue;
        }
        let half = (support[i] / 2) as isize;
        let s = curvature[i];
        let dominated = (1..=half).any(|j| {
            curvature[ring.wrap(i as isize - j)] > s || curvature[ring.wrap(i as isize + j)] > s
        });
        if dominated {
            alive[i] = false;
            curvature[i] = 0;
        }
    }

    // 相邻的两个主导点只保留曲率更大的一个.
    for i in 0..len {
        let j = (i + 1) % len;
        if !alive[i] || !alive[j] || i == j {
            continue;
        }
        if curvature[j] > curvature[i] {
            alive[i] = false;
        } else {
            alive[j] = false;
        }
    }

    contour
        .iter()
        .zip(alive)
        .filter_map(|(p, keep)| keep.then_some(*p))
        .collect()
}

/// 首尾相连的点列.
struct Ring<'a> {
    pts: &'a [Pt],
}

impl Ring<'_> {
    #[inline]
    fn wrap(&self, i: isize) -> usize {
        i.rem_euclid(self.pts.len() as isize) as usize
    }

    #[inline]
    fn at(&self, i: isize) -> Pt {
        self.pts[self.wrap(i)]
    }

    /// 点 `i` 的支撑域半径: 弦长不再增长, 或者点到弦的相对距离不再单调时停止.
    fn support_region(&self, i: usize) -> usize {
        let max_k = (self.pts.len() - 1) / 2;
        let center = self.pts[i];
        let (mut last_len, mut last_dist) = (0_i64, 0_i64);
        let mut k = 1;
        while k <= max_k {
            let a = self.at(i as isize - k as isize);
            let b = self.at(i as isize + k as isize);
            let (dh, dw) = (b.0 - a.0, b.1 - a.1);
            let chord = dh * dh + dw * dw;
            let dist = (center.0 - a.0) * dw - (center.1 - a.1) * dh;
            if k > 1 {
                let cross = last_dist * chord - dist * last_len;
                if last_len >= chord
                    || (last_dist > 0 && cross <= 0)
                    || (last_dist < 0 && cross >= 0)
                {
                    break;
                }
            }
            last_len = chord;
            last_dist = dist;
            k += 1;
        }
        (k - 1).max(1)
    }

    /// 半径为 `k` 时的 L1 离散曲率.
    fn l1_curvature(&self, i: usize, k: usize) -> i64 {
        let a = self.at(i as isize - k as isize);
        let b = self.at(i as isize + k as isize);
        let c = self.pts[i];
        (a.0 + b.0 - 2 * c.0).abs() + (a.1 + b.1 - 2 * c.1).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eight::external_contours;
    use crate::OwnedMaskSlice;
    use ndarray::Array2;

    #[test]
    fn test_short_contour_unchanged() {
        assert!(approx_tc89_l1(&[]).is_empty());
        assert_eq!(approx_tc89_l1(&[(1, 1)]), vec![(1, 1)]);
        assert_eq!(approx_tc89_l1(&[(1, 1), (1, 2)]), vec![(1, 1), (1, 2)]);
    }

    #[test]
    fn test_subsequence() {
        let owned = OwnedMaskSlice::from_raw(Array2::from_shape_fn((40, 40), |(h, w)| {
            let (dh, dw) = (h as i64 - 20, w as i64 - 20);
            (dh * dh + dw * dw <= 150 && !(dw > 4 && dh.abs() < 5)) as u8
        }));
        let contours = external_contours(&owned.as_immut());
        assert_eq!(contours.len(), 1);
        let full = &contours[0];
        let approx = approx_tc89_l1(full);
        assert!(!approx.is_empty());
        assert!(approx.len() < full.len());

        let mut cursor = full.iter();
        for p in approx.iter() {
            assert!(cursor.any(|q| q == p), "{p:?} out of order");
        }
    }

    #[test]
    fn test_rectangle_corners_survive() {
        let owned = OwnedMaskSlice::from_raw(Array2::from_shape_fn((20, 30), |(h, w)| {
            ((3..=14).contains(&h) && (4..=24).contains(&w)) as u8
        }));
        let contours = external_contours(&owned.as_immut());
        let approx = approx_tc89_l1(&contours[0]);
        // 直边中段不会被保留.
        assert!(!approx.contains(&(8, 4)));
        assert!(!approx.contains(&(3, 14)));
        assert!(approx.iter().all(|p| [(3, 4), (14, 4), (14, 24), (3, 24)].contains(p)));
    }
}
