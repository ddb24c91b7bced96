//! 多边形光栅化.

use crate::consts::gray::LUNG_FOREGROUND;
use crate::{Idx2d, OwnedMaskSlice};

/// 在大小为 `shape` 的空白图上填充闭合多边形 `poly`, 前景值为 1.
///
/// 所有边 (包括首尾相连的闭合边) 都以 8-连通直线画出,
/// 内部按奇偶规则在像素中心做扫描线填充. 越界部分被裁掉.
pub fn fill_poly(shape: Idx2d, poly: &[Idx2d]) -> OwnedMaskSlice {
    let mut canvas = OwnedMaskSlice::zeros(shape);
    let Some(&last) = poly.last() else {
        return canvas;
    };
    let inside = |&(h, w): &Idx2d| h < shape.0 && w < shape.1;
    let mut view = canvas.as_mutable();
    let mut prev = last;
    for &p in poly {
        view.fill_batch(line(prev, p).into_iter().filter(inside), LUNG_FOREGROUND);
        prev = p;
    }
    for (h, w0, w1) in spans(poly, shape.0) {
        let w1 = w1.min(shape.1.saturating_sub(1));
        view.fill_batch((w0..=w1).map(|w| (h, w)), LUNG_FOREGROUND);
    }
    canvas
}

/// Bresenham 直线, 包含两个端点.
fn line(from: Idx2d, to: Idx2d) -> Vec<Idx2d> {
    let (mut h, mut w) = (from.0 as isize, from.1 as isize);
    let (h1, w1) = (to.0 as isize, to.1 as isize);
    let (dh, dw) = ((h1 - h).abs(), -(w1 - w).abs());
    let (sh, sw) = ((h1 - h).signum(), (w1 - w).signum());
    let mut err = dh + dw;
    let mut ans = Vec::with_capacity((dh - dw) as usize + 1);
    loop {
        ans.push((h as usize, w as usize));
        if (h, w) == (h1, w1) {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dw {
            err += dw;
            h += sh;
        }
        if e2 <= dh {
            err += dh;
            w += sw;
        }
    }
    ans
}

/// 扫描线与多边形内部的交集 `(行, 起始列, 结束列)`.
/// 每条边按左闭右开的行区间参与求交, 保证顶点不被重复计数.
fn spans(poly: &[Idx2d], height: usize) -> Vec<(usize, usize, usize)> {
    let pts: Vec<(f64, f64)> = poly.iter().map(|&(h, w)| (h as f64, w as f64)).collect();
    let h_min = poly.iter().map(|p| p.0).min().unwrap_or(0);
    let h_max = poly.iter().map(|p| p.0).max().unwrap_or(0).min(height.saturating_sub(1));

    let mut ans = vec![];
    let mut xs = Vec::with_capacity(8);
    for h in h_min..=h_max {
        let y = h as f64;
        xs.clear();
        for (i, &(ha, wa)) in pts.iter().enumerate() {
            let (hb, wb) = pts[(i + 1) % pts.len()];
            if ha == hb || y < ha.min(hb) || y >= ha.max(hb) {
                continue;
            }
            xs.push(wa + (y - ha) * (wb - wa) / (hb - ha));
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let (l, r) = (pair[0].ceil(), pair[1].floor());
            if l <= r && r >= 0.0 {
                ans.push((h, l.max(0.0) as usize, r as usize));
            }
        }
    }
    ans
}
