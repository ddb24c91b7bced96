//! Suzuki-Abe 外边界跟踪.
//!
//! 前景按 8-邻接, 背景按 4-邻接. 只输出最外层边界:
//! 位于其它前景区域空洞内部的区域不会被跟踪.

use super::{chain_code, Connectivity, Contour, CHAIN};
use crate::consts::gray::is_background;
use crate::{Idx2d, MaskSlice};
use std::collections::HashSet;

/// 获取 `mask` 中所有最外层区域的完整 (不做顶点近似) 轮廓.
///
/// 轮廓按其起点的行优先顺序排列. 每条轮廓都从区域最上方一行的最左像素出发,
/// 先沿左侧向下走. 孤立像素的轮廓只有一个点.
pub fn external_contours(mask: &MaskSlice) -> Vec<Contour> {
    let outer = outer_background(mask);
    mask.foreground_areas()
        .iter()
        .filter_map(|area| {
            // 区域的第一个像素就是最上方一行的最左像素.
            let &start = area.first()?;
            let above_is_outer = start.0 == 0 || outer.contains(&(start.0 - 1, start.1));
            above_is_outer.then(|| trace_border(mask, start))
        })
        .collect()
}

/// 从外边界起点 `start` 出发跟踪一条闭合边界.
///
/// `start` 必须是前景像素, 且其左侧像素为背景 (或越界), 否则结果无意义.
pub fn trace_border(mask: &MaskSlice, start: Idx2d) -> Contour {
    let fg = |p: Option<Idx2d>| matches!(p, Some(p) if mask.is_foreground_at(p));

    // 从左侧背景像素开始, 顺时针寻找第一个前景邻居.
    let Some(first) = (0..8)
        .map(|t| (4 + 8 - t) % 8)
        .map(|d| step(start, d))
        .find(|p| fg(*p))
        .flatten()
    else {
        return vec![start];
    };

    let mut contour = Contour::with_capacity(16);
    let (mut prev, mut cur) = (first, start);
    loop {
        // `prev` 一定是前景, 所以至多转一整圈就能找到下一个点.
        let back = chain_code(cur, prev).unwrap_or(4);
        let next = (1..=8)
            .map(|t| step(cur, (back + t) % 8))
            .find(|p| fg(*p))
            .flatten()
            .unwrap_or(prev);
        contour.push(cur);
        if next == start && cur == first {
            break;
        }
        prev = cur;
        cur = next;
    }
    contour
}

/// 沿链码 `dir` 走一步. 越出非负索引范围时返回 `None`.
#[inline]
fn step((h, w): Idx2d, dir: usize) -> Option<Idx2d> {
    let (dh, dw) = CHAIN[dir];
    Some((h.checked_add_signed(dh)?, w.checked_add_signed(dw)?))
}

/// 与图像外部 4-连通的全部背景像素.
fn outer_background(mask: &MaskSlice) -> HashSet<Idx2d> {
    let seeds = mask
        .pos_iter()
        .filter(|p| mask.is_at_border(*p) && is_background(mask[*p]));
    mask.areas_from_local(seeds, is_background, Connectivity::Four)
        .into_iter()
        .flatten()
        .collect()
}
