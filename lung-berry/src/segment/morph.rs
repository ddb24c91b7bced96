//! 二维二值形态学.

use crate::consts::gray::{is_background, is_foreground, LUNG_BACKGROUND, LUNG_FOREGROUND};
use crate::consts::segment::DISK_RADIUS;
use crate::eight::Connectivity;
use crate::{MaskSlice, OwnedMaskSlice};
use once_cell::sync::Lazy;

/// 结构元, 以相对中心的偏移 `(dh, dw)` 表示.
pub type StructElem = [(isize, isize)];

/// 半径为 [`DISK_RADIUS`] 的圆盘结构元.
pub static DISK: Lazy<Vec<(isize, isize)>> = Lazy::new(|| disk(DISK_RADIUS));

/// 半径为 `r` 的圆盘: 所有满足 `dh² + dw² <= r²` 的偏移.
pub fn disk(r: usize) -> Vec<(isize, isize)> {
    let r = r as isize;
    (-r..=r)
        .flat_map(|dh| (-r..=r).map(move |dw| (dh, dw)))
        .filter(|(dh, dw)| dh * dh + dw * dw <= r * r)
        .collect()
}

#[inline]
fn shifted(mask: &MaskSlice, (h, w): (usize, usize), (dh, dw): (isize, isize)) -> Option<u8> {
    let pos = (h.checked_add_signed(dh)?, w.checked_add_signed(dw)?);
    mask.get(pos).copied()
}

/// 腐蚀. 图像之外视为前景.
pub fn erode(mask: &MaskSlice, se: &StructElem) -> OwnedMaskSlice {
    let mut ans = OwnedMaskSlice::zeros(mask.shape());
    let mut out = ans.as_mutable();
    for pos in mask.pos_iter() {
        let keep = is_foreground(mask[pos])
            && se
                .iter()
                .all(|&d| shifted(mask, pos, d).map_or(true, is_foreground));
        if keep {
            out[pos] = LUNG_FOREGROUND;
        }
    }
    ans
}

/// 膨胀. 图像之外视为背景.
pub fn dilate(mask: &MaskSlice, se: &StructElem) -> OwnedMaskSlice {
    let mut ans = OwnedMaskSlice::zeros(mask.shape());
    let mut out = ans.as_mutable();
    for pos in mask.pos_iter() {
        let hit = se
            .iter()
            .any(|&d| shifted(mask, pos, d).map_or(false, is_foreground));
        if hit {
            out[pos] = LUNG_FOREGROUND;
        }
    }
    ans
}

/// 删除所有与图像边缘 8-连通的前景区域.
pub fn clear_border(mask: &mut OwnedMaskSlice) {
    let view = mask.as_immut();
    let seeds = view.pos_iter().filter(|p| view.is_at_border(*p));
    let touching = view.areas_from_local(seeds, is_foreground, Connectivity::Eight);
    mask.as_mutable()
        .fill_batch(touching.into_iter().flatten(), LUNG_BACKGROUND);
}

/// 只保留最大的 `keep` 个 8-连通前景区域. 与第 `keep` 大区域面积相同的区域也会保留.
pub fn keep_largest(mask: &mut OwnedMaskSlice, keep: usize) {
    let areas = mask.as_immut().foreground_areas();
    if areas.len() <= keep {
        return;
    }
    let mut sizes: Vec<usize> = areas.iter().map(Vec::len).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    let min_size = if keep == 0 { usize::MAX } else { sizes[keep - 1] };
    let small = areas.into_iter().filter(|a| a.len() < min_size).flatten();
    mask.as_mutable().fill_batch(small, LUNG_BACKGROUND);
}

/// 填充空洞: 与图像边缘不 4-连通的背景区域.
pub fn fill_holes(mask: &mut OwnedMaskSlice) {
    let holes: Vec<_> = mask
        .as_immut()
        .background_areas()
        .into_iter()
        .filter(|area| {
            let view = mask.as_immut();
            !area.iter().any(|p| view.is_at_border(*p))
        })
        .flatten()
        .collect();
    mask.as_mutable().fill_batch(holes, LUNG_FOREGROUND);
}

/// 是否存在任何前景?
#[inline]
pub(crate) fn any_foreground(mask: &MaskSlice) -> bool {
    !mask.iter().copied().all(is_background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn mask_from(shape: (usize, usize), fg: impl Fn((usize, usize)) -> bool) -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(Array2::from_shape_fn(shape, |p| fg(p) as u8))
    }

    #[test]
    fn test_disk() {
        assert_eq!(disk(0), vec![(0, 0)]);
        assert_eq!(disk(1).len(), 5);
        assert_eq!(DISK.len(), 49);
    }

    #[test]
    fn test_opening_removes_thin_parts() {
        // 12x12 的方块加一条细尾巴.
        let owned = mask_from((30, 30), |(h, w)| {
            ((5..=16).contains(&h) && (5..=16).contains(&w)) || (h == 10 && (17..=25).contains(&w))
        });
        let eroded = erode(&owned.as_immut(), &DISK);
        assert!(any_foreground(&eroded.as_immut()));
        let opened = dilate(&eroded.as_immut(), &DISK);
        let view = opened.as_immut();
        assert!(!view.is_foreground_at((10, 22)));
        assert!(view.is_foreground_at((10, 10)));
        assert!(view.count_foreground() <= owned.as_immut().count_foreground());
    }

    #[test]
    fn test_clear_border_and_keep_largest() {
        let mut owned = mask_from((20, 20), |(h, w)| {
            (h == 0 && w < 5)
                || ((3..=6).contains(&h) && (3..=6).contains(&w))
                || ((3..=5).contains(&h) && (10..=12).contains(&w))
                || ((10..=11).contains(&h) && (10..=11).contains(&w))
        });
        clear_border(&mut owned);
        assert_eq!(owned.as_immut().count_foreground(), 16 + 9 + 4);
        keep_largest(&mut owned, 2);
        assert_eq!(owned.as_immut().count_foreground(), 16 + 9);
    }

    #[test]
    fn test_fill_holes() {
        let mut owned = mask_from((10, 10), |(h, w)| {
            (2..=6).contains(&h) && (2..=6).contains(&w) && (h, w) != (4, 4)
        });
        fill_holes(&mut owned);
        assert!(owned.as_immut().is_foreground_at((4, 4)));
        assert_eq!(owned.as_immut().count_foreground(), 25);
    }
}
