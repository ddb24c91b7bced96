//! 逐切片肺分割.
//!
//! 肺在 CT 中比周围组织暗得多, 因此先用 Otsu 阈值取出暗区, 再去掉体外空气
//! (与图像边缘相连) 和小的暗区, 最后用开运算和空洞填充整理形状.
//!
//! 截断发生在存储值的 0 处 (而不是 0 HU), 这样空气、肺和脂肪在求阈值时仍然可分.

mod morph;
mod otsu;

pub use morph::{clear_border, dilate, disk, erode, fill_holes, keep_largest, StructElem, DISK};
pub use otsu::otsu_threshold;

use crate::consts::gray::{LUNG_BACKGROUND, LUNG_FOREGROUND};
use crate::consts::segment::{KEEP_AREAS, OTSU_BINS, STORED_ZERO_HU};
use crate::{OwnedMaskSlice, ScanSlice};
use log::trace;

/// 从一张 CT 切片中分割出肺, 输出值为 `{0, 1}` 的掩膜.
///
/// 假定存储值 0 对应 [`STORED_ZERO_HU`]. 其他 `RescaleIntercept` 请使用
/// [`segment_lungs_with_floor`].
#[inline]
pub fn segment_lungs(scan: &ScanSlice) -> OwnedMaskSlice {
    segment_lungs_with_floor(scan, STORED_ZERO_HU)
}

/// 从一张 CT 切片中分割出肺. 低于 `floor` (HU) 的值先被截断为 `floor`.
pub fn segment_lungs_with_floor(scan: &ScanSlice, floor: f32) -> OwnedMaskSlice {
    let clipped = scan.data().mapv(|v| if v < floor { floor } else { v });
    let Some(threshold) = otsu_threshold(clipped.iter().copied(), OTSU_BINS) else {
        return OwnedMaskSlice::zeros(scan.shape());
    };
    trace!("otsu threshold {threshold}");

    // 暗区为前景.
    let mut mask = OwnedMaskSlice::from_raw(clipped.mapv(|v| {
        if v <= threshold {
            LUNG_FOREGROUND
        } else {
            LUNG_BACKGROUND
        }
    }));
    clear_border(&mut mask);
    keep_largest(&mut mask, KEEP_AREAS);
    if !morph::any_foreground(&mask.as_immut()) {
        return mask;
    }

    let eroded = erode(&mask.as_immut(), &DISK);
    let mut mask = dilate(&eroded.as_immut(), &DISK);
    fill_holes(&mut mask);
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedScanSlice;
    use ndarray::Array2;

    /// 暗色空气包围的亮色躯干, 躯干中有两个暗色的肺.
    fn phantom() -> OwnedScanSlice {
        OwnedScanSlice::from_raw(Array2::from_shape_fn((64, 64), |(h, w)| {
            let (h, w) = (h as i64, w as i64);
            let body = (h - 32).pow(2) * 4 + (w - 32).pow(2) <= 28 * 28 * 2;
            let left = (h - 32).pow(2) + (w - 20).pow(2) <= 64;
            let right = (h - 32).pow(2) + (w - 44).pow(2) <= 64;
            match (body, left || right) {
                (true, true) => -800.0,
                (true, false) => 40.0,
                (false, _) => -1000.0,
            }
        }))
    }

    #[test]
    fn test_phantom_two_lungs() {
        let scan = phantom();
        let mask = segment_lungs(&scan.as_immutable());
        let view = mask.as_immut();
        let areas = view.foreground_areas();
        assert_eq!(areas.len(), 2);
        assert!(view.is_foreground_at((32, 20)));
        assert!(view.is_foreground_at((32, 44)));
        assert!(!view.is_foreground_at((32, 32)));
        assert!(!view.is_foreground_at((2, 2)));
        assert!(view.iter().all(|&v| v <= 1));
    }

    #[test]
    fn test_uniform_slice() {
        let scan = OwnedScanSlice::from_raw(Array2::from_elem((16, 16), 100.0));
        let mask = segment_lungs(&scan.as_immutable());
        assert!(mask.as_immut().is_background());
    }

    /// 躯干中有两个肺和一块脂肪. 脂肪 (-100 HU) 比肺亮得多, 但仍低于 0 HU.
    fn phantom_with_fat() -> OwnedScanSlice {
        OwnedScanSlice::from_raw(Array2::from_shape_fn((96, 96), |(h, w)| {
            let (h, w) = (h as f64, w as f64);
            let body = ((h - 48.0) / 36.0).powi(2) + ((w - 48.0) / 42.0).powi(2) <= 1.0;
            let lung = (h - 40.0).powi(2) + (w - 30.0).powi(2) <= 64.0
                || (h - 40.0).powi(2) + (w - 66.0).powi(2) <= 64.0;
            let fat = (h - 66.0).powi(2) + (w - 48.0).powi(2) <= 144.0;
            match (body, lung, fat) {
                (false, _, _) => -1000.0,
                (true, true, _) => -800.0,
                (true, false, true) => -100.0,
                (true, false, false) => 40.0,
            }
        }))
    }

    #[test]
    fn test_fat_is_not_lung() {
        let scan = phantom_with_fat();
        let mask = segment_lungs(&scan.as_immutable());
        let view = mask.as_immut();
        assert_eq!(view.foreground_areas().len(), 2);
        assert!(view.is_foreground_at((40, 30)));
        assert!(view.is_foreground_at((40, 66)));
        assert!(!view.is_foreground_at((66, 48)));
        assert!(!view.is_foreground_at((48, 48)));
    }

    #[test]
    fn test_floor_at_zero_hu_merges_fat_with_air() {
        let scan = phantom_with_fat();
        let mask = segment_lungs_with_floor(&scan.as_immutable(), 0.0);
        let view = mask.as_immut();
        assert_eq!(view.foreground_areas().len(), 3);
        assert!(view.is_foreground_at((66, 48)));
    }
}
