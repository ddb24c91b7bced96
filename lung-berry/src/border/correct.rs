//! 边界修正决策.

use super::features::{single_lung_features, LungFeatures, PairFeatures};
use super::metrics::{as_f64, distance_metrics, euclidean, DistanceMetrics};
use super::{fill_poly, find_inflection_points, generate_point_pair, BorderSpec};
use crate::classify::{Classifier, ClassifyResult};
use crate::consts::gray::{is_background, is_foreground, LUNG_FOREGROUND};
use crate::eight::{approx_tc89_l1, external_contours, Contour};
use crate::{Idx2d, MaskSliceMut, OwnedMaskSlice};
use log::{debug, trace};
use ndarray::Zip;
use rand::Rng;

/// 一次 [`border_correct`] 调用的统计.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Corrected {
    /// 参与修正的区域 (外轮廓) 个数.
    pub regions: usize,

    /// 生成的候选点对个数.
    pub pairs: usize,

    /// 被闭合的点对个数.
    pub closed: usize,

    /// 分类器判为负类的点对个数.
    pub rejected: usize,

    /// 两点重合.
    pub skip_degenerate: usize,

    /// 点不在完整轮廓上.
    pub skip_missing: usize,

    /// 两点之间的轮廓段为空.
    pub skip_empty_arc: usize,

    /// 闭合区域不引入新像素.
    pub skip_no_new_area: usize,

    /// 轮廓段不长于直线距离.
    pub skip_straight: usize,

    /// 新增的前景像素个数.
    pub pixels_added: usize,
}

impl Corrected {
    /// 被跳过的点对总数.
    pub fn skipped(&self) -> usize {
        self.skip_degenerate
            + self.skip_missing
            + self.skip_empty_arc
            + self.skip_no_new_area
            + self.skip_straight
    }

    /// 合并另一份统计.
    pub fn merge(&mut self, other: &Corrected) {
        self.regions += other.regions;
        self.pairs += other.pairs;
        self.closed += other.closed;
        self.rejected += other.rejected;
        self.skip_degenerate += other.skip_degenerate;
        self.skip_missing += other.skip_missing;
        self.skip_empty_arc += other.skip_empty_arc;
        self.skip_no_new_area += other.skip_no_new_area;
        self.skip_straight += other.skip_straight;
        self.pixels_added += other.pixels_added;
    }
}

/// 单个点对的处理结果.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Closed(usize),
    Rejected,
    Degenerate,
    Missing,
    EmptyArc,
    NoNewArea,
    Straight,
}

impl Corrected {
    fn record(&mut self, outcome: Outcome) {
        self.pairs += 1;
        match outcome {
            Outcome::Closed(added) => {
                self.closed += 1;
                self.pixels_added += added;
            }
            Outcome::Rejected => self.rejected += 1,
            Outcome::Degenerate => self.skip_degenerate += 1,
            Outcome::Missing => self.skip_missing += 1,
            Outcome::EmptyArc => self.skip_empty_arc += 1,
            Outcome::NoNewArea => self.skip_no_new_area += 1,
            Outcome::Straight => self.skip_straight += 1,
        }
    }
}

/// 用分类器 `clf` 修正肺掩膜 `mask`, 就地修改.
///
/// 全背景的掩膜原样返回. 否则对每个外轮廓 (按区域顺序), 在其近似轮廓上寻找拐点,
/// 按拐点顺序逐个生成候选点对并评估. 后面的点对会看到前面点对闭合后的掩膜,
/// 因此评估顺序 (先区域, 后拐点索引) 不可改变.
///
/// 掩膜只会增加前景像素. 发生过闭合时, 整张掩膜被二值化为 `{0, 1}`;
/// 没有任何闭合时, 掩膜逐字节不变.
///
/// 分类器收到形状错误的输入时, 错误被直接向上传递, 此时掩膜可能已被部分修正.
pub fn border_correct<C, R>(
    mask: &mut MaskSliceMut,
    clf: &C,
    spec: &BorderSpec,
    rng: &mut R,
) -> ClassifyResult<Corrected>
where
    C: Classifier + ?Sized,
    R: Rng + ?Sized,
{
    if mask.is_background() {
        return Ok(Corrected::default());
    }
    let full = external_contours(&mask.shallow_copy());
    let smoothed: Vec<Contour> = full.iter().map(|c| approx_tc89_l1(c)).collect();
    let Some(metrics) = distance_metrics(&full) else {
        return Ok(Corrected::default());
    };

    let mut report = Corrected::default();
    for (region, (contour, approx)) in full.iter().zip(smoothed.iter()).enumerate() {
        report.regions += 1;
        let lung = single_lung_features(contour);
        let coords = find_inflection_points(approx);
        trace!(
            "region {region}: {} border points, {} inflection points",
            lung.boundary_length,
            coords.len()
        );
        for index in 0..coords.len() {
            let (p1, p2) = generate_point_pair(&coords, index, spec, rng);
            let outcome = evaluate_pair(mask, clf, &lung, &metrics, p1, p2)?;
            trace!("pair {p1:?} -> {p2:?}: {outcome:?}");
            report.record(outcome);
        }
    }
    debug!(
        "border correction: {} regions, {} pairs, {} closed, {} rejected, {} skipped, +{} pixels",
        report.regions,
        report.pairs,
        report.closed,
        report.rejected,
        report.skipped(),
        report.pixels_added
    );
    Ok(report)
}

/// 评估一个候选点对, 必要时闭合.
fn evaluate_pair<C: Classifier + ?Sized>(
    mask: &mut MaskSliceMut,
    clf: &C,
    lung: &LungFeatures,
    metrics: &DistanceMetrics,
    p1: Idx2d,
    p2: Idx2d,
) -> ClassifyResult<Outcome> {
    let euc_dist = euclidean(as_f64(p1), as_f64(p2));
    if euc_dist == 0.0 {
        return Ok(Outcome::Degenerate);
    }
    let (Some(i1), Some(i2)) = (lung.keys.get(p1), lung.keys.get(p2)) else {
        return Ok(Outcome::Missing);
    };
    let arc = lung.shorter_arc(i1, i2);
    if arc.is_empty() {
        return Ok(Outcome::EmptyArc);
    }
    let closure = fill_poly(mask.shape(), &arc);
    if covers_everything(mask, &closure) {
        return Ok(Outcome::NoNewArea);
    }

    let n = lung.boundary_length;
    let mut seg_length = i1.abs_diff(i2);
    if seg_length > n {
        seg_length = n.abs_diff(seg_length);
    }
    let seg_length = seg_length as f64;
    if seg_length <= euc_dist {
        return Ok(Outcome::Straight);
    }

    let mid = ((p1.0 + p2.0) as f64 / 2.0, (p1.1 + p2.1) as f64 / 2.0);
    let features = PairFeatures {
        f_con: seg_length / euc_dist,
        f_len: seg_length / n as f64,
        f_pos: euclidean(mid, metrics.centroid) / metrics.avg_dist,
    };
    trace!("features {features:?}");
    if !clf.predict(&features.as_array())?.is_positive() {
        return Ok(Outcome::Rejected);
    }
    Ok(Outcome::Closed(merge(mask, &closure)))
}

/// `closure AND mask` 是否在整张图上处处非零.
fn covers_everything(mask: &MaskSliceMut, closure: &OwnedMaskSlice) -> bool {
    closure
        .view()
        .iter()
        .zip(mask.iter())
        .all(|(&c, &m)| is_foreground(c) && is_foreground(m))
}

/// `mask = (mask OR closure) > 0`. 返回新增的前景像素个数.
fn merge(mask: &mut MaskSliceMut, closure: &OwnedMaskSlice) -> usize {
    let mut added = 0;
    Zip::from(mask.array_view_mut())
        .and(closure.view())
        .for_each(|m, &c| {
            if is_background(*m) && is_foreground(c) {
                *m = LUNG_FOREGROUND;
                added += 1;
            }
        });
    mask.binarize();
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::border::PointIndex;
    use crate::classify::{ClassifyError, Constant, FnClassifier, Label};
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;

    /// 半径 20 的圆盘, 右侧挖掉一条宽 15 的槽.
    fn notched_disk() -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(Array2::from_shape_fn((60, 60), |(h, w)| {
            let (dh, dw) = (h as i64 - 30, w as i64 - 30);
            (dh * dh + dw * dw <= 400 && !(dw > 0 && dh.abs() < 8)) as u8
        }))
    }

    /// 直角 "C" 形. 近似轮廓只剩 8 个角点, 其中只有一个拐点.
    fn square_c() -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(Array2::from_shape_fn((40, 40), |(h, w)| {
            let ring = (8..=31).contains(&h) && (8..=31).contains(&w);
            let notch = (16..=23).contains(&h) && (18..=31).contains(&w);
            (ring && !notch) as u8
        }))
    }

    fn run<C: Classifier>(owned: &mut OwnedMaskSlice, clf: &C, seed: u64) -> ClassifyResult<Corrected> {
        let mut rng = StdRng::seed_from_u64(seed);
        border_correct(&mut owned.as_mutable(), clf, &BorderSpec::default(), &mut rng)
    }

    #[test]
    fn test_background_identity() {
        let mut owned = OwnedMaskSlice::zeros((16, 16));
        let report = run(&mut owned, &Constant(Label::Positive), 0).unwrap();
        assert_eq!(report, Corrected::default());
        assert_eq!(owned, OwnedMaskSlice::zeros((16, 16)));
    }

    #[test]
    fn test_negative_keeps_bytes() {
        // 非 0/1 的前景值也不能被改写.
        let mut owned = OwnedMaskSlice::from_raw(notched_disk().into_raw() * 255);
        let before = owned.clone();
        let report = run(&mut owned, &Constant(Label::Negative), 1).unwrap();
        assert_eq!(owned, before);
        assert_eq!(report.closed, 0);
        assert!(report.rejected > 0);
        assert_eq!(report.pairs, report.rejected + report.skipped());
    }

    #[test]
    fn test_positive_fills_concavity() {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Trace)
            .init();
        let mut owned = notched_disk();
        let before = owned.as_immut().count_foreground();
        let report = run(&mut owned, &Constant(Label::Positive), 1).unwrap();
        let after = owned.as_immut().count_foreground();
        assert!(report.closed > 0);
        assert!(after > before);
        assert_eq!(after - before, report.pixels_added);
        // 凹陷内部被填上.
        assert!(owned.as_immut().is_foreground_at((30, 33)));
        assert!(owned.as_immut().iter().all(|&v| v <= 1));
    }

    #[test]
    fn test_features_seen_by_classifier() {
        let seen = RefCell::new(vec![]);
        let clf = FnClassifier::new(|f: &[f64]| {
            seen.borrow_mut().push([f[0], f[1], f[2]]);
            Label::Negative
        });
        let mut owned = notched_disk();
        run(&mut owned, &clf, 5).unwrap();
        let seen = seen.into_inner();
        assert!(!seen.is_empty());
        for [f_con, f_len, f_pos] in seen {
            assert!(f_con > 1.0);
            assert!(f_len > 0.0 && f_len < 1.0);
            assert!(f_pos >= 0.0);
        }
    }

    #[test]
    fn test_monotone_and_deterministic() {
        let mut owned = notched_disk();
        let clf = FnClassifier::new(|f: &[f64]| Label::from(f[0] > 1.5));
        let report = run(&mut owned, &clf, 9).unwrap();
        assert_eq!(report.pairs, report.closed + report.rejected + report.skipped());

        let mut again = notched_disk();
        let report2 = run(&mut again, &clf, 9).unwrap();
        assert_eq!(owned, again);
        assert_eq!(report, report2);
        assert!(owned.as_immut().count_foreground() >= notched_disk().as_immut().count_foreground());
    }

    #[test]
    fn test_degenerate_pair_skipped() {
        // 唯一的拐点与自己组成点对.
        let mut owned = square_c();
        let before = owned.clone();
        let report = run(&mut owned, &Constant(Label::Positive), 0).unwrap();
        assert_eq!(owned, before);
        assert_eq!(report.pairs, 1);
        assert_eq!(report.skip_degenerate, 1);
    }

    #[test]
    fn test_straight_pair_skipped() {
        let mut owned = OwnedMaskSlice::zeros((5, 5));
        owned.as_mutable().fill_batch([(2, 1), (2, 2), (2, 3)], 1);
        let before = owned.clone();
        let report = run(&mut owned, &Constant(Label::Positive), 0).unwrap();
        assert_eq!(owned, before);
        assert_eq!(report.pairs, 2);
        assert_eq!(report.skip_straight, 2);
    }

    #[test]
    fn test_bad_classifier_is_fatal() {
        struct Wrong;
        impl Classifier for Wrong {
            fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
                Err(ClassifyError::FeatureShape {
                    expected: 4,
                    found: features.len(),
                })
            }
        }
        let mut owned = notched_disk();
        assert_eq!(
            run(&mut owned, &Wrong, 1),
            Err(ClassifyError::FeatureShape {
                expected: 4,
                found: 3
            })
        );
    }

    fn full(shape: Idx2d) -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(Array2::ones(shape))
    }

    #[test]
    fn test_covers_everything() {
        let mut owned = full((3, 3));
        assert!(covers_everything(&owned.as_mutable(), &full((3, 3))));

        // 闭合区域只覆盖一部分, 不能跳过.
        let partial = fill_poly((3, 3), &[(1, 0), (1, 2)]);
        assert!(!covers_everything(&owned.as_mutable(), &partial));

        // 闭合区域覆盖全图, 但掩膜本身有洞.
        owned.as_mutable()[(2, 2)] = 0;
        assert!(!covers_everything(&owned.as_mutable(), &full((3, 3))));
    }

    /// 直接对 `contour` 描述的区域评估点对 `(p1, p2)`.
    fn evaluate(owned: &mut OwnedMaskSlice, lung: &LungFeatures, p1: Idx2d, p2: Idx2d) -> Outcome {
        let metrics = distance_metrics(&[lung.points.clone()]).unwrap();
        let clf = Constant(Label::Positive);
        evaluate_pair(&mut owned.as_mutable(), &clf, lung, &metrics, p1, p2).unwrap()
    }

    #[test]
    fn test_no_new_area_skipped() {
        // 1x2 的全前景图, 两点连线的闭合区域就是整张图.
        let mut owned = full((1, 2));
        let lung = single_lung_features(&[(0, 0), (0, 1)]);
        assert_eq!(evaluate(&mut owned, &lung, (0, 0), (0, 1)), Outcome::NoNewArea);
        assert_eq!(owned, full((1, 2)));
    }

    #[test]
    fn test_missing_point_skipped() {
        let mut owned = square_c();
        let contour = external_contours(&owned.as_immut()).remove(0);
        let lung = single_lung_features(&contour);
        assert_eq!(evaluate(&mut owned, &lung, contour[0], (20, 25)), Outcome::Missing);
        assert_eq!(evaluate(&mut owned, &lung, (0, 0), contour[3]), Outcome::Missing);
        assert_eq!(owned, square_c());
    }

    #[test]
    fn test_empty_arc_skipped() {
        // 索引与点列不一致时, 两点之间取不到轮廓段.
        let mut owned = full((3, 4));
        let lung = LungFeatures {
            points: vec![(1, 1), (1, 2)],
            keys: PointIndex::new(&[(1, 1), (1, 2), (1, 3)]),
            boundary_length: 2,
        };
        assert_eq!(evaluate(&mut owned, &lung, (1, 1), (1, 3)), Outcome::EmptyArc);
    }

    #[test]
    fn test_skip_counters() {
        let mut report = Corrected::default();
        for outcome in [
            Outcome::Missing,
            Outcome::EmptyArc,
            Outcome::NoNewArea,
            Outcome::Closed(7),
            Outcome::Rejected,
        ] {
            report.record(outcome);
        }
        assert_eq!(report.pairs, 5);
        assert_eq!((report.skip_missing, report.skip_empty_arc, report.skip_no_new_area), (1, 1, 1));
        assert_eq!(report.skipped(), 3);
        assert_eq!((report.closed, report.rejected, report.pixels_added), (1, 1, 7));
    }

    #[test]
    fn test_merge_binarizes() {
        let mut owned = OwnedMaskSlice::from_raw(ndarray::array![[0, 255], [0, 0]]);
        let closure = fill_poly((2, 2), &[(0, 0), (0, 1)]);
        assert_eq!(merge(&mut owned.as_mutable(), &closure), 1);
        assert_eq!(owned.into_raw(), ndarray::array![[1, 1], [0, 0]]);
    }
}
