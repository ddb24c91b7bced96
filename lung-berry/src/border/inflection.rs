//! 拐点检测.

use crate::Idx2d;

/// 一维离散梯度: 内部用中心差分, 两端用单侧差分. 长度小于 2 时返回空.
fn gradient(v: &[f64]) -> Vec<f64> {
    let n = v.len();
    if n < 2 {
        return vec![];
    }
    let mut g = Vec::with_capacity(n);
    g.push(v[1] - v[0]);
    g.extend(v.windows(3).map(|w| (w[2] - w[0]) / 2.0));
    g.push(v[n - 1] - v[n - 2]);
    g
}

/// 在近似后的轮廓 `contour` 上寻找拐点.
///
/// 分别对两个坐标序列求两次离散梯度, 任意一个坐标的二阶差分 **严格等于** `0.0`
/// 的点都会被保留. 输出保持轮廓的遍历顺序, 可能为空, 也可能包含全部点.
pub fn find_inflection_points(contour: &[Idx2d]) -> Vec<Idx2d> {
    if contour.len() < 2 {
        return vec![];
    }
    let hs: Vec<f64> = contour.iter().map(|p| p.0 as f64).collect();
    let ws: Vec<f64> = contour.iter().map(|p| p.1 as f64).collect();
    let d2_h = gradient(&gradient(&hs));
    let d2_w = gradient(&gradient(&ws));

    contour
        .iter()
        .enumerate()
        .filter(|&(i, _)| d2_h[i] == 0.0 || d2_w[i] == 0.0)
        .map(|(_, &p)| p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient() {
        assert_eq!(gradient(&[1.0, 2.0, 4.0, 7.0]), vec![1.0, 1.5, 2.5, 3.0]);
        assert_eq!(gradient(&[3.0, 5.0]), vec![2.0, 2.0]);
        assert!(gradient(&[3.0]).is_empty());
    }

    #[test]
    fn test_collinear() {
        let line = [(0, 0), (1, 0), (2, 0), (3, 0)];
        assert_eq!(find_inflection_points(&line), line.to_vec());
    }

    #[test]
    fn test_degenerate() {
        assert!(find_inflection_points(&[]).is_empty());
        assert!(find_inflection_points(&[(3, 3)]).is_empty());
    }

    #[test]
    fn test_curved() {
        // 二阶差分为 [1, 1.5, 2, 1.5, 1], 处处非零.
        let parabola = [(0, 0), (1, 1), (4, 4), (9, 9), (16, 16)];
        assert!(find_inflection_points(&parabola).is_empty());

        // w 是等差数列, 所有点都会被保留.
        let parabola = [(0, 0), (1, 1), (4, 2), (9, 3), (16, 4)];
        assert_eq!(find_inflection_points(&parabola).len(), 5);
    }
}
