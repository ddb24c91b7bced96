//! 候选点对生成.

use super::BorderSpec;
use crate::Idx2d;
use rand::Rng;

/// 从拐点序列 `coords` 中, 以第 `index` 个拐点为首, 生成一个候选点对.
///
/// - 拐点少于 `spec.dense_threshold()` 个时, 第二个点取前一个拐点 (循环).
/// - 否则抽取一个非零随机偏移 `r`. 若 `index` 是最后一个索引,
///   第二个点固定取第一个拐点 (优先于偏移); 否则取 `index + r` 处的拐点,
///   超出末尾时减去序列长度, 小于 0 时从序列尾部倒数.
///
/// 随机性完全来自 `rng`. `index` 越界时程序 panic.
pub fn generate_point_pair<R: Rng + ?Sized>(
    coords: &[Idx2d],
    index: usize,
    spec: &BorderSpec,
    rng: &mut R,
) -> (Idx2d, Idx2d) {
    let len = coords.len();
    assert!(index < len);
    let p1 = coords[index];

    if len < spec.dense_threshold() {
        return (p1, coords[(index + len - 1) % len]);
    }

    let r = random_offset(spec.max_offset(), rng);
    if index == len - 1 {
        return (p1, coords[0]);
    }
    // `BorderSpec` 保证 |r| < len, 因此至多绕回一圈.
    let (len, j) = (len as isize, index as isize + r);
    let j = if j > len - 1 {
        j - len
    } else if j < 0 {
        j + len
    } else {
        j
    };
    (p1, coords[j as usize])
}

/// 从 `[-max, -1] ∪ [1, max]` 中均匀抽取一个偏移.
#[inline]
fn random_offset<R: Rng + ?Sized>(max: usize, rng: &mut R) -> isize {
    let max = max as isize;
    let k = rng.random_range(0..2 * max as i64) as isize;
    if k < max {
        k - max
    } else {
        k - max + 1
    }
}
