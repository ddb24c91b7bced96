//! 边界修正参数.

use crate::consts::pair::{DENSE_THRESHOLD, MAX_OFFSET};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 候选点对生成规则.
///
/// 反序列化时同样会检查参数, 非法参数得到反序列化错误而不是 panic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawBorderSpec"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorderSpec {
    /// 拐点个数少于该值时, 第二个点固定取前一个拐点; 否则随机偏移.
    dense_threshold: usize,

    /// 随机偏移的最大绝对值. 偏移从 `[-max_offset, -1] ∪ [1, max_offset]` 中均匀抽取.
    max_offset: usize,
}

impl BorderSpec {
    /// 构建参数.
    ///
    /// 要求 `max_offset >= 1`, 且 `dense_threshold > max_offset`
    /// (保证随机偏移后的索引至多绕回一圈). 如果存在非法参数, 则程序 panic.
    pub fn new(dense_threshold: usize, max_offset: usize) -> Self {
        Self::assert_args(dense_threshold, max_offset);
        Self {
            dense_threshold,
            max_offset,
        }
    }

    /// 与 [`BorderSpec::new`] 相同, 但非法参数返回错误描述.
    pub fn try_new(dense_threshold: usize, max_offset: usize) -> Result<Self, String> {
        Self::check_args(dense_threshold, max_offset)?;
        Ok(Self {
            dense_threshold,
            max_offset,
        })
    }

    fn check_args(dense_threshold: usize, max_offset: usize) -> Result<(), String> {
        if max_offset == 0 {
            return Err("max_offset must be positive".to_string());
        }
        if dense_threshold <= max_offset {
            return Err(format!(
                "dense_threshold ({dense_threshold}) must exceed max_offset ({max_offset})"
            ));
        }
        Ok(())
    }

    #[inline]
    fn assert_args(dense_threshold: usize, max_offset: usize) {
        if let Err(msg) = Self::check_args(dense_threshold, max_offset) {
            panic!("{msg}");
        }
    }

    /// 稀疏 / 稠密拐点序列的分界.
    #[inline]
    pub fn dense_threshold(&self) -> usize {
        self.dense_threshold
    }

    /// 随机偏移的最大绝对值.
    #[inline]
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }
}

/// 未经检查的反序列化中间形式.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawBorderSpec {
    dense_threshold: usize,
    max_offset: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBorderSpec> for BorderSpec {
    type Error = String;

    fn try_from(raw: RawBorderSpec) -> Result<Self, Self::Error> {
        Self::try_new(raw.dense_threshold, raw.max_offset)
    }
}

impl Default for BorderSpec {
    fn default() -> Self {
        Self::new(DENSE_THRESHOLD, MAX_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let spec = BorderSpec::default();
        assert_eq!(spec.dense_threshold(), 20);
        assert_eq!(spec.max_offset(), 5);
    }

    #[test]
    #[should_panic]
    fn test_zero_offset() {
        let _ = BorderSpec::new(20, 0);
    }

    #[test]
    #[should_panic]
    fn test_threshold_too_small() {
        let _ = BorderSpec::new(5, 5);
    }

    #[test]
    fn test_try_new() {
        assert_eq!(BorderSpec::try_new(20, 5), Ok(BorderSpec::default()));
        assert!(BorderSpec::try_new(20, 0).is_err());
        assert!(BorderSpec::try_new(3, 3).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_checks_args() {
        let bytes = bincode::serialize(&BorderSpec::new(30, 4)).unwrap();
        assert_eq!(bincode::deserialize::<BorderSpec>(&bytes).unwrap(), BorderSpec::new(30, 4));

        // 字段按声明顺序编码, 与二元组的编码相同.
        let bytes = bincode::serialize(&(20usize, 0usize)).unwrap();
        assert!(bincode::deserialize::<BorderSpec>(&bytes).is_err());
        let bytes = bincode::serialize(&(5usize, 5usize)).unwrap();
        assert!(bincode::deserialize::<BorderSpec>(&bytes).is_err());
    }
}
