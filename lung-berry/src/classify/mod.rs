//! 候选点对分类器.
//!
//! 边界修正只依赖 [`Classifier::predict`] 一个接口, 与具体的训练方法无关.

mod error;
mod svm;

pub use error::{ClassifyError, ModelError};
pub use svm::RbfSvm;

/// 分类运行时错误.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// 边界修正使用的特征个数: `[f_con, f_len, f_pos]`.
pub const FEATURE_LEN: usize = 3;

/// 二分类标签.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// 0: 不闭合.
    Negative,

    /// 1: 闭合两点之间的凹陷.
    Positive,
}

impl Label {
    /// 是否为正类?
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Label::Positive)
    }
}

impl From<bool> for Label {
    #[inline]
    fn from(b: bool) -> Self {
        if b {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

impl From<Label> for bool {
    #[inline]
    fn from(l: Label) -> Self {
        l.is_positive()
    }
}

impl From<Label> for u8 {
    #[inline]
    fn from(l: Label) -> Self {
        l.is_positive() as u8
    }
}

impl TryFrom<u8> for Label {
    type Error = u8;

    /// 只接受 0 和 1.
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            _ => Err(v),
        }
    }
}

/// 预训练的二分类器.
pub trait Classifier {
    /// 对一个特征向量给出标签. 特征个数不符时返回错误.
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    #[inline]
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
        (**self).predict(features)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    #[inline]
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
        (**self).predict(features)
    }
}

/// 检查特征向量长度.
#[inline]
pub(crate) fn check_shape(features: &[f64], expected: usize) -> ClassifyResult<()> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(ClassifyError::FeatureShape {
            expected,
            found: features.len(),
        })
    }
}

/// 总是给出同一个标签.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub Label);

impl Classifier for Constant {
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
        check_shape(features, FEATURE_LEN)?;
        Ok(self.0)
    }
}

/// 用闭包实现的分类器. 闭包只会收到长度正确的特征向量.
pub struct FnClassifier<F> {
    f: F,
}

impl<F: Fn(&[f64]) -> Label> FnClassifier<F> {
    /// 包装闭包 `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn(&[f64]) -> Label> Classifier for FnClassifier<F> {
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
        check_shape(features, FEATURE_LEN)?;
        Ok((self.f)(features))
    }
}
