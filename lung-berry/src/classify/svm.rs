//! 预训练的 RBF 核支持向量机.

use super::{check_shape, Classifier, ClassifyResult, Label, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

/// RBF 核 SVM 的推理部分.
///
/// 决策函数为 `Σ coef_i · exp(-gamma · |sv_i - x|²) + intercept`, 大于 0 时判为正类.
/// 训练不在本 crate 的范围内, 参数通常由外部工具导出.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RbfSvm {
    gamma: f64,
    support_vectors: Array2<f64>,
    dual_coef: Array1<f64>,
    intercept: f64,
}

impl RbfSvm {
    /// 由支持向量 `support_vectors` (每行一个), 对偶系数 `dual_coef`,
    /// 截距 `intercept` 和核参数 `gamma` 构建模型.
    pub fn new(
        gamma: f64,
        support_vectors: Array2<f64>,
        dual_coef: Array1<f64>,
        intercept: f64,
    ) -> Result<Self, ModelError> {
        let svm = Self {
            gamma,
            support_vectors,
            dual_coef,
            intercept,
        };
        svm.validate()?;
        Ok(svm)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let (n_sv, n_features) = self.support_vectors.dim();
        if n_sv == 0 || n_features == 0 {
            return Err(ModelError::Inconsistent("no support vector".to_string()));
        }
        if n_sv != self.dual_coef.len() {
            return Err(ModelError::Inconsistent(format!(
                "{n_sv} support vectors but {} coefficients",
                self.dual_coef.len()
            )));
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(ModelError::Inconsistent(format!("gamma = {}", self.gamma)));
        }
        Ok(())
    }

    /// 特征个数.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    /// 支持向量个数.
    #[inline]
    pub fn n_support(&self) -> usize {
        self.support_vectors.nrows()
    }

    /// 决策函数值.
    pub fn decision_function(&self, features: &[f64]) -> ClassifyResult<f64> {
        check_shape(features, self.n_features())?;
        let x = ArrayView1::from(features);
        let sum = self
            .support_vectors
            .outer_iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, &coef)| {
                let d2 = sv
                    .iter()
                    .zip(x.iter())
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>();
                coef * (-self.gamma * d2).exp()
            })
            .sum::<f64>();
        Ok(sum + self.intercept)
    }

    /// 从 bincode 文件读取模型.
    #[cfg(feature = "serde")]
    pub fn from_file<P: AsRef<Path>>(p: P) -> Result<Self, ModelError> {
        let file = std::io::BufReader::new(std::fs::File::open(p)?);
        let svm: Self = bincode::deserialize_from(file)?;
        svm.validate()?;
        Ok(svm)
    }

    /// 以 bincode 格式保存模型.
    #[cfg(feature = "serde")]
    pub fn save<P: AsRef<Path>>(&self, p: P) -> Result<(), ModelError> {
        let file = std::io::BufWriter::new(std::fs::File::create(p)?);
        bincode::serialize_into(file, self)?;
        Ok(())
    }
}

impl Classifier for RbfSvm {
    fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
        Ok(Label::from(self.decision_function(features)? > 0.0))
    }
}
