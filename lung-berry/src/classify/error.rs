//! 分类器相关错误.

use std::fmt;

/// 分类时的错误. 一旦出现, 说明调用方违反了分类器的输入约定.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// 特征向量长度错误.
    FeatureShape {
        /// 分类器需要的特征个数.
        expected: usize,

        /// 实际收到的特征个数.
        found: usize,
    },
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureShape { expected, found } => {
                write!(f, "expected {expected} features, found {found}")
            }
        }
    }
}

impl std::error::Error for ClassifyError {}

/// 读取或校验预训练模型时的错误.
#[derive(Debug)]
pub enum ModelError {
    /// 支持向量、系数等的形状互相矛盾.
    Inconsistent(String),

    /// 模型文件解码错误.
    #[cfg(feature = "serde")]
    Decode(bincode::Error),

    /// 其他底层 I/O 错误.
    IoError(std::io::Error),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inconsistent(msg) => write!(f, "inconsistent model: {msg}"),
            #[cfg(feature = "serde")]
            Self::Decode(e) => write!(f, "cannot decode model: {e}"),
            Self::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "serde")]
            Self::Decode(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::Inconsistent(_) => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

#[cfg(feature = "serde")]
impl From<bincode::Error> for ModelError {
    fn from(e: bincode::Error) -> Self {
        Self::Decode(e)
    }
}
