//! 对 `lung-berry::dataset` 的更一层封装. 从环境变量或默认目录读取实验配置.

use lung_berry::classify::{ModelError, RbfSvm};
use lung_berry::dataset::home_dataset_dir_with;
use std::env;
use std::path::{Path, PathBuf};

/// 获取 DICOM 数据集基本路径.
///
/// 1. 若环境变量 `$LUNG_DICOM_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lung`.
pub fn dicom_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("LUNG_DICOM_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["lung"]),
    }
}

/// `dir` 下是否直接存在 `.dcm` 文件?
fn has_dcm(dir: &Path) -> bool {
    std::fs::read_dir(dir).map_or(false, |rd| {
        rd.filter_map(Result::ok)
            .any(|e| e.path().extension().map_or(false, |x| x == "dcm"))
    })
}

/// 列出 `root` 对应的所有 DICOM 序列目录.
///
/// 若 `root` 本身含有 `.dcm` 文件, 它就是唯一的序列;
/// 否则递归查找所有直接含有 `.dcm` 文件的子目录. 结果按路径排序.
pub fn series_dirs<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut ans = vec![];
    let mut stack = vec![root.as_ref().to_owned()];
    while let Some(dir) = stack.pop() {
        if has_dcm(&dir) {
            ans.push(dir);
            continue;
        }
        if let Ok(rd) = std::fs::read_dir(&dir) {
            stack.extend(rd.filter_map(Result::ok).map(|e| e.path()).filter(|p| p.is_dir()));
        }
    }
    ans.sort();
    ans
}

/// 从 `$LUNG_DICOM_DIR` 或者 `$HOME/dataset/lung` 下列出所有 DICOM 序列目录.
pub fn series_dirs_from_env_or_home() -> Vec<PathBuf> {
    dicom_dir_from_env_or_home().map_or_else(Vec::new, series_dirs)
}

/// 获取预训练 SVM 模型路径.
///
/// 1. 若环境变量 `$LUNG_SVM_MODEL` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/lung/svm.bin`.
pub fn svm_model_path() -> Option<PathBuf> {
    match env::var("LUNG_SVM_MODEL") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => home_dataset_dir_with(["lung", "svm.bin"]),
    }
}

/// 加载预训练 SVM 模型. 路径不存在时返回 `Ok(None)`.
pub fn svm_model_from_env_or_home() -> Result<Option<RbfSvm>, ModelError> {
    match svm_model_path() {
        Some(p) if p.is_file() => RbfSvm::from_file(p).map(Some),
        _ => Ok(None),
    }
}

/// 随机种子. 读取 `$LUNG_SEED`, 缺失或无法解析时为 0.
pub fn seed_from_env() -> u64 {
    env::var("LUNG_SEED")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// 输出目录 `$LUNG_OUTPUT`. 未设置时不写出任何文件.
pub fn output_dir_from_env() -> Option<PathBuf> {
    env::var("LUNG_OUTPUT")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}
