//! 程序运行函数.

use crate::profile::Profile;
use crate::result::AblationResult;
use log::{error, info, warn};
use lung_berry::prelude::*;
use std::path::{Path, PathBuf};
use std::thread;
use utils::loader;

type BoxedClassifier = Box<dyn Classifier + Sync + Send>;

/// 一个已经完成分割、等待修正的序列.
struct Series {
    name: String,
    mask: LungMask,
}

/// 读取并分割 `dirs` 中的所有序列. 读取失败的序列会被跳过.
fn load_all(dirs: &[PathBuf]) -> Vec<Series> {
    dirs.iter()
        .filter_map(|dir| {
            let name = dir
                .file_name()
                .map_or_else(|| "series".to_string(), |s| s.to_string_lossy().into_owned());
            match read_dicom_directory(dir) {
                Ok(series) => {
                    info!("Segmenting `{name}` ({} slices)...", series.scan.len_z());
                    Some(Series {
                        name,
                        mask: segment_volume_with_floor(&series.scan, series.stored_zero()),
                    })
                }
                Err(e) => {
                    warn!("Skipping `{}`: {e}", dir.display());
                    None
                }
            }
        })
        .collect()
}

/// 用分类器 `clf` 修正所有序列, 返回统计.
///
/// 每个序列都在自己的拷贝上修正, 因此不同分类器之间互不影响.
/// 分类器报错时立即返回, 出错序列的掩膜不会写出.
fn correct_all(
    key: &str,
    clf: &(dyn Classifier + Sync + Send),
    all: &[Series],
    spec: &PipelineSpec,
    out: Option<&Path>,
) -> Result<Profile, ClassifyError> {
    let mut profile = Profile::new();
    for series in all {
        println!("{key}: series `{}`...", series.name);
        let mut mask = series.mask.clone();
        for (z, mut sli) in mask.slice_iter_mut().enumerate() {
            if sli.is_background() {
                profile.count_trivial();
                continue;
            }
            profile.count_target();
            let mut rng = spec.slice_rng(z);
            let corrected = border_correct(&mut sli, clf, &spec.border, &mut rng);
            profile.target_elapsed();
            let c = corrected.map_err(|e| {
                error!("{key}: slice {z} of `{}` failed: {e}", series.name);
                e
            })?;
            profile.count_corrected(c.pairs, c.closed, c.pixels_added);
        }
        if let Some(dir) = out {
            let path = dir.join(format!("{}-{key}.nii.gz", series.name));
            if let Err(e) = mask.save_nifti(&path) {
                warn!("Cannot save `{}`: {e}", path.display());
            }
        }
    }
    Ok(profile.finish())
}

/// 参与比较的分类器.
fn classifiers() -> Vec<(&'static str, BoxedClassifier)> {
    let mut ans: Vec<(&'static str, BoxedClassifier)> = vec![
        ("never", Box::new(Constant(Label::Negative))),
        ("always", Box::new(Constant(Label::Positive))),
    ];
    match loader::svm_model_from_env_or_home() {
        Ok(Some(svm)) => ans.push(("svm", Box::new(svm))),
        Ok(None) => info!("No SVM model found, running constant classifiers only"),
        Err(e) => warn!("Cannot load SVM model: {e}"),
    }
    ans
}

/// 实际运行. 任一分类器报错时返回该错误.
pub fn run() -> Result<AblationResult, ClassifyError> {
    let dirs = loader::series_dirs_from_env_or_home();
    assert!(!dirs.is_empty(), "No DICOM series found");

    let spec = PipelineSpec::new(BorderSpec::default(), loader::seed_from_env());
    let out = loader::output_dir_from_env();
    if let Some(dir) = out.as_deref() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Cannot create `{}`: {e}", dir.display());
        }
    }

    let all = load_all(&dirs);
    assert!(!all.is_empty(), "Loading dataset error");

    println!("Running ablation studies on {} cpus...", utils::cpus());
    let classifiers = classifiers();
    thread::scope(|s| {
        let (all, spec, out) = (&all, &spec, out.as_deref());
        let handles: Vec<_> = classifiers
            .iter()
            .map(|(key, clf)| s.spawn(move || correct_all(key, &**clf, all, spec, out)))
            .collect();

        let profiles = handles
            .into_iter()
            .map(|th| th.join().expect("Thread joining error"))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AblationResult::from_iter(
            classifiers.iter().map(|(key, _)| *key).zip(profiles),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// 总是报告特征个数错误的分类器.
    struct Broken;

    impl Classifier for Broken {
        fn predict(&self, features: &[f64]) -> ClassifyResult<Label> {
            Err(ClassifyError::FeatureShape {
                expected: features.len() + 1,
                found: features.len(),
            })
        }
    }

    fn notched_disk() -> OwnedMaskSlice {
        OwnedMaskSlice::from_raw(Array2::from_shape_fn((60, 60), |(h, w)| {
            let (dh, dw) = (h as i64 - 30, w as i64 - 30);
            (dh * dh + dw * dw <= 400 && !(dw > 0 && dh.abs() < 8)) as u8
        }))
    }

    fn series(name: &str) -> Series {
        let slices = [OwnedMaskSlice::zeros((60, 60)), notched_disk()];
        Series {
            name: name.to_string(),
            mask: LungMask::stack(&slices, [1.0, 0.7, 0.7]).unwrap(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("border8-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    #[test]
    fn test_classifier_error_propagates() {
        let dir = scratch_dir("broken");
        let all = [series("a"), series("b")];
        let result = correct_all("broken", &Broken, &all, &PipelineSpec::default(), Some(&dir));
        assert!(matches!(result, Err(ClassifyError::FeatureShape { .. })));
        assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_profile_counts() {
        let all = [series("a")];
        let spec = PipelineSpec::default();
        let profile = correct_all("always", &Constant(Label::Positive), &all, &spec, None).unwrap();
        assert_eq!(profile.get_trivial(), 1);
        assert_eq!(profile.get_target(), 1);
        assert!(profile.get_pairs() > 0);
        assert!(profile.get_closed() > 0);
        assert!(profile.get_added() > 0);
    }
}
