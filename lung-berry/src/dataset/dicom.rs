//! DICOM 序列读取.
//!
//! 像素解码交给 `dicom-pixeldata`, 多帧文件只取第一帧.

use crate::{CtScan, Idx2d};
use dicom_object::{open_file, DefaultDicomObject};
use dicom_pixeldata::PixelDecoder;
use log::{debug, warn};
use ndarray::{Array2, Array3, Axis};
use std::fmt;
use std::path::{Path, PathBuf};

/// 读取 DICOM 序列时的错误.
#[derive(Debug)]
pub enum LoadError {
    /// 目录中没有 `.dcm` 文件.
    Empty(PathBuf),

    /// 文件无法解析, 或缺少必要属性.
    Dicom {
        /// 出错的文件.
        path: PathBuf,

        /// 底层错误描述.
        msg: String,
    },

    /// 像素格式不受支持.
    Unsupported {
        /// 出错的文件.
        path: PathBuf,

        /// 具体原因.
        msg: String,
    },

    /// 切片分辨率与第一张切片不同.
    ShapeMismatch {
        /// 出错的文件.
        path: PathBuf,

        /// 第一张切片的分辨率.
        expected: Idx2d,

        /// 该文件的分辨率.
        found: Idx2d,
    },

    /// 其他底层 I/O 错误.
    IoError(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(p) => write!(f, "no .dcm file in {}", p.display()),
            Self::Dicom { path, msg } => write!(f, "{}: {msg}", path.display()),
            Self::Unsupported { path, msg } => write!(f, "{}: unsupported, {msg}", path.display()),
            Self::ShapeMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "{}: slice shape {found:?} differs from {expected:?}",
                path.display()
            ),
            Self::IoError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// 读取 DICOM 序列的结果.
pub type LoadResult<T> = Result<T, LoadError>;

/// 按 `SliceLocation` 升序排列的一组切片.
#[derive(Debug)]
pub struct DicomSeries {
    /// 形状为 `(z, h, w)` 的 CT 数据, 已经过 `RescaleSlope/RescaleIntercept` 变换.
    pub scan: CtScan,

    /// 每张切片的 `SliceLocation`, 与 `scan` 的 z 轴一一对应.
    pub slice_locations: Vec<f64>,

    /// 每张切片的源文件.
    pub files: Vec<PathBuf>,

    /// 所有切片中最小的 `RescaleIntercept`, 即存储值 0 对应的 CT 值.
    pub rescale_intercept: f64,
}

impl DicomSeries {
    /// 分割时使用的截断下限 (HU).
    #[inline]
    pub fn stored_zero(&self) -> f32 {
        self.rescale_intercept as f32
    }
}

/// 单个文件读出的切片.
struct RawSlice {
    path: PathBuf,
    location: f64,
    pixels: Array2<f32>,
    intercept: f64,
    spacing: Option<(f64, f64)>,
    thickness: Option<f64>,
}

/// 读取目录 `dir` 中所有 `.dcm` 文件, 按 `SliceLocation` 升序组成三维 CT.
///
/// 任何一个 `.dcm` 文件无法读取都会导致整体失败; 其他扩展名的文件被忽略.
pub fn read_dicom_directory<P: AsRef<Path>>(dir: P) -> LoadResult<DicomSeries> {
    let dir = dir.as_ref();
    let mut paths = vec![];
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |e| e == "dcm") {
            paths.push(path);
        } else {
            warn!("skip non-DICOM file {}", path.display());
        }
    }
    if paths.is_empty() {
        return Err(LoadError::Empty(dir.to_owned()));
    }
    paths.sort();

    let mut slices = paths
        .into_iter()
        .map(read_slice)
        .collect::<LoadResult<Vec<_>>>()?;
    slices.sort_by(|a, b| a.location.total_cmp(&b.location));

    let expected = slices[0].pixels.dim();
    if let Some(bad) = slices.iter().find(|s| s.pixels.dim() != expected) {
        return Err(LoadError::ShapeMismatch {
            path: bad.path.clone(),
            expected,
            found: bad.pixels.dim(),
        });
    }

    let (spacing_h, spacing_w) = slices[0].spacing.unwrap_or((1.0, 1.0));
    let spacing_z = match slices.as_slice() {
        [a, b, ..] => (b.location - a.location).abs(),
        _ => 0.0,
    };
    let spacing_z = if spacing_z > 0.0 {
        spacing_z
    } else {
        slices[0].thickness.unwrap_or(1.0)
    };

    let data: Array3<f32> = {
        let views: Vec<_> = slices.iter().map(|s| s.pixels.view()).collect();
        ndarray::stack(Axis(0), &views).map_err(|e| dicom_error(dir, e))?
    };
    debug!("read {} slices of shape {expected:?} from {}", slices.len(), dir.display());

    let rescale_intercept = slices.iter().map(|s| s.intercept).fold(f64::INFINITY, f64::min);
    let pix_dim = [spacing_z as f32, spacing_h as f32, spacing_w as f32];
    let (slice_locations, files) = slices.into_iter().map(|s| (s.location, s.path)).unzip();
    Ok(DicomSeries {
        scan: CtScan::new(data, pix_dim),
        slice_locations,
        files,
        rescale_intercept,
    })
}

fn read_slice(path: PathBuf) -> LoadResult<RawSlice> {
    let obj = open_file(&path).map_err(|e| dicom_error(&path, e))?;
    let location = float_attr(&obj, &path, "SliceLocation")?;
    let intercept = optional_float(&obj, "RescaleIntercept").unwrap_or(0.0);
    let spacing = obj
        .element_by_name("PixelSpacing")
        .ok()
        .and_then(|e| e.to_multi_float64().ok())
        .and_then(|v| match v.as_slice() {
            [h, w, ..] => Some((*h, *w)),
            _ => None,
        });
    let thickness = optional_float(&obj, "SliceThickness");

    let unsupported = |e: dicom_pixeldata::Error| LoadError::Unsupported {
        path: path.clone(),
        msg: e.to_string(),
    };
    // 只取第一帧; 像素值已经过 RescaleSlope/RescaleIntercept 变换.
    let decoded = obj.decode_pixel_data().map_err(unsupported)?;
    let shape = (decoded.rows() as usize, decoded.columns() as usize);
    let values: Vec<f32> = decoded.to_vec_frame(0).map_err(unsupported)?;
    let pixels = Array2::from_shape_vec(shape, values).map_err(|e| LoadError::Unsupported {
        path: path.clone(),
        msg: e.to_string(),
    })?;
    Ok(RawSlice {
        path,
        location,
        pixels,
        intercept,
        spacing,
        thickness,
    })
}

fn dicom_error<E: fmt::Display>(path: &Path, e: E) -> LoadError {
    LoadError::Dicom {
        path: path.to_owned(),
        msg: e.to_string(),
    }
}

fn float_attr(obj: &DefaultDicomObject, path: &Path, name: &str) -> LoadResult<f64> {
    obj.element_by_name(name)
        .map_err(|e| dicom_error(path, e))?
        .to_float64()
        .map_err(|e| dicom_error(path, e))
}

fn optional_float(obj: &DefaultDicomObject, name: &str) -> Option<f64> {
    obj.element_by_name(name).ok()?.to_float64().ok()
}
