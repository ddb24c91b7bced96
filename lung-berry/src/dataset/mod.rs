//! 数据集操作.

use std::path::{Path, PathBuf};

mod dicom;
mod xml;

pub use dicom::{read_dicom_directory, DicomSeries, LoadError, LoadResult};
pub use xml::{
    parse_annotations, read_xml_directory, NoduleAnnotations, NoduleMap, ParseError, Roi, XmlError,
    XmlResult,
};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
