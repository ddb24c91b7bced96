//! 🫁欢迎光临🫁
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::slice::{
    ImgWriteRaw, ImgWriteVis, MaskSlice, MaskSliceMut, OwnedMaskSlice, OwnedScanSlice, ScanSlice,
};
pub use crate::data::window::CtWindow;
pub use crate::data::{CtScan, LungMask, VolumeAttr};

pub use crate::consts::gray::{LUNG_BACKGROUND, LUNG_FOREGROUND};

pub use crate::border::{border_correct, BorderSpec, Corrected};
pub use crate::classify::{Classifier, ClassifyError, ClassifyResult, Constant, FnClassifier, Label, RbfSvm};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{read_dicom_directory, DicomSeries, LoadError};
pub use crate::dataset::{read_xml_directory, NoduleAnnotations};

pub use crate::pipeline::{
    correct_volume, read_and_correct, segment_volume, segment_volume_with_floor, PipelineError,
    PipelineSpec,
};
pub use crate::segment::{segment_lungs, segment_lungs_with_floor};
