//! 肺掩膜 / CT 扫描切片对象的操作.

mod core;
mod iter;
mod save;

pub use core::{MaskSlice, MaskSliceMut, OwnedMaskSlice, OwnedScanSlice, ScanSlice};

pub use save::{ImgWriteRaw, ImgWriteVis};
