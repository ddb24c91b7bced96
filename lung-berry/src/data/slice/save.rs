//! 切片图像的持久化存储, 主要用于调试修正结果.

use crate::{MaskSlice, MaskSliceMut, ScanSlice};
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对于 `MaskSlice`, `MaskSliceMut` 这类仅存在 0, 1 像素值的图像,
/// 在保存时背景映射为黑色, 前景映射为白色;
/// 对于 `ScanSlice` 这类以 CT 值存储的扫描, 在保存时会用肺窗规范化.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 表明一个可以通过 **按原样** 模式持久化存储的图像对象.
pub trait ImgWriteRaw {
    /// 按原样将图片保存到 `path` 路径.
    fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 使像素更有利于单通道可视化.
#[inline]
pub(crate) fn pretty(mask: u8) -> u8 {
    use crate::consts::gray::*;
    if is_foreground(mask) {
        WHITE
    } else {
        BLACK
    }
}

macro_rules! impl_mask_save {
    ($($slice: ty),+) => {
        $(
            /// 背景为黑色, 任何前景为白色.
            impl ImgWriteVis for $slice {
                fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pretty(pix)]));
                    }
                    buf.save(path)
                }
            }

            /// 按原样存储.
            impl ImgWriteRaw for $slice {
                fn save_raw<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
                    let (height, width) = self.shape();
                    let mut buf = image::GrayImage::new(width as u32, height as u32);
                    for ((h, w), &pix) in self.indexed_iter() {
                        buf.put_pixel(w as u32, h as u32, image::Luma([pix]));
                    }
                    buf.save(path)
                }
            }
        )+
    };
}

impl_mask_save!(MaskSlice<'_>, MaskSliceMut<'_>);

/// 窗位 -600, 窗宽 1500.
impl ImgWriteVis for ScanSlice<'_> {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let mut buf = image::GrayImage::new(width as u32, height as u32);
        const WINDOW: crate::CtWindow = crate::CtWindow::from_lung_visual();
        for ((h, w), &hu) in self.indexed_iter() {
            // 非有限值按最暗处理.
            let gray = WINDOW.eval(hu).unwrap_or(u8::MIN);
            buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
        }
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OwnedMaskSlice;
    use ndarray::array;

    #[test]
    fn test_save_mask_png() {
        let owned = OwnedMaskSlice::from_raw(array![[0, 1, 0], [1, 1, 0]]);
        let dir = std::env::temp_dir();
        let vis = dir.join("lung-berry-save-vis.png");
        let raw = dir.join("lung-berry-save-raw.png");
        owned.as_immut().save(&vis).unwrap();
        owned.as_immut().save_raw(&raw).unwrap();

        let img = image::open(&vis).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 0).0, [255]);
        assert_eq!(img.get_pixel(2, 1).0, [0]);
        let img = image::open(&raw).unwrap().into_luma8();
        assert_eq!(img.get_pixel(0, 1).0, [1]);

        std::fs::remove_file(vis).unwrap();
        std::fs::remove_file(raw).unwrap();
    }
}
