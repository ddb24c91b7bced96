//! 通用常量.

/// 单通道颜色.
pub mod gray {
    /// 肺掩膜中, 背景的像素值.
    pub const LUNG_BACKGROUND: u8 = 0;

    /// 肺掩膜中, 肺的像素值.
    pub const LUNG_FOREGROUND: u8 = 1;

    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 单通道白色.
    pub const WHITE: u8 = 0b_1111_1111;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, LUNG_BACKGROUND)
    }

    /// 像素是否是前景? 任何非零值都被视为前景.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }
}

/// 候选点对生成的默认参数.
pub mod pair {
    /// 拐点个数少于该值时, 第二个点固定取前一个拐点.
    pub const DENSE_THRESHOLD: usize = 20;

    /// 拐点足够多时, 第二个点相对第一个点的最大随机偏移 (不含 0).
    pub const MAX_OFFSET: usize = 5;
}

/// 分割流程的默认参数.
pub mod segment {
    /// 开运算圆盘结构元的半径.
    pub const DISK_RADIUS: usize = 4;

    /// 保留的最大连通域个数 (左肺 + 右肺).
    pub const KEEP_AREAS: usize = 2;

    /// Otsu 直方图的桶数.
    pub const OTSU_BINS: usize = 256;

    /// 存储值 0 对应的 CT 值, 即常见 CT 序列的 `RescaleIntercept`.
    /// 分割前低于它的值 (扫描视野外的填充) 被截断到它.
    pub const STORED_ZERO_HU: f32 = -1024.0;
}
