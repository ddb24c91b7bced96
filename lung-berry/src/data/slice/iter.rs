use crate::Idx2d;
use std::iter::FusedIterator;

/// 行优先索引迭代器.
///
/// 内部只保存一个线性游标, 在需要时换算为 `(h, w)`.
#[derive(Debug, Clone)]
pub struct PosIter {
    front: usize,
    back: usize,
    width: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            front: 0,
            back: h * w,
            width: w,
        }
    }

    #[inline]
    fn unravel(&self, linear: usize) -> Idx2d {
        (linear / self.width, linear % self.width)
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        (self.front < self.back).then(|| {
            self.front += 1;
            self.unravel(self.front - 1)
        })
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.back - self.front;
        (left, Some(left))
    }
}

impl DoubleEndedIterator for PosIter {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        (self.front < self.back).then(|| {
            self.back -= 1;
            self.unravel(self.back)
        })
    }
}

impl ExactSizeIterator for PosIter {}

impl FusedIterator for PosIter {}
