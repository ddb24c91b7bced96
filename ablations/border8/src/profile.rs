//! 修正运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 该计时器支持 "中途中断" 与 "结束中断, 继续开始计时".
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时会视为已经开始计时.
    #[inline]
    fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始计时.
    #[inline]
    fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束计时, 并将这一区间的时间累加. 返回本轮计时时长.
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (微秒).
    #[inline]
    fn total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

/// 单个分类器在全部序列上的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 全背景切片个数.
    trivial: u64,

    /// 含肺切片个数.
    target: u64,

    /// 修正含肺切片花费的总时间.
    target_time: AccTimer,

    /// 整个任务花费的总时间.
    real_time: AccTimer,

    /// 最耗时的一张切片.
    most: Option<Duration>,

    /// 评估过的候选点对.
    pairs: u64,

    /// 被闭合的候选点对.
    closed: u64,

    /// 新增的前景体素.
    added: u64,
}

impl Profile {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            trivial: 0,
            target: 0,
            target_time: AccTimer::new(),
            real_time: AccTimer::new(),
            most: None,
            pairs: 0,
            closed: 0,
            added: 0,
        }
    }

    /// 记录一张全背景切片.
    #[inline]
    pub fn count_trivial(&mut self) {
        self.trivial += 1;
    }

    /// 记录一张含肺切片, 并开始计时.
    #[inline]
    pub fn count_target(&mut self) {
        self.target += 1;
        self.target_time.start();
    }

    /// 结束一次含肺切片计时.
    #[inline]
    pub fn target_elapsed(&mut self) {
        let d = self.target_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 累加一张切片的修正结果.
    #[inline]
    pub fn count_corrected(&mut self, pairs: usize, closed: usize, added: usize) {
        self.pairs += pairs as u64;
        self.closed += closed as u64;
        self.added += added as u64;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    pub fn get_trivial(&self) -> u64 {
        self.trivial
    }

    pub fn get_target(&self) -> u64 {
        self.target
    }

    pub fn get_pairs(&self) -> u64 {
        self.pairs
    }

    pub fn get_closed(&self) -> u64 {
        self.closed
    }

    pub fn get_added(&self) -> u64 {
        self.added
    }

    /// 以微秒为单位获得修正含肺切片的总时间.
    #[inline]
    pub fn get_target_time_us(&self) -> u64 {
        self.target_time.total_us()
    }

    /// 以微秒为单位获得整个任务的总时间.
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.total_us()
    }

    /// 修正一张含肺切片的平均时间 (微秒).
    pub fn get_avg_target_time_us(&self) -> Option<f64> {
        match self.target {
            0 => None,
            target => Some(self.get_target_time_us() as f64 / target as f64),
        }
    }

    /// 每张含肺切片平均新增的体素个数.
    pub fn get_avg_added(&self) -> Option<f64> {
        match self.target {
            0 => None,
            target => Some(self.added as f64 / target as f64),
        }
    }

    /// 最耗时的一张切片所消耗的时间. 如果不存在任务, 则返回 `None`.
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new()
    }
}
