//! 逻辑时间类型
//!
//! 协议没有墙钟，唯一的时间概念是驱动方调用 tick 的次数。

/// 逻辑迭代（第几次 tick；0 表示尚未开始）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Iteration(pub u64);

impl Iteration {
    pub const ZERO: Iteration = Iteration(0);

    pub fn next(self) -> Iteration {
        Iteration(self.0.saturating_add(1))
    }
}
