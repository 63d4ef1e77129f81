//! 世界 trait
//!
//! 定义被驱动的传输世界接口。

use super::time::Iteration;
use crate::error::RdtError;

/// 传输世界：由业务层实现（例如一对 RDT 层 + 两条通道）。
pub trait World {
    /// 执行一次迭代
    fn on_iteration(&mut self, now: Iteration) -> Result<(), RdtError>;
    /// 传输是否已完成
    fn is_done(&self) -> bool;
}
