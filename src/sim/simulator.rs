//! 驱动器
//!
//! 每个逻辑迭代调用一次世界的 `on_iteration`，直到世界报告完成或达到迭代上限。

use super::time::Iteration;
use super::world::World;
use crate::error::RdtError;
use tracing::{debug, info, warn};

/// 一次运行的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 世界在第 `iterations` 次迭代后报告完成
    Completed { iterations: u64 },
    /// 到达上限仍未完成
    Exhausted { iterations: u64 },
}

impl RunOutcome {
    pub fn iterations(&self) -> u64 {
        match *self {
            RunOutcome::Completed { iterations } | RunOutcome::Exhausted { iterations } => {
                iterations
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

/// 逐迭代驱动器：维护当前逻辑时间。
#[derive(Debug, Default)]
pub struct Simulator {
    now: Iteration,
}

impl Simulator {
    /// 获取当前迭代
    pub fn now(&self) -> Iteration {
        self.now
    }

    /// 运行直到世界完成或到达 `until`（含）。
    #[tracing::instrument(skip(self, world), fields(until = until.0))]
    pub fn run_until(
        &mut self,
        until: Iteration,
        world: &mut dyn World,
    ) -> Result<RunOutcome, RdtError> {
        info!("▶️  开始运行传输");
        debug!(now = self.now.0, "初始状态");

        if world.is_done() {
            return Ok(RunOutcome::Completed {
                iterations: self.now.0,
            });
        }

        while self.now < until {
            self.now = self.now.next();
            world.on_iteration(self.now)?;

            if world.is_done() {
                info!(iterations = self.now.0, "✅ 传输完成");
                return Ok(RunOutcome::Completed {
                    iterations: self.now.0,
                });
            }
        }

        warn!(iterations = self.now.0, "到达迭代上限，传输未完成");
        Ok(RunOutcome::Exhausted {
            iterations: self.now.0,
        })
    }
}
