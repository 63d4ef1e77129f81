//! 驱动模块
//!
//! 此模块包含逐迭代驱动的核心组件：逻辑时间、世界、驱动器，以及一次完整传输的世界实现与场景文件。

// 子模块声明
mod scenario;
mod simulator;
mod time;
mod transfer;
mod world;

// 重新导出公共接口
pub use scenario::{SCENARIO_SCHEMA_VERSION, ScenarioSpec};
pub use simulator::{RunOutcome, Simulator};
pub use time::Iteration;
pub use transfer::{TransferSummary, TransferWorld};
pub use world::World;
