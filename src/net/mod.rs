//! 通道与段模块
//!
//! 此模块包含协议两端交换的段类型，以及带故障注入的不可靠通道。

// 子模块声明
mod channel;
mod segment;
mod stats;

// 重新导出公共接口
pub use channel::{ChannelConfig, ChannelHandle, SegmentChannel, UnreliableChannel};
pub use segment::{AckSegment, CORRUPTION_MARKER, DataSegment, Segment};
pub use stats::ChannelStats;
