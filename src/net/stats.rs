//! 统计信息
//!
//! 定义不可靠通道的统计数据结构。

use serde::Serialize;

/// 通道统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub data_segments: u64,
    pub ack_segments: u64,
    pub dropped: u64,
    pub delayed: u64,
    pub corrupted: u64,
    pub duplicated: u64,
    pub reordered: u64,
    pub delivered: u64,
}

impl ChannelStats {
    /// 通道接纳的段总数（数据 + 确认）
    pub fn total(&self) -> u64 {
        self.data_segments.saturating_add(self.ack_segments)
    }
}
