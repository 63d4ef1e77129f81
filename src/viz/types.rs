use serde::{Deserialize, Serialize};

use crate::net::Segment;

/// 可视化事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 传输元信息（建议作为第一条事件）
    Meta {
        data_chars: usize,
        segment_size: usize,
        window_size: usize,
        seed: u64,
    },
    /// 通道接纳了一个段（故障判定之前）
    Transmit { segment: Segment },
    /// 通道丢弃
    Drop { segment: Segment },
    /// 通道延迟：在 `release_at` 迭代之后才可被接收
    Delay { segment: Segment, release_at: u64 },
    /// 数据段载荷被破坏
    Corrupt { seq: u64 },
    /// 通道复制出一份重复段
    Duplicate { segment: Segment },
    /// 本次迭代中发生的乱序交换次数
    Reorder { swaps: u64 },
    /// 每次迭代结束时的双方进度采样
    Progress {
        received_chars: usize,
        next_expected: u64,
        last_ack: u64,
        timeout_count: u32,
    },
    /// 传输结束
    Done { iterations: u64, intact: bool },
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizEvent {
    /// 逻辑迭代（和 `Iteration.0` 同口径）
    pub iteration: u64,
    /// 事件所属通道（forward / reverse）；与通道无关的事件为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，传输结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    pub fn record(&mut self, iteration: u64, channel: Option<&str>, kind: VizEventKind) {
        self.push(VizEvent {
            iteration,
            channel: channel.map(str::to_owned),
            kind,
        });
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
