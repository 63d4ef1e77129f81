//! 发送方引擎
//!
//! - 每个 tick 的发送阶段在 `WINDOW_SIZE` 的预算内发出新段（4/4/4/3 打包）
//! - 累计 ACK 与间隙信号累积为 `timeout_count`；大于 0 时下一次发送机会先做一次选择性重传
//! - 只重传累计 ACK 指向的那一个段，而不是整个窗口
//!
//! 本模块只管理状态；段的实际发送由调用方（`RdtLayer`）负责。

use serde::Serialize;
use tracing::{debug, trace};

use super::packing::{
    SEGMENT_SIZE, SEGMENTS_PER_BURST, WINDOW_SIZE, burst_segment_len, grid_segment_len,
};
use crate::net::{AckSegment, Segment};

/// 发送方计数器
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SenderStats {
    pub new_segments: u64,
    pub retransmits: u64,
    pub acks_seen: u64,
    pub gap_signals: u64,
}

#[derive(Debug, Clone)]
pub struct SenderEngine {
    data: Vec<char>,
    /// 已交给通道的字符数（不代表已确认）
    bytes_sent: usize,
    /// 下一个新段的起始偏移（1 起）
    next_seq: u64,
    /// 迄今见过的最大累计 ACK
    last_ack: u64,
    timeout_count: u32,
    /// 本次发送阶段已用的窗口预算
    flow_used: usize,
    /// 打包组内位置（0..SEGMENTS_PER_BURST）
    burst_pos: usize,
    stats: SenderStats,
}

impl SenderEngine {
    pub fn new(data: &str) -> Self {
        Self {
            data: data.chars().collect(),
            bytes_sent: 0,
            next_seq: 1,
            last_ack: 1,
            timeout_count: 0,
            flow_used: 0,
            burst_pos: 0,
            stats: SenderStats::default(),
        }
    }

    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn last_ack(&self) -> u64 {
        self.last_ack
    }

    pub fn timeout_count(&self) -> u32 {
        self.timeout_count
    }

    pub fn burst_pos(&self) -> usize {
        self.burst_pos
    }

    pub fn stats(&self) -> SenderStats {
        self.stats
    }

    /// 所有数据都已被累计确认
    pub fn is_acknowledged(&self) -> bool {
        self.last_ack > self.data.len() as u64
    }

    /// 发送阶段：返回本 tick 要发出的数据段（新段与重传段）。
    pub fn send_phase(&mut self) -> Vec<Segment> {
        let mut out = Vec::new();

        while self.flow_used < WINDOW_SIZE {
            if self.timeout_count > 0 {
                if let Some(seg) = self.retransmit() {
                    out.push(seg);
                }
                self.timeout_count = 0;
            } else if self.bytes_sent < self.data.len() {
                match self.send_new() {
                    Some(seg) => out.push(seg),
                    None => self.flow_used = WINDOW_SIZE,
                }
            } else {
                // 没有新数据也没有待重传：关窗
                self.flow_used = WINDOW_SIZE;
            }
        }
        // 窗口预算按 tick 计，不跨 tick 累积
        self.flow_used = 0;

        if !out.is_empty() {
            debug!(
                segments = out.len(),
                bytes_sent = self.bytes_sent,
                next_seq = self.next_seq,
                "发送阶段完成"
            );
        }
        out
    }

    /// 新段：下一个放不进剩余预算时返回 `None`。
    fn send_new(&mut self) -> Option<Segment> {
        let remain = self.data.len() - self.bytes_sent;
        let len = burst_segment_len(self.burst_pos).min(remain);
        if self.flow_used + len > WINDOW_SIZE {
            return None;
        }

        let seq = self.next_seq;
        let payload = self.slice(self.bytes_sent, len);
        self.bytes_sent += len;
        self.next_seq += len as u64;
        self.flow_used += len;
        self.burst_pos = (self.burst_pos + 1) % SEGMENTS_PER_BURST;
        self.stats.new_segments += 1;

        trace!(seq, len, burst_pos = self.burst_pos, "发送新数据段");
        Some(Segment::data(seq, payload))
    }

    /// 选择性重传 `last_ack` 处的段。
    ///
    /// 长度取该偏移在打包网格上原本的段长，并截断到已发送的范围；
    /// 目标尚未发送过（已发送的全部被确认）时不重传。
    fn retransmit(&mut self) -> Option<Segment> {
        let seq = self.last_ack;
        let start = seq.saturating_sub(1) as usize;
        if start >= self.bytes_sent {
            trace!(seq, "没有待重传的数据");
            return None;
        }

        let len = grid_segment_len(seq)
            .unwrap_or(SEGMENT_SIZE)
            .min(self.bytes_sent - start);
        if self.flow_used + len > WINDOW_SIZE {
            return None;
        }
        self.flow_used += len;
        self.stats.retransmits += 1;

        debug!(seq, len, "选择性重传");
        Some(Segment::data(seq, self.slice(start, len)))
    }

    /// 处理本 tick 收到的一批 ACK。
    pub fn on_acks(&mut self, mut acks: Vec<AckSegment>) {
        // 稳定排序：无间隙的在前，其余保持到达顺序
        acks.sort_by_key(|a| a.gap);

        let all_sent = self.bytes_sent == self.data.len();
        let len = self.data.len() as u64;
        for a in acks {
            self.stats.acks_seen += 1;
            self.last_ack = self.last_ack.max(a.ack);
            if a.gap {
                self.stats.gap_signals += 1;
                self.timeout_count += 1;
            }
            // 数据已全部发出但仍有未确认字符：保持重传尾部丢失
            if all_sent && a.ack <= len {
                self.timeout_count += 1;
            }
        }
        trace!(
            last_ack = self.last_ack,
            timeout_count = self.timeout_count,
            "ACK 处理完成"
        );
    }

    fn slice(&self, start: usize, len: usize) -> String {
        let end = (start + len).min(self.data.len());
        self.data[start.min(end)..end].iter().collect()
    }
}
