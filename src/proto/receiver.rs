//! 接收方引擎
//!
//! - 丢弃载荷含损坏标记的段
//! - 按 `seq` 去重缓存所有未损坏段，每个 tick 从头重建输出（幂等，与到达顺序无关）
//! - 对本 tick 每个未损坏段回一个累计 ACK；非期望的段带间隙信号
//! - 期望偏移恰好已被缓存时，沿打包网格向前探测，一步跨过已缓存的连续段
//! - 本 tick 入站批次为空时仍回一个带间隙信号的 ACK，避免发送方“饿死”

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, trace};

use super::packing::next_grid_offset;
use crate::net::{AckSegment, DataSegment};

/// 接收方计数器
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    pub accepted: u64,
    pub duplicates: u64,
    pub corrupted: u64,
    pub acks_sent: u64,
    pub gap_acks: u64,
}

#[derive(Debug, Clone)]
pub struct ReceiverEngine {
    /// 下一个尚未连续收到的偏移（累计 ACK 的值）
    next_expected: u64,
    /// 已记录段的最大结束偏移（不含）
    high_water: u64,
    /// seq -> 段；同一 seq 只保留第一次到达的
    segments: BTreeMap<u64, DataSegment>,
    /// 已确认收到的段起点
    offsets: BTreeSet<u64>,
    reassembled: String,
    stats: ReceiverStats,
}

impl Default for ReceiverEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiverEngine {
    pub fn new() -> Self {
        Self {
            next_expected: 1,
            high_water: 1,
            segments: BTreeMap::new(),
            offsets: BTreeSet::new(),
            reassembled: String::new(),
            stats: ReceiverStats::default(),
        }
    }

    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    pub fn reassembled(&self) -> &str {
        &self.reassembled
    }

    /// 已缓存的不同段数
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// 处理本 tick 收到的一批数据段，返回要回送的 ACK。
    pub fn on_segments(&mut self, mut batch: Vec<DataSegment>) -> Vec<AckSegment> {
        batch.sort_by_key(|s| s.seq);
        let inbound_empty = batch.is_empty();

        let before = batch.len();
        batch.retain(|s| !s.is_corrupted());
        let corrupted = (before - batch.len()) as u64;
        if corrupted > 0 {
            self.stats.corrupted += corrupted;
            debug!(corrupted, "丢弃损坏段");
        }

        for s in &batch {
            match self.segments.entry(s.seq) {
                Entry::Vacant(e) => {
                    e.insert(s.clone());
                    self.stats.accepted += 1;
                }
                Entry::Occupied(_) => self.stats.duplicates += 1,
            }
        }
        self.reassemble();

        // 本 tick 什么都没收到：仍然回一个间隙 ACK；只收到损坏段时不回 ACK
        let acks: Vec<AckSegment> = if inbound_empty {
            vec![AckSegment {
                ack: self.next_expected,
                gap: true,
            }]
        } else {
            batch.iter().map(|s| self.acknowledge(s)).collect()
        };

        self.stats.acks_sent += acks.len() as u64;
        self.stats.gap_acks += acks.iter().filter(|a| a.gap).count() as u64;
        trace!(
            next_expected = self.next_expected,
            high_water = self.high_water,
            acks = acks.len(),
            "接收处理完成"
        );
        acks
    }

    /// 从缓存的全部段重建输出
    fn reassemble(&mut self) {
        self.reassembled = self.segments.values().map(|s| s.payload.as_str()).collect();
    }

    fn acknowledge(&mut self, seg: &DataSegment) -> AckSegment {
        self.offsets.insert(seg.seq);
        if seg.seq >= self.high_water {
            self.high_water = seg.end();
        }

        let gap = if seg.seq == self.next_expected {
            self.next_expected = seg.end();
            false
        } else {
            true
        };
        self.walk_gaps();

        AckSegment {
            ack: self.next_expected,
            gap,
        }
    }

    /// 若期望偏移已被缓存，沿网格向前走到第一个空洞；走到最大已记录偏移仍无空洞则跳到 `high_water`。
    fn walk_gaps(&mut self) {
        if !self.offsets.contains(&self.next_expected) {
            return;
        }
        let Some(&last) = self.offsets.last() else {
            return;
        };

        let mut at = self.next_expected;
        while self.offsets.contains(&at) {
            if at >= last {
                self.next_expected = self.next_expected.max(self.high_water);
                return;
            }
            // 网格外的段（非本协议发送方产生）按其实际长度前进
            let next = next_grid_offset(at)
                .or_else(|| self.segments.get(&at).map(DataSegment::end))
                .filter(|&n| n > at);
            match next {
                Some(n) => at = n,
                None => break,
            }
        }
        if at > self.next_expected {
            trace!(from = self.next_expected, to = at, "网格探测推进");
            self.next_expected = at;
        }
    }
}
