//! 不可靠通道
//!
//! 真实链路会丢包、乱序、重复、损坏。为了在不依赖真实网络的前提下验证可靠性机制，
//! 这里提供一个带故障注入的 [`UnreliableChannel`]：
//!
//! | 故障   | 说明                                                    |
//! |--------|---------------------------------------------------------|
//! | 丢包   | 以 `drop_ratio` 概率静默丢弃                            |
//! | 延迟   | 以 `delay_ratio` 概率推迟 `delay_iterations` 次迭代交付 |
//! | 损坏   | 以 `corrupt_ratio` 概率把数据段的一个字符替换为损坏标记 |
//! | 重复   | 以 `duplicate_ratio` 概率交付两份                       |
//! | 乱序   | 以 `reorder_ratio` 概率与同批次的另一个段交换位置       |
//!
//! 通道由一个带种子的 RNG 驱动，同样的种子给出同样的故障序列。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::segment::Segment;
use super::stats::ChannelStats;
use crate::error::ConfigError;
use crate::sim::Iteration;
use crate::viz::{VizEventKind, VizLogger};

/// 协议层看到的通道接口：发送即忘，接收时取走当前所有待交付的段。
pub trait SegmentChannel: fmt::Debug {
    fn send(&mut self, seg: Segment);
    fn receive(&mut self) -> Vec<Segment>;
}

/// RDT 层持有的通道句柄（单线程共享）。
pub type ChannelHandle = Rc<RefCell<dyn SegmentChannel>>;

/// 故障注入模型配置。
///
/// 所有比例都在 `[0.0, 1.0]` 内；默认无任何故障（透明直通）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub drop_ratio: f64,
    pub delay_ratio: f64,
    /// 被延迟的段推迟多少次迭代后交付
    pub delay_iterations: u64,
    pub corrupt_ratio: f64,
    pub reorder_ratio: f64,
    pub duplicate_ratio: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            drop_ratio: 0.0,
            delay_ratio: 0.0,
            delay_iterations: 5,
            corrupt_ratio: 0.0,
            reorder_ratio: 0.0,
            duplicate_ratio: 0.0,
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("drop_ratio", self.drop_ratio),
            ("delay_ratio", self.delay_ratio),
            ("corrupt_ratio", self.corrupt_ratio),
            ("reorder_ratio", self.reorder_ratio),
            ("duplicate_ratio", self.duplicate_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRatio { name, value });
            }
        }
        Ok(())
    }
}

/// 被延迟的段及其可交付的迭代
#[derive(Debug)]
struct Delayed {
    release_at: Iteration,
    seg: Segment,
}

/// 带故障注入的单向通道。
///
/// 段的生命周期：`send` 进入 outbox → `advance` 施加故障 → 进入 inbox → `receive` 取走。
pub struct UnreliableChannel {
    name: String,
    cfg: ChannelConfig,
    rng: StdRng,
    outbox: Vec<Segment>,
    delayed: Vec<Delayed>,
    inbox: Vec<Segment>,
    pub stats: ChannelStats,
}

impl fmt::Debug for UnreliableChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnreliableChannel")
            .field("name", &self.name)
            .field("cfg", &self.cfg)
            .field("outbox", &self.outbox.len())
            .field("delayed", &self.delayed.len())
            .field("inbox", &self.inbox.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl UnreliableChannel {
    pub fn new(name: impl Into<String>, cfg: ChannelConfig, seed: u64) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            name: name.into(),
            cfg,
            rng: StdRng::seed_from_u64(seed),
            outbox: Vec::new(),
            delayed: Vec::new(),
            inbox: Vec::new(),
            stats: ChannelStats::default(),
        })
    }

    /// 无故障通道
    pub fn perfect(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cfg: ChannelConfig::default(),
            rng: StdRng::seed_from_u64(0),
            outbox: Vec::new(),
            delayed: Vec::new(),
            inbox: Vec::new(),
            stats: ChannelStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.cfg
    }

    /// 仍在延迟中的段数
    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    /// 每次迭代调用一次：把本迭代发送的段过一遍故障模型，放入可接收队列。
    #[tracing::instrument(skip(self, viz), fields(channel = %self.name, now = now.0))]
    pub fn advance(&mut self, now: Iteration, mut viz: Option<&mut VizLogger>) {
        let mut ready = Vec::new();

        // 先释放到期的延迟段（不再经过故障模型）
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.delayed)
            .into_iter()
            .partition(|d| d.release_at <= now);
        self.delayed = waiting;
        ready.extend(due.into_iter().map(|d| d.seg));

        for seg in std::mem::take(&mut self.outbox) {
            match seg {
                Segment::Data(_) => self.stats.data_segments += 1,
                Segment::Ack(_) => self.stats.ack_segments += 1,
            }
            if let Some(v) = viz.as_deref_mut() {
                v.record(now.0, Some(&self.name), VizEventKind::Transmit { segment: seg.clone() });
            }

            if self.roll(self.cfg.drop_ratio) {
                self.stats.dropped += 1;
                trace!(?seg, "丢弃");
                if let Some(v) = viz.as_deref_mut() {
                    v.record(now.0, Some(&self.name), VizEventKind::Drop { segment: seg });
                }
                continue;
            }

            if self.roll(self.cfg.delay_ratio) {
                self.stats.delayed += 1;
                let release_at = Iteration(now.0.saturating_add(self.cfg.delay_iterations));
                trace!(?seg, release_at = release_at.0, "延迟");
                if let Some(v) = viz.as_deref_mut() {
                    v.record(
                        now.0,
                        Some(&self.name),
                        VizEventKind::Delay {
                            segment: seg.clone(),
                            release_at: release_at.0,
                        },
                    );
                }
                self.delayed.push(Delayed { release_at, seg });
                continue;
            }

            let seg = match seg {
                Segment::Data(d) if !d.is_empty() && self.roll(self.cfg.corrupt_ratio) => {
                    let at = self.rng.gen_range(0..d.len());
                    self.stats.corrupted += 1;
                    trace!(seq = d.seq, at, "损坏");
                    if let Some(v) = viz.as_deref_mut() {
                        v.record(now.0, Some(&self.name), VizEventKind::Corrupt { seq: d.seq });
                    }
                    Segment::Data(d.damaged(at))
                }
                other => other,
            };

            if self.roll(self.cfg.duplicate_ratio) {
                self.stats.duplicated += 1;
                if let Some(v) = viz.as_deref_mut() {
                    v.record(
                        now.0,
                        Some(&self.name),
                        VizEventKind::Duplicate { segment: seg.clone() },
                    );
                }
                ready.push(seg.clone());
            }
            ready.push(seg);
        }

        let swaps = self.shuffle(&mut ready);
        if swaps > 0 {
            self.stats.reordered += swaps;
            if let Some(v) = viz.as_deref_mut() {
                v.record(now.0, Some(&self.name), VizEventKind::Reorder { swaps });
            }
        }

        self.stats.delivered += ready.len() as u64;
        debug!(
            delivered = ready.len(),
            delayed = self.delayed.len(),
            "通道推进完成"
        );
        self.inbox.extend(ready);
    }

    fn roll(&mut self, ratio: f64) -> bool {
        ratio > 0.0 && self.rng.gen_bool(ratio)
    }

    /// 以 `reorder_ratio` 概率把每个位置与另一个随机位置交换，返回交换次数。
    fn shuffle(&mut self, segs: &mut [Segment]) -> u64 {
        if segs.len() < 2 {
            return 0;
        }
        let mut swaps = 0;
        for i in 0..segs.len() {
            if self.roll(self.cfg.reorder_ratio) {
                let j = self.rng.gen_range(0..segs.len());
                if i != j {
                    segs.swap(i, j);
                    swaps += 1;
                }
            }
        }
        swaps
    }
}

impl SegmentChannel for UnreliableChannel {
    fn send(&mut self, seg: Segment) {
        self.outbox.push(seg);
    }

    fn receive(&mut self) -> Vec<Segment> {
        std::mem::take(&mut self.inbox)
    }
}
