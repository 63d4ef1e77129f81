//! 一次完整的单向传输
//!
//! client（Sender）经 forward 通道发数据，server（Receiver）经 reverse 通道回 ACK：
//!
//! ```text
//!  client ──forward──▶ server
//!  client ◀──reverse── server
//! ```
//!
//! 每次迭代的顺序：client.tick → server.tick → forward.advance → reverse.advance。
//! server 重组出的长度等于原始数据长度即视为完成。

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use super::simulator::RunOutcome;
use super::time::Iteration;
use super::world::World;
use crate::error::{ConfigError, RdtError};
use crate::net::{ChannelConfig, ChannelHandle, ChannelStats, UnreliableChannel};
use crate::proto::packing::{SEGMENT_SIZE, WINDOW_SIZE};
use crate::proto::{RdtLayer, ReceiverStats, SenderStats};
use crate::viz::{VizEventKind, VizLogger};

/// 传输结束后的汇总（可直接序列化为 JSON）
#[derive(Debug, Clone, Serialize)]
pub struct TransferSummary {
    pub iterations: u64,
    pub completed: bool,
    /// 重组结果与原始数据逐字符一致
    pub intact: bool,
    pub data_chars: usize,
    pub received_chars: usize,
    pub forward: ChannelStats,
    pub reverse: ChannelStats,
    pub sender: Option<SenderStats>,
    pub receiver: Option<ReceiverStats>,
}

pub struct TransferWorld {
    client: RdtLayer,
    server: RdtLayer,
    forward: Rc<RefCell<UnreliableChannel>>,
    reverse: Rc<RefCell<UnreliableChannel>>,
    expected: String,
    expected_chars: usize,
    seed: u64,
    pub viz: Option<VizLogger>,
}

impl TransferWorld {
    pub fn new(
        data: &str,
        forward: ChannelConfig,
        reverse: ChannelConfig,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if data.is_empty() {
            return Err(ConfigError::EmptyData);
        }
        // 两个方向用不同的随机流
        let forward = Rc::new(RefCell::new(UnreliableChannel::new("forward", forward, seed)?));
        let reverse = Rc::new(RefCell::new(UnreliableChannel::new(
            "reverse",
            reverse,
            seed.wrapping_add(1),
        )?));

        let fwd: ChannelHandle = forward.clone();
        let rev: ChannelHandle = reverse.clone();

        let mut client = RdtLayer::new();
        client.set_data_to_send(data)?;
        client.set_send_channel(fwd.clone());
        client.set_receive_channel(rev.clone());

        let mut server = RdtLayer::new();
        server.set_send_channel(rev);
        server.set_receive_channel(fwd);

        Ok(Self {
            client,
            server,
            forward,
            reverse,
            expected: data.to_owned(),
            expected_chars: data.chars().count(),
            seed,
            viz: None,
        })
    }

    /// 开启事件记录，并写入第一条 meta 事件
    pub fn enable_viz(&mut self) {
        let mut v = VizLogger::default();
        v.record(
            0,
            None,
            VizEventKind::Meta {
                data_chars: self.expected_chars,
                segment_size: SEGMENT_SIZE,
                window_size: WINDOW_SIZE,
                seed: self.seed,
            },
        );
        self.viz = Some(v);
    }

    pub fn client(&self) -> &RdtLayer {
        &self.client
    }

    pub fn server(&self) -> &RdtLayer {
        &self.server
    }

    pub fn forward_stats(&self) -> ChannelStats {
        self.forward.borrow().stats
    }

    pub fn reverse_stats(&self) -> ChannelStats {
        self.reverse.borrow().stats
    }

    pub fn is_intact(&self) -> bool {
        self.server.received_data() == self.expected
    }

    /// 汇总本次传输；开启了事件记录时追加一条 done 事件。
    pub fn finish(&mut self, outcome: RunOutcome) -> TransferSummary {
        let summary = TransferSummary {
            iterations: outcome.iterations(),
            completed: outcome.is_completed(),
            intact: self.is_intact(),
            data_chars: self.expected_chars,
            received_chars: self.server.received_data().chars().count(),
            forward: self.forward_stats(),
            reverse: self.reverse_stats(),
            sender: self.client.sender().map(|s| s.stats()),
            receiver: self.server.receiver().map(|r| r.stats()),
        };
        if let Some(v) = self.viz.as_mut() {
            v.record(
                summary.iterations,
                None,
                VizEventKind::Done {
                    iterations: summary.iterations,
                    intact: summary.intact,
                },
            );
        }
        summary
    }
}

impl World for TransferWorld {
    fn on_iteration(&mut self, now: Iteration) -> Result<(), RdtError> {
        self.client.tick()?;
        self.server.tick()?;

        self.forward.borrow_mut().advance(now, self.viz.as_mut());
        self.reverse.borrow_mut().advance(now, self.viz.as_mut());

        let received_chars = self.server.received_data().chars().count();
        let next_expected = self.server.receiver().map_or(1, |r| r.next_expected());
        let last_ack = self.client.sender().map_or(1, |s| s.last_ack());
        let timeout_count = self.client.timeout_count();
        debug!(
            iteration = now.0,
            received_chars, next_expected, last_ack, timeout_count, "迭代结束"
        );
        if let Some(v) = self.viz.as_mut() {
            v.record(
                now.0,
                None,
                VizEventKind::Progress {
                    received_chars,
                    next_expected,
                    last_ack,
                    timeout_count,
                },
            );
        }
        Ok(())
    }

    fn is_done(&self) -> bool {
        self.server.received_data().chars().count() == self.expected_chars
    }
}
