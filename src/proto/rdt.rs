//! RDT 层
//!
//! 驱动方看到的接口：设置收发通道、设置待发数据、每次迭代调用一次 [`RdtLayer::tick`]、
//! 随时读取已重组的数据。
//!
//! 角色在第一次 tick 时一次性确定：配置了待发数据的是 Sender，否则是 Receiver。
//! 两种角色的状态分别由 [`SenderEngine`] / [`ReceiverEngine`] 独占，挂在 [`Role`] 变体上。

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::receiver::ReceiverEngine;
use super::sender::SenderEngine;
use crate::error::{ChannelSide, RdtError};
use crate::net::{CORRUPTION_MARKER, ChannelHandle, Segment};
use crate::sim::Iteration;

/// 角色（不携带状态的标签，用于日志/报错/查询）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Undetermined,
    Sender,
    Receiver,
}

/// 角色及其独占状态
#[derive(Debug, Default)]
pub enum Role {
    #[default]
    Undetermined,
    Sender(SenderEngine),
    Receiver(ReceiverEngine),
}

impl Role {
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Undetermined => RoleKind::Undetermined,
            Role::Sender(_) => RoleKind::Sender,
            Role::Receiver(_) => RoleKind::Receiver,
        }
    }
}

#[derive(Debug, Default)]
pub struct RdtLayer {
    send_channel: Option<ChannelHandle>,
    receive_channel: Option<ChannelHandle>,
    /// 第一次 tick 前设置的待发数据
    pending_data: String,
    role: Role,
    current_iteration: Iteration,
}

impl RdtLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_send_channel(&mut self, channel: ChannelHandle) {
        self.send_channel = Some(channel);
    }

    pub fn set_receive_channel(&mut self, channel: ChannelHandle) {
        self.receive_channel = Some(channel);
    }

    /// 设置待发送的数据；必须在第一次 tick 之前调用才会成为 Sender。
    pub fn set_data_to_send(&mut self, data: impl Into<String>) -> Result<(), RdtError> {
        if !matches!(self.role, Role::Undetermined) {
            return Err(RdtError::RoleFixed(self.role.kind()));
        }
        let data = data.into();
        if let Some(index) = data.chars().position(|c| c == CORRUPTION_MARKER) {
            return Err(RdtError::ReservedMarker { index });
        }
        self.pending_data = data;
        Ok(())
    }

    /// 当前已重组的数据（Receiver）。
    ///
    /// Sender 不重组任何数据，总是返回空串；未确定角色时同样为空。
    pub fn received_data(&self) -> &str {
        match &self.role {
            Role::Receiver(r) => r.reassembled(),
            _ => "",
        }
    }

    /// 当前的重传计数（诊断用，仅 Sender 非零）
    pub fn timeout_count(&self) -> u32 {
        match &self.role {
            Role::Sender(s) => s.timeout_count(),
            _ => 0,
        }
    }

    pub fn role(&self) -> RoleKind {
        self.role.kind()
    }

    pub fn current_iteration(&self) -> Iteration {
        self.current_iteration
    }

    pub fn sender(&self) -> Option<&SenderEngine> {
        match &self.role {
            Role::Sender(s) => Some(s),
            _ => None,
        }
    }

    pub fn receiver(&self) -> Option<&ReceiverEngine> {
        match &self.role {
            Role::Receiver(r) => Some(r),
            _ => None,
        }
    }

    /// 一个时间片：推进迭代计数，先发送阶段，再接收并响应。
    pub fn tick(&mut self) -> Result<(), RdtError> {
        let send = self
            .send_channel
            .clone()
            .ok_or(RdtError::ChannelNotSet(ChannelSide::Send))?;
        let recv = self
            .receive_channel
            .clone()
            .ok_or(RdtError::ChannelNotSet(ChannelSide::Receive))?;

        self.current_iteration = self.current_iteration.next();
        if matches!(self.role, Role::Undetermined) {
            self.select_role();
        }

        self.process_send(&send);
        self.process_receive_and_respond(&recv, &send);
        Ok(())
    }

    /// 一次性的角色转换：Undetermined -> Sender | Receiver
    fn select_role(&mut self) {
        let data = std::mem::take(&mut self.pending_data);
        self.role = if data.is_empty() {
            Role::Receiver(ReceiverEngine::new())
        } else {
            Role::Sender(SenderEngine::new(&data))
        };
        info!(
            role = ?self.role.kind(),
            data_chars = data.chars().count(),
            iteration = self.current_iteration.0,
            "角色已确定"
        );
    }

    fn process_send(&mut self, send: &ChannelHandle) {
        // Receiver 的发送阶段是空操作
        let Role::Sender(sender) = &mut self.role else {
            return;
        };
        let out = sender.send_phase();
        let mut ch = send.borrow_mut();
        for seg in out {
            ch.send(seg);
        }
    }

    fn process_receive_and_respond(&mut self, recv: &ChannelHandle, send: &ChannelHandle) {
        let incoming = recv.borrow_mut().receive();
        let iteration = self.current_iteration.0;

        match &mut self.role {
            Role::Sender(sender) => {
                let mut acks = Vec::with_capacity(incoming.len());
                let mut stray = 0usize;
                for seg in incoming {
                    match seg {
                        Segment::Ack(a) => acks.push(a),
                        Segment::Data(_) => stray += 1,
                    }
                }
                if stray > 0 {
                    warn!(count = stray, iteration, "Sender 收到数据段，忽略");
                }
                sender.on_acks(acks);
            }
            Role::Receiver(receiver) => {
                let mut data = Vec::new();
                for seg in incoming {
                    match seg {
                        Segment::Data(d) => data.push(d),
                        Segment::Ack(a) => trace!(?a, iteration, "Receiver 收到 ACK，忽略"),
                    }
                }
                let acks = receiver.on_segments(data);
                debug!(
                    acks = acks.len(),
                    received_chars = receiver.reassembled().chars().count(),
                    iteration,
                    "回送 ACK"
                );
                let mut ch = send.borrow_mut();
                for a in acks {
                    ch.send(a.into());
                }
            }
            Role::Undetermined => {}
        }
    }
}
