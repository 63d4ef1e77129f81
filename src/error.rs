//! 错误类型
//!
//! 协议层面的“失败”（丢包、损坏、重复、乱序）由算法本身处理，不走错误传播；
//! 这里只描述驱动方的使用错误与配置错误。

use std::io;
use std::path::PathBuf;

use crate::proto::RoleKind;

/// 通道方向（用于报错时指明缺失的是哪一个）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSide {
    Send,
    Receive,
}

impl std::fmt::Display for ChannelSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelSide::Send => f.write_str("send"),
            ChannelSide::Receive => f.write_str("receive"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RdtError {
    #[error("{0} channel is not set")]
    ChannelNotSet(ChannelSide),

    #[error("outbound data contains the reserved corruption marker at char {index}")]
    ReservedMarker { index: usize },

    #[error("role is already fixed as {0:?}; outbound data can no longer change")]
    RoleFixed(RoleKind),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ratio `{name}` must be within [0, 1], got {value}")]
    InvalidRatio { name: &'static str, value: f64 },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema_version {0}")]
    UnsupportedSchema(u32),

    #[error("no data to send")]
    EmptyData,

    #[error(transparent)]
    Rdt(#[from] RdtError),
}
