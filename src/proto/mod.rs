//! 传输层/协议模块
//!
//! 可靠数据传输（RDT）的发送方窗口/重传引擎与接收方重组/累计确认引擎。

pub mod packing;
pub mod rdt;
pub mod receiver;
pub mod sender;

pub use rdt::{RdtLayer, Role, RoleKind};
pub use receiver::{ReceiverEngine, ReceiverStats};
pub use sender::{SenderEngine, SenderStats};
