//! 传输事件记录（用于离线回放）
//!
//! 设计目标：
//! - **结构化**：用 JSON 事件而不是解析文本日志
//! - **轻量**：事件只存内存，结束后一次性写出
//! - **可回放**：按迭代排序，可按通道/段号过滤

mod types;

pub use types::{VizEvent, VizEventKind, VizLogger};
