//! 段（Segment）类型
//!
//! 通道上交换的最小单元：数据段或确认段，二者字段不相交，构造时即确定类别。

use serde::{Deserialize, Serialize};

/// 保留的损坏标记字符：载荷中出现它即视为该段已损坏。
pub const CORRUPTION_MARKER: char = '\u{FFFD}';

/// 通道上传输的段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// 数据段（仅由 Sender 发出）
    Data(DataSegment),
    /// 确认段（仅由 Receiver 发出）
    Ack(AckSegment),
}

/// 数据段：`seq` 是载荷第一个字符的偏移（从 1 开始）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSegment {
    pub seq: u64,
    pub payload: String,
}

/// 确认段：`ack` 是接收方下一个期望的偏移（累计确认）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckSegment {
    pub ack: u64,
    /// 接收方观察到了非期望的段（提示发送方考虑重传）
    pub gap: bool,
}

impl Segment {
    pub fn data(seq: u64, payload: impl Into<String>) -> Self {
        Segment::Data(DataSegment {
            seq,
            payload: payload.into(),
        })
    }

    pub fn ack(ack: u64, gap: bool) -> Self {
        Segment::Ack(AckSegment { ack, gap })
    }

    pub fn as_data(&self) -> Option<&DataSegment> {
        match self {
            Segment::Data(d) => Some(d),
            Segment::Ack(_) => None,
        }
    }

    pub fn as_ack(&self) -> Option<&AckSegment> {
        match self {
            Segment::Ack(a) => Some(a),
            Segment::Data(_) => None,
        }
    }
}

impl DataSegment {
    /// 载荷长度（字符数）
    pub fn len(&self) -> usize {
        self.payload.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// 第一个不属于本段的偏移
    pub fn end(&self) -> u64 {
        self.seq.saturating_add(self.len() as u64)
    }

    pub fn is_corrupted(&self) -> bool {
        self.payload.contains(CORRUPTION_MARKER)
    }

    /// 把第 `at` 个字符替换为损坏标记，返回新的段（越界时原样返回）。
    pub(crate) fn damaged(self, at: usize) -> Self {
        let mut chars: Vec<char> = self.payload.chars().collect();
        if let Some(c) = chars.get_mut(at) {
            *c = CORRUPTION_MARKER;
        }
        DataSegment {
            seq: self.seq,
            payload: chars.into_iter().collect(),
        }
    }
}

impl From<DataSegment> for Segment {
    fn from(d: DataSegment) -> Self {
        Segment::Data(d)
    }
}

impl From<AckSegment> for Segment {
    fn from(a: AckSegment) -> Self {
        Segment::Ack(a)
    }
}
