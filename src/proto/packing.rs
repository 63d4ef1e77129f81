//! 段长度网格（4/4/4/3 打包规则）
//!
//! 发送方每 4 个新段为一组，前 3 个是 `SEGMENT_SIZE`，最后一个缩短为
//! `WINDOW_SIZE - 3 * SEGMENT_SIZE`，一组正好填满一个流控窗口。
//! 从流起点（偏移 1）开始，所有段的起点因此落在一个固定的网格上：
//!
//! ```text
//!  1    5    9    13  16   20   24   28  31 ...
//!  |4   |4   |4   |3  |4   |4   |4   |3  |
//! ```
//!
//! 发送方的重传长度与接收方的空洞探测都基于这张网格，两端必须一致。

/// 一个满段的载荷字符数
pub const SEGMENT_SIZE: usize = 4;

/// 流控窗口（字符数）
pub const WINDOW_SIZE: usize = 15;

/// 一组（一个窗口）内的段数
pub const SEGMENTS_PER_BURST: usize = WINDOW_SIZE.div_ceil(SEGMENT_SIZE);

/// 每组最后一个（缩短的）段的长度
pub const SHORT_SEGMENT_SIZE: usize = WINDOW_SIZE - SEGMENT_SIZE * (SEGMENTS_PER_BURST - 1);

/// 组内第 `pos` 个新段的长度
pub const fn burst_segment_len(pos: usize) -> usize {
    if pos % SEGMENTS_PER_BURST == SEGMENTS_PER_BURST - 1 {
        SHORT_SEGMENT_SIZE
    } else {
        SEGMENT_SIZE
    }
}

/// `seq` 若是网格上的段起点，返回该段的标准长度；否则返回 `None`。
pub fn grid_segment_len(seq: u64) -> Option<usize> {
    if seq == 0 {
        return None;
    }
    let r = ((seq - 1) % WINDOW_SIZE as u64) as usize;
    if r % SEGMENT_SIZE != 0 {
        return None;
    }
    Some(burst_segment_len(r / SEGMENT_SIZE))
}

/// 网格上紧随 `seq` 之后的段起点
pub fn next_grid_offset(seq: u64) -> Option<u64> {
    grid_segment_len(seq).map(|len| seq + len as u64)
}
