//! 测试用的合成帧构造工具
//!
//! 按 `frame` 模块的固定布局把字段打包进原始字节，供各模块的单元
//! 测试构造已知内容的记录。仅在测试构建中编译。

use crate::frame::{
    CHANNELS_PER_BLOCK, CHANNELS_PER_FRAME, CHANNELS_PER_STREAM, COLDATA_HEADER_WORDS,
    FRAME_BYTES, WIB_HEADER_WORDS, WORD_BYTES, WORDS_PER_BLOCK, WORDS_PER_SEGMENT,
};

/// 全零记录
pub(crate) fn blank_frame() -> [u8; FRAME_BYTES] {
    [0u8; FRAME_BYTES]
}

/// 写入第 `index` 个小端 32 位字
pub(crate) fn set_word(raw: &mut [u8; FRAME_BYTES], index: usize, word: u32) {
    let offset = index * WORD_BYTES;
    raw[offset..offset + WORD_BYTES].copy_from_slice(&word.to_le_bytes());
}

/// 在第 `index` 个字上按位或
pub(crate) fn or_word(raw: &mut [u8; FRAME_BYTES], index: usize, bits: u32) {
    let offset = index * WORD_BYTES;
    let word = u32::from_le_bytes(raw[offset..offset + WORD_BYTES].try_into().unwrap());
    raw[offset..offset + WORD_BYTES].copy_from_slice(&(word | bits).to_le_bytes());
}

/// 写入 48 位时间戳（`z` 标志置 1，counter 置 0）
pub(crate) fn set_timestamp(raw: &mut [u8; FRAME_BYTES], timestamp: u64) {
    assert!(timestamp < 1 << 48, "48-bit timestamp form");
    set_word(raw, 2, timestamp as u32);
    set_word(raw, 3, ((timestamp >> 32) & 0xFFFF) as u32 | (1 << 31));
}

/// 写入 WIB 读出标识（word 0 的各字段）
pub(crate) fn set_identity(
    raw: &mut [u8; FRAME_BYTES],
    crate_no: u8,
    slot_no: u8,
    fiber_no: u8,
) {
    or_word(
        raw,
        0,
        ((fiber_no as u32 & 0x07) << 13)
            | ((crate_no as u32 & 0x1F) << 16)
            | ((slot_no as u32 & 0x07) << 21),
    );
}

/// 写入第 `ch` 个电子学通道的 12 位采样值
///
/// 与 `WibFrame::channel` 的位域定位互逆。
pub(crate) fn set_channel(raw: &mut [u8; FRAME_BYTES], ch: usize, value: u16) {
    assert!(ch < CHANNELS_PER_FRAME);
    assert!(value <= 0xFFF, "12-bit sample");

    let block = ch / CHANNELS_PER_BLOCK;
    let stream = (ch % CHANNELS_PER_BLOCK) / CHANNELS_PER_STREAM;
    let pos = ch % CHANNELS_PER_STREAM;
    let segment = (stream / 2) * 2 + pos / 4;
    let base = WIB_HEADER_WORDS
        + block * WORDS_PER_BLOCK
        + COLDATA_HEADER_WORDS
        + segment * WORDS_PER_SEGMENT;

    let v = value as u32;
    let s = (stream % 2) as u32 * 8;

    match pos % 4 {
        0 => or_word(raw, base, ((v & 0xFF) << s) | (((v >> 8) & 0x0F) << (16 + s))),
        1 => {
            or_word(raw, base, (v & 0x0F) << (20 + s));
            or_word(raw, base + 1, ((v >> 4) & 0xFF) << s);
        }
        2 => {
            or_word(raw, base + 1, (v & 0xFF) << (16 + s));
            or_word(raw, base + 2, ((v >> 8) & 0x0F) << s);
        }
        3 => or_word(
            raw,
            base + 2,
            ((v & 0x0F) << (4 + s)) | (((v >> 4) & 0xFF) << (16 + s)),
        ),
        _ => unreachable!(),
    }
}

/// 只带时间戳的记录（其余字段为 0）
pub(crate) fn frame_with_timestamp(timestamp: u64) -> [u8; FRAME_BYTES] {
    let mut raw = blank_frame();
    set_timestamp(&mut raw, timestamp);
    raw
}
