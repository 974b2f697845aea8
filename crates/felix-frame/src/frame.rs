//! # WIB 帧布局解码
//!
//! FELIX 转储文件中单条记录（WIB 帧）的纯位域解码：无 I/O、无堆分配、
//! 无跨记录校验。记录大小常量由本模块定义，文件层的对齐和 seek 运算
//! 都以它为单位。
//!
//! ## 记录布局
//!
//! 一帧固定 464 字节 = 116 个小端 32 位字：
//!
//! ```text
//! word 0..4    WIB header（sof/version/fiber/crate/slot, mm/oos/errors, timestamp）
//! word 4..32   coldata block 0（4 个 header 字 + 8 段 × 3 字 ADC 数据）
//! word 32..60  coldata block 1
//! word 60..88  coldata block 2
//! word 88..116 coldata block 3
//! ```
//!
//! 每个 coldata block 承载 64 个通道（8 条 ADC 流 × 8 通道），全帧共
//! 256 个 12 位 ADC 通道。位域编号从每个字的 bit 0（LSB）向上分配。

// ============================================================
// 布局常量
// ============================================================

/// 每个 32 位字的字节数
pub const WORD_BYTES: usize = 4;

/// 一帧的 32 位字数
pub const FRAME_WORDS: usize = 116;

/// 一帧的字节数（文件对齐单位）
pub const FRAME_BYTES: usize = FRAME_WORDS * WORD_BYTES;

/// WIB header 占用的字数
pub const WIB_HEADER_WORDS: usize = 4;

/// 每帧的 coldata block 数
pub const COLDATA_BLOCKS: usize = 4;

/// 每个 coldata block 的 header 字数
pub const COLDATA_HEADER_WORDS: usize = 4;

/// 每个 coldata block 的 ADC 段数（每段 3 个字，承载两条流的 4 个通道）
pub const SEGMENTS_PER_BLOCK: usize = 8;

/// 每个 ADC 段的字数
pub const WORDS_PER_SEGMENT: usize = 3;

/// 每个 coldata block 的总字数
pub const WORDS_PER_BLOCK: usize =
    COLDATA_HEADER_WORDS + SEGMENTS_PER_BLOCK * WORDS_PER_SEGMENT;

/// 每个 coldata block 的通道数
pub const CHANNELS_PER_BLOCK: usize = 64;

/// 每条 ADC 流的通道数
pub const CHANNELS_PER_STREAM: usize = 8;

/// 每帧的通道总数（电子学通道编号 0..=255）
pub const CHANNELS_PER_FRAME: usize = COLDATA_BLOCKS * CHANNELS_PER_BLOCK;

/// 每个 coldata block 的子 header 字段数（hdr_1..hdr_8，各 4 位）
pub const HDR_FIELDS_PER_BLOCK: usize = 8;

/// 原始字提取返回的槽位数：116 个有效字 + 下标 0 的保留哨兵槽
pub const RAW_BLOCK_WORDS: usize = FRAME_WORDS + 1;

// ============================================================
// 帧视图
// ============================================================

/// 单条 WIB 帧的只读视图
///
/// 借用一块恰好一条记录大小的字节缓冲区，按固定位偏移解出各字段。
/// 视图不拥有数据；`FrameFile::frame` 返回的视图借用读取器的共享
/// 缓冲区，生命周期由借用检查器约束在下一次读取之前。
#[derive(Debug, Clone, Copy)]
pub struct WibFrame<'a> {
    raw: &'a [u8; FRAME_BYTES],
}

impl<'a> WibFrame<'a> {
    /// 从一条完整记录创建视图
    pub fn new(raw: &'a [u8; FRAME_BYTES]) -> Self {
        Self { raw }
    }

    /// 原始记录字节
    pub fn as_bytes(&self) -> &'a [u8; FRAME_BYTES] {
        self.raw
    }

    /// 读取第 `index` 个小端 32 位字
    #[inline]
    fn word(&self, index: usize) -> u32 {
        let offset = index * WORD_BYTES;
        u32::from_le_bytes(self.raw[offset..offset + WORD_BYTES].try_into().unwrap())
    }

    // ============================================================
    // WIB header（word 0..4）
    // ============================================================

    /// 帧起始标记（word 0, bit 0..8）
    pub fn sof(&self) -> u8 {
        (self.word(0) & 0xFF) as u8
    }

    /// 固件版本（word 0, bit 8..13）
    pub fn version(&self) -> u8 {
        ((self.word(0) >> 8) & 0x1F) as u8
    }

    /// 光纤编号（word 0, bit 13..16）
    pub fn fiber_no(&self) -> u8 {
        ((self.word(0) >> 13) & 0x07) as u8
    }

    /// 机箱编号（word 0, bit 16..21）
    pub fn crate_no(&self) -> u8 {
        ((self.word(0) >> 16) & 0x1F) as u8
    }

    /// 槽位编号（word 0, bit 21..24）
    pub fn slot_no(&self) -> u8 {
        ((self.word(0) >> 21) & 0x07) as u8
    }

    /// mismatch 状态位（word 1, bit 0）
    pub fn mm(&self) -> u8 {
        (self.word(1) & 0x01) as u8
    }

    /// out-of-sync 状态位（word 1, bit 1）
    pub fn oos(&self) -> u8 {
        ((self.word(1) >> 1) & 0x01) as u8
    }

    /// WIB 错误标志（word 1, bit 16..32）
    pub fn wib_errors(&self) -> u16 {
        (self.word(1) >> 16) as u16
    }

    /// 64 位时间戳（50 MHz tick 计数）
    ///
    /// 低 32 位在 word 2，bit 32..48 在 word 3 的 bit 0..16。word 3 的
    /// bit 31 是 `z` 标志：为 0 时 counter 字段（bit 16..31）扩展时间戳的
    /// bit 48..63，为 1 时该字段是独立的 WIB 计数器。
    pub fn timestamp(&self) -> u64 {
        let w3 = self.word(3);
        let mut ts = self.word(2) as u64 | (((w3 & 0xFFFF) as u64) << 32);
        if w3 >> 31 == 0 {
            ts |= (((w3 >> 16) & 0x7FFF) as u64) << 48;
        }
        ts
    }

    /// WIB 计数器（仅当 `z` 标志为 1 时有效，否则返回 0）
    pub fn wib_counter(&self) -> u16 {
        let w3 = self.word(3);
        if w3 >> 31 != 0 {
            ((w3 >> 16) & 0x7FFF) as u16
        } else {
            0
        }
    }

    // ============================================================
    // coldata block header（每块 word 0..4）
    // ============================================================

    /// 读取 `block` 块内第 `index` 个字
    #[inline]
    fn coldata_word(&self, block: usize, index: usize) -> u32 {
        debug_assert!(block < COLDATA_BLOCKS);
        self.word(WIB_HEADER_WORDS + block * WORDS_PER_BLOCK + index)
    }

    /// 流 1 错误计数（块内 word 0, bit 0..4）
    pub fn s1_error(&self, block: usize) -> u8 {
        (self.coldata_word(block, 0) & 0x0F) as u8
    }

    /// 流 2 错误计数（块内 word 0, bit 4..8）
    pub fn s2_error(&self, block: usize) -> u8 {
        ((self.coldata_word(block, 0) >> 4) & 0x0F) as u8
    }

    /// 校验和 A（低字节在块内 word 0 bit 16..24，高字节在 word 1 bit 0..8）
    pub fn checksum_a(&self, block: usize) -> u16 {
        let lo = (self.coldata_word(block, 0) >> 16) & 0xFF;
        let hi = self.coldata_word(block, 1) & 0xFF;
        (lo | (hi << 8)) as u16
    }

    /// 校验和 B（低字节在块内 word 0 bit 24..32，高字节在 word 1 bit 8..16）
    pub fn checksum_b(&self, block: usize) -> u16 {
        let lo = (self.coldata_word(block, 0) >> 24) & 0xFF;
        let hi = (self.coldata_word(block, 1) >> 8) & 0xFF;
        (lo | (hi << 8)) as u16
    }

    /// coldata 转换计数（块内 word 1, bit 16..32）
    pub fn coldata_convert_count(&self, block: usize) -> u16 {
        (self.coldata_word(block, 1) >> 16) as u16
    }

    /// 错误寄存器（块内 word 2, bit 0..16）
    pub fn error_register(&self, block: usize) -> u16 {
        (self.coldata_word(block, 2) & 0xFFFF) as u16
    }

    /// 第 `index` 个子 header 字段（4 位；`index` 取 0..8 对应 hdr_1..hdr_8）
    ///
    /// 块内 word 3 的 nibble 存放顺序是 1,3,2,4,5,7,6,8。
    pub fn hdr(&self, block: usize, index: usize) -> u8 {
        const NIBBLE_SHIFT: [u32; HDR_FIELDS_PER_BLOCK] = [0, 8, 4, 12, 16, 24, 20, 28];
        ((self.coldata_word(block, 3) >> NIBBLE_SHIFT[index]) & 0x0F) as u8
    }

    // ============================================================
    // ADC 通道
    // ============================================================

    /// 第 `ch` 个电子学通道的 12 位 ADC 采样值（`ch` 取 0..256）
    ///
    /// 通道按 块 → 流 → 流内位置 定位；每个 3 字段承载相邻两条流
    /// （偶/奇）的 4 个通道，奇数流的位域整体比偶数流高 8 位。12 位
    /// 采样值拆成高低两部分存放，高低位的宽度随流内位置交替。
    pub fn channel(&self, ch: usize) -> u16 {
        debug_assert!(ch < CHANNELS_PER_FRAME);
        let block = ch / CHANNELS_PER_BLOCK;
        let stream = (ch % CHANNELS_PER_BLOCK) / CHANNELS_PER_STREAM;
        let pos = ch % CHANNELS_PER_STREAM;
        let segment = (stream / 2) * 2 + pos / 4;
        let base = WIB_HEADER_WORDS
            + block * WORDS_PER_BLOCK
            + COLDATA_HEADER_WORDS
            + segment * WORDS_PER_SEGMENT;

        let w0 = self.word(base);
        let w1 = self.word(base + 1);
        let w2 = self.word(base + 2);
        // 奇数流的字段整体上移 8 位
        let s = (stream % 2) as u32 * 8;

        match pos % 4 {
            0 => (((w0 >> s) & 0xFF) | (((w0 >> (16 + s)) & 0x0F) << 8)) as u16,
            1 => (((w0 >> (20 + s)) & 0x0F) | (((w1 >> s) & 0xFF) << 4)) as u16,
            2 => (((w1 >> (16 + s)) & 0xFF) | (((w2 >> s) & 0x0F) << 8)) as u16,
            3 => (((w2 >> (4 + s)) & 0x0F) | (((w2 >> (16 + s)) & 0xFF) << 4)) as u16,
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{blank_frame, set_channel, set_timestamp, set_word};

    #[test]
    fn test_layout_constants() {
        assert_eq!(FRAME_BYTES, 464);
        assert_eq!(WORDS_PER_BLOCK, 28);
        assert_eq!(
            WIB_HEADER_WORDS + COLDATA_BLOCKS * WORDS_PER_BLOCK,
            FRAME_WORDS
        );
        assert_eq!(CHANNELS_PER_FRAME, 256);
        assert_eq!(RAW_BLOCK_WORDS, 117);
    }

    #[test]
    fn test_wib_header_fields() {
        let mut raw = blank_frame();
        // sof=0x3C, version=0x15, fiber=5, crate=0x12, slot=6
        set_word(
            &mut raw,
            0,
            0x3C | (0x15 << 8) | (5 << 13) | (0x12 << 16) | (6 << 21),
        );
        // mm=1, oos=1, wib_errors=0xBEEF
        set_word(&mut raw, 1, 0x01 | (0x01 << 1) | (0xBEEF << 16));

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.sof(), 0x3C);
        assert_eq!(frame.version(), 0x15);
        assert_eq!(frame.fiber_no(), 5);
        assert_eq!(frame.crate_no(), 0x12);
        assert_eq!(frame.slot_no(), 6);
        assert_eq!(frame.mm(), 1);
        assert_eq!(frame.oos(), 1);
        assert_eq!(frame.wib_errors(), 0xBEEF);
    }

    #[test]
    fn test_timestamp_counter_mode() {
        let mut raw = blank_frame();
        // z=1：低 48 位是时间戳，counter 字段独立
        set_word(&mut raw, 2, 0x5678_9ABC);
        set_word(&mut raw, 3, 0x1234 | (0x2AAA << 16) | (1 << 31));

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.timestamp(), 0x1234_5678_9ABC);
        assert_eq!(frame.wib_counter(), 0x2AAA);
    }

    #[test]
    fn test_timestamp_extended_mode() {
        let mut raw = blank_frame();
        // z=0：counter 字段扩展时间戳到 63 位
        set_word(&mut raw, 2, 0xFFFF_FFFF);
        set_word(&mut raw, 3, 0xFFFF | (0x7FFF << 16));

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.timestamp(), 0x7FFF_FFFF_FFFF_FFFF);
        assert_eq!(frame.wib_counter(), 0);
    }

    #[test]
    fn test_timestamp_helper_roundtrip() {
        let mut raw = blank_frame();
        set_timestamp(&mut raw, 0xBEEF_CAFE_0123);

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.timestamp(), 0xBEEF_CAFE_0123);
    }

    #[test]
    fn test_coldata_header_fields() {
        let mut raw = blank_frame();
        let base = WIB_HEADER_WORDS + WORDS_PER_BLOCK; // block 1
        // s1=0xA, s2=0x5, checksum_a=0xC3A5, checksum_b=0x1E7B
        set_word(&mut raw, base, 0x0A | (0x05 << 4) | (0xA5 << 16) | (0x7B << 24));
        // checksum 高字节 + convert_count=0xD00D
        set_word(&mut raw, base + 1, 0xC3 | (0x1E << 8) | (0xD00D << 16));
        // error_register=0xFACE
        set_word(&mut raw, base + 2, 0xFACE);

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.s1_error(1), 0x0A);
        assert_eq!(frame.s2_error(1), 0x05);
        assert_eq!(frame.checksum_a(1), 0xC3A5);
        assert_eq!(frame.checksum_b(1), 0x1E7B);
        assert_eq!(frame.coldata_convert_count(1), 0xD00D);
        assert_eq!(frame.error_register(1), 0xFACE);

        // 其余块不受影响
        assert_eq!(frame.checksum_a(0), 0);
        assert_eq!(frame.error_register(3), 0);
    }

    #[test]
    fn test_hdr_nibble_order() {
        let mut raw = blank_frame();
        let base = WIB_HEADER_WORDS; // block 0
        set_word(&mut raw, base + 3, 0x8765_4321);

        let frame = WibFrame::new(&raw);
        let fields: Vec<u8> = (0..HDR_FIELDS_PER_BLOCK).map(|i| frame.hdr(0, i)).collect();
        // nibble 存放顺序 1,3,2,4,5,7,6,8 还原为 hdr_1..hdr_8
        assert_eq!(fields, vec![1, 3, 2, 4, 5, 7, 6, 8]);
    }

    #[test]
    fn test_channel_positions() {
        let mut raw = blank_frame();
        set_channel(&mut raw, 0, 0xABC); // block 0, 偶数流, 位置 0
        set_channel(&mut raw, 1, 0x123); // 位置 1（4+8 位拆分）
        set_channel(&mut raw, 8, 0xF0F); // 奇数流
        set_channel(&mut raw, 12, 0x456); // 奇数流, 第二段
        set_channel(&mut raw, 63, 0xFFF); // block 0 最后一个通道
        set_channel(&mut raw, 64, 0x801); // block 1 第一个通道
        set_channel(&mut raw, 255, 0x7DE); // 最后一个通道

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.channel(0), 0xABC);
        assert_eq!(frame.channel(1), 0x123);
        assert_eq!(frame.channel(8), 0xF0F);
        assert_eq!(frame.channel(12), 0x456);
        assert_eq!(frame.channel(63), 0xFFF);
        assert_eq!(frame.channel(64), 0x801);
        assert_eq!(frame.channel(255), 0x7DE);

        // 未写入的通道保持为 0
        assert_eq!(frame.channel(2), 0);
        assert_eq!(frame.channel(65), 0);
        assert_eq!(frame.channel(128), 0);
    }

    #[test]
    fn test_channel_full_pattern() {
        let mut raw = blank_frame();
        for ch in 0..CHANNELS_PER_FRAME {
            set_channel(&mut raw, ch, ((ch * 5 + 7) & 0xFFF) as u16);
        }

        let frame = WibFrame::new(&raw);
        for ch in 0..CHANNELS_PER_FRAME {
            assert_eq!(
                frame.channel(ch),
                ((ch * 5 + 7) & 0xFFF) as u16,
                "channel {} mismatch",
                ch
            );
        }
    }

    #[test]
    fn test_channel_data_does_not_touch_headers() {
        let mut raw = blank_frame();
        for ch in 0..CHANNELS_PER_FRAME {
            set_channel(&mut raw, ch, 0xFFF);
        }

        let frame = WibFrame::new(&raw);
        assert_eq!(frame.timestamp(), 0);
        assert_eq!(frame.wib_errors(), 0);
        for block in 0..COLDATA_BLOCKS {
            assert_eq!(frame.checksum_a(block), 0);
            assert_eq!(frame.error_register(block), 0);
        }
    }
}
