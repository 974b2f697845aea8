//! 通道映射
//!
//! 把帧头中的读出身份（crate/slot/fiber）加电子学通道号映射为离线
//! 通道编号。映射表随装置变化，这里只定义接口和默认的恒等实现；
//! 接入真实探测器映射时实现 [`ChannelMap`] 即可。

/// 读出身份 + 电子学通道号 → 离线通道编号
pub trait ChannelMap {
    fn offline_channel(&self, crate_no: u8, slot_no: u8, fiber_no: u8, channel: usize) -> u32;
}

/// 恒等映射：离线编号就是电子学通道号
#[derive(Debug, Default)]
pub struct IdentityMap;

impl ChannelMap for IdentityMap {
    fn offline_channel(&self, _crate_no: u8, _slot_no: u8, _fiber_no: u8, channel: usize) -> u32 {
        channel as u32
    }
}
