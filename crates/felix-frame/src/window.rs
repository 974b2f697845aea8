//! # 时间戳窗口与连续性检查
//!
//! 对按文件顺序给出的帧时间戳维护两台小状态机：
//!
//! - [`WindowFilter`]：判定每一帧是否落在调用方指定的时间戳窗口内。
//!   两种判定策略合并为一个带参枚举 [`WindowPolicy`]，由调用方显式
//!   选择，而不是各工具各写一份。
//! - [`ContinuityMonitor`]：相邻两帧的时间戳间隔必须恰好是固定步长
//!   （50 MHz 时钟下 25 tick）；偏离只计数和上报，从不中断处理。
//!
//! [`FrameScan`] 把两台状态机按 [`ScanConfig`] 组合成单次扫描的完整
//! 判定流程，扫描循环本身（逐下标驱动读取器）由调用方持有。

/// 相邻帧的期望时间戳步长（tick）
pub const TICK_STRIDE: u64 = 25;

/// threshold 策略的默认关闭余量：一整个读出块的 tick 数
pub const DEFAULT_WINDOW_GUARD: u64 = 64 * TICK_STRIDE;

// ============================================================
// 窗口
// ============================================================

/// 窗口判定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowPolicy {
    /// 阈值判定：`timestamp >= first` 时打开，`timestamp >= last + guard`
    /// 时永久关闭。`guard` 吸收边界选取上的 off-by-one。
    Threshold { guard: u64 },

    /// 精确匹配：`timestamp == first` 时打开，`timestamp == last` 时关闭
    /// （关闭边界那一帧不选中）。
    ///
    /// 前置条件：两个边界必须是文件中真实出现的帧时间戳，否则窗口
    /// 永远不会打开。调用方应检查 [`WindowFilter::ever_opened`]。
    ExactMatch,
}

/// 调用方指定的时间戳窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    pub first: u64,
    pub last: u64,
    pub policy: WindowPolicy,
}

impl Window {
    pub fn new(first: u64, last: u64, policy: WindowPolicy) -> Self {
        Self { first, last, policy }
    }

    /// 默认余量的阈值窗口
    pub fn threshold(first: u64, last: u64) -> Self {
        Self::new(first, last, WindowPolicy::Threshold { guard: DEFAULT_WINDOW_GUARD })
    }

    /// 精确匹配窗口
    pub fn exact(first: u64, last: u64) -> Self {
        Self::new(first, last, WindowPolicy::ExactMatch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowState {
    Pending,
    Open,
    Closed,
}

/// 单次扫描的窗口状态机
///
/// 初始在窗口外；每帧调用一次 [`admit`](WindowFilter::admit)，按策略
/// 迁移状态并返回该帧是否选中。threshold 的关闭是锁存的；exact-match
/// 关闭后若再次出现 `first` 时间戳会重新打开（与边界同为字面时间戳的
/// 前置条件一致）。
#[derive(Debug)]
pub struct WindowFilter {
    window: Window,
    state: WindowState,
    opened: bool,
}

impl WindowFilter {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            state: WindowState::Pending,
            opened: false,
        }
    }

    /// 按文件顺序送入下一帧的时间戳，返回该帧是否在窗口内
    pub fn admit(&mut self, timestamp: u64) -> bool {
        match self.window.policy {
            WindowPolicy::Threshold { guard } => {
                if self.state == WindowState::Pending && timestamp >= self.window.first {
                    self.state = WindowState::Open;
                    self.opened = true;
                }
                if self.state != WindowState::Closed
                    && timestamp >= self.window.last.saturating_add(guard)
                {
                    self.state = WindowState::Closed;
                }
            }
            WindowPolicy::ExactMatch => {
                if timestamp == self.window.first {
                    self.state = WindowState::Open;
                    self.opened = true;
                } else if timestamp == self.window.last {
                    self.state = WindowState::Closed;
                }
            }
        }
        self.state == WindowState::Open
    }

    /// 窗口是否曾经打开过（exact-match 前置条件诊断用）
    pub fn ever_opened(&self) -> bool {
        self.opened
    }

    /// 窗口是否已关闭
    pub fn closed(&self) -> bool {
        self.state == WindowState::Closed
    }
}

// ============================================================
// 连续性检查
// ============================================================

/// 一次相邻帧时间戳间隔异常
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContinuityAnomaly {
    /// 当前帧（配对中靠后一帧）的文件下标
    pub index: u64,
    /// 前一帧的时间戳
    pub prev: u64,
    /// 当前帧的时间戳
    pub timestamp: u64,
}

impl ContinuityAnomaly {
    /// 实际间隔（回绕减法，时间戳倒退时给出补码形式的大间隔）
    pub fn gap(&self) -> u64 {
        self.timestamp.wrapping_sub(self.prev)
    }
}

/// 相邻帧时间戳连续性监视器
///
/// 第一帧只建立基线，从不触发。检出异常后基线重置，下一帧重新建立：
/// 一次不连续事件只上报一次，而不是被跨越它的每个配对重复上报。
#[derive(Debug)]
pub struct ContinuityMonitor {
    stride: u64,
    prev: Option<u64>,
}

impl ContinuityMonitor {
    pub fn new(stride: u64) -> Self {
        Self { stride, prev: None }
    }

    /// 按文件顺序送入 `(下标, 时间戳)`，间隔异常时返回记录
    pub fn observe(&mut self, index: u64, timestamp: u64) -> Option<ContinuityAnomaly> {
        let anomaly = match self.prev {
            Some(prev) if timestamp.wrapping_sub(prev) != self.stride => {
                Some(ContinuityAnomaly {
                    index,
                    prev,
                    timestamp,
                })
            }
            _ => None,
        };
        self.prev = if anomaly.is_some() { None } else { Some(timestamp) };
        anomaly
    }
}

/// 连续性检查的生效范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContinuityScope {
    /// 对扫描到的每一帧都检查
    Always,
    /// 只对窗口内的帧上报（基线仍然逐帧更新）
    InsideWindow,
}

// ============================================================
// 扫描组合
// ============================================================

/// 单次扫描的配置
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanConfig {
    pub window: Window,
    pub continuity: ContinuityScope,
    pub stride: u64,
    /// 窗口关闭后是否提前结束扫描（默认扫到文件尾或帧数上限）
    pub stop_on_close: bool,
}

impl ScanConfig {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            continuity: ContinuityScope::Always,
            stride: TICK_STRIDE,
            stop_on_close: false,
        }
    }
}

/// 一帧的判定结果
#[derive(Debug, Clone, Copy)]
pub struct ScanStep {
    /// 该帧是否在窗口内（应被输出）
    pub selected: bool,
    /// 按范围过滤后的连续性异常
    pub anomaly: Option<ContinuityAnomaly>,
}

/// 扫描结束时的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanSummary {
    pub frames_scanned: u64,
    pub frames_selected: u64,
    pub anomalies: u64,
    pub window_opened: bool,
}

/// 窗口过滤 + 连续性检查的组合状态机
#[derive(Debug)]
pub struct FrameScan {
    filter: WindowFilter,
    monitor: ContinuityMonitor,
    continuity: ContinuityScope,
    stop_on_close: bool,
    frames_scanned: u64,
    frames_selected: u64,
    anomalies: u64,
}

impl FrameScan {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            filter: WindowFilter::new(config.window),
            monitor: ContinuityMonitor::new(config.stride),
            continuity: config.continuity,
            stop_on_close: config.stop_on_close,
            frames_scanned: 0,
            frames_selected: 0,
            anomalies: 0,
        }
    }

    /// 送入下一帧，返回选中与异常判定
    pub fn step(&mut self, index: u64, timestamp: u64) -> ScanStep {
        self.frames_scanned += 1;

        let selected = self.filter.admit(timestamp);
        if selected {
            self.frames_selected += 1;
        }

        let anomaly = match self.monitor.observe(index, timestamp) {
            Some(anomaly) if self.continuity == ContinuityScope::Always || selected => {
                self.anomalies += 1;
                Some(anomaly)
            }
            _ => None,
        };

        ScanStep { selected, anomaly }
    }

    /// 扫描是否应该提前结束（仅 `stop_on_close` 配置下为真）
    pub fn done(&self) -> bool {
        self.stop_on_close && self.filter.closed()
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            frames_scanned: self.frames_scanned,
            frames_selected: self.frames_selected,
            anomalies: self.anomalies,
            window_opened: self.filter.ever_opened(),
        }
    }
}
