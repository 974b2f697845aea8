//! 扫描参数
//!
//! 三个导出命令共享的输入/窗口/连续性参数，以及扫描循环的公共辅助。

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use felix_frame::{
    ContinuityAnomaly, ContinuityScope, DEFAULT_WINDOW_GUARD, FrameFile, FrameScan, ScanConfig,
    ScanSummary, Window, WindowPolicy,
};
use std::path::PathBuf;
use tracing::warn;

/// 窗口判定策略（命令行形式）
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// `timestamp >= first` 打开，`timestamp >= last + guard` 永久关闭
    Threshold,
    /// `timestamp == first` 打开，`timestamp == last` 关闭（边界帧不选中）
    Exact,
}

/// 连续性检查范围（命令行形式）
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuityArg {
    /// 扫描到的每一帧都上报
    Always,
    /// 只上报窗口内的间隔异常
    Window,
}

/// 三个导出命令共享的扫描参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// 输入转储文件路径
    #[arg(short, long)]
    pub input: PathBuf,

    /// 窗口起始时间戳（tick）
    #[arg(short, long)]
    pub first: u64,

    /// 窗口结束时间戳（tick）
    #[arg(short, long)]
    pub last: u64,

    /// 最多扫描的帧数（-1 表示扫到文件尾）
    #[arg(short = 'n', long, default_value_t = -1, allow_negative_numbers = true)]
    pub frames: i64,

    /// 窗口判定策略
    #[arg(long, value_enum, default_value = "threshold")]
    pub policy: PolicyArg,

    /// threshold 策略的关闭余量（tick）
    #[arg(long, default_value_t = DEFAULT_WINDOW_GUARD)]
    pub guard: u64,

    /// 连续性检查范围
    #[arg(long, value_enum, default_value = "always")]
    pub continuity: ContinuityArg,

    /// 窗口关闭后立即结束扫描
    #[arg(long)]
    pub stop_on_close: bool,
}

impl ScanArgs {
    /// 打开并校验输入文件
    ///
    /// 必须先于输出文件创建调用：坏输入直接退出，不留下部分输出。
    pub fn open_input(&self) -> Result<FrameFile> {
        FrameFile::open(&self.input)
            .with_context(|| format!("invalid frame dump: {}", self.input.display()))
    }

    /// 命令行参数组合成的窗口
    pub fn window(&self) -> Window {
        let policy = match self.policy {
            PolicyArg::Threshold => WindowPolicy::Threshold { guard: self.guard },
            PolicyArg::Exact => WindowPolicy::ExactMatch,
        };
        Window::new(self.first, self.last, policy)
    }

    /// 本次扫描的组合状态机
    pub fn frame_scan(&self) -> FrameScan {
        let mut config = ScanConfig::new(self.window());
        config.continuity = match self.continuity {
            ContinuityArg::Always => ContinuityScope::Always,
            ContinuityArg::Window => ContinuityScope::InsideWindow,
        };
        config.stop_on_close = self.stop_on_close;
        FrameScan::new(config)
    }

    /// 实际扫描上限：-1 代表整个文件，正数截断到文件帧数
    pub fn frame_limit(&self, frame_count: u64) -> u64 {
        if self.frames < 0 {
            frame_count
        } else {
            (self.frames as u64).min(frame_count)
        }
    }
}

/// 上报一次时间戳间隔异常（只告警，不中断扫描）
pub fn report_anomaly(anomaly: &ContinuityAnomaly, selected: bool) {
    warn!(
        "Inter-frame timestamp gap of {} ticks at index {} (ts {:#x}, prev {:#x}, inside_window={})",
        anomaly.gap(),
        anomaly.index,
        anomaly.timestamp,
        anomaly.prev,
        selected
    );
}

/// 扫描结束后的汇总输出
pub fn print_summary(args: &ScanArgs, summary: &ScanSummary) {
    if args.policy == PolicyArg::Exact && !summary.window_opened {
        warn!("Exact-match window never opened: --first must equal a literal frame timestamp");
    }
    println!(
        "✅ {} anomalous gaps in {} frames, {} selected",
        summary.anomalies, summary.frames_scanned, summary.frames_selected
    );
}
