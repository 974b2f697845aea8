//! table 命令
//!
//! 导出窗口内帧的 256 通道 ADC 表格（每帧一行）

use crate::chanmap::{ChannelMap, IdentityMap};
use crate::commands::scan::{ScanArgs, print_summary, report_anomaly};
use anyhow::{Context, Result};
use clap::Args;
use felix_frame::{CHANNELS_PER_FRAME, FrameFile};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;

/// 表格导出参数
#[derive(Args, Debug)]
pub struct TableCommand {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// 输出文件路径
    #[arg(short, long)]
    pub output: PathBuf,
}

impl TableCommand {
    pub fn execute(&self) -> Result<()> {
        // === 1. 打开输入（先校验，坏输入不产生输出文件） ===

        let mut file = self.scan.open_input()?;

        // === 2. 创建输出 ===

        let out = File::create(&self.output)
            .with_context(|| format!("cannot create output file: {}", self.output.display()))?;
        let mut out = BufWriter::new(out);

        // === 3. 表头：用 0 号帧的读出身份映射通道号 ===

        write_header(&mut out, &mut file, &IdentityMap)?;

        // === 4. 扫描循环 ===

        let limit = self.scan.frame_limit(file.frame_count());
        let mut scan = self.scan.frame_scan();

        for index in 0..limit {
            let Some(frame) = file.frame(index) else {
                warn!("Frame {} unreadable, stopping scan", index);
                break;
            };

            let step = scan.step(index, frame.timestamp());
            if let Some(anomaly) = step.anomaly {
                report_anomaly(&anomaly, step.selected);
            }

            if step.selected {
                write!(out, "{:#x} ", frame.timestamp())?;
                for ch in 0..CHANNELS_PER_FRAME {
                    write!(out, "{:>6} ", frame.channel(ch))?;
                }
                writeln!(out)?;
            }

            if scan.done() {
                break;
            }
        }

        out.flush()?;

        // === 5. 汇总 ===

        print_summary(&self.scan, &scan.summary());
        Ok(())
    }
}

/// 表头行：时间戳列的 `0x0` 占位 + 256 个离线通道编号
///
/// 表头一律取 0 号帧的 crate/slot/fiber，与该帧是否被窗口选中无关。
fn write_header<W: Write, M: ChannelMap>(out: &mut W, file: &mut FrameFile, map: &M) -> Result<()> {
    let Some(frame) = file.frame(0) else {
        anyhow::bail!("cannot read frame 0 for the channel header");
    };

    write!(out, "{:<18}", "0x0")?;
    for ch in 0..CHANNELS_PER_FRAME {
        let offline = map.offline_channel(frame.crate_no(), frame.slot_no(), frame.fiber_no(), ch);
        write!(out, "{:>6} ", offline)?;
    }
    writeln!(out)?;
    Ok(())
}
