//! fields 命令
//!
//! 导出窗口内帧的全部解码字段（每帧一行 CSV，全部十进制）

use crate::commands::scan::{ScanArgs, print_summary, report_anomaly};
use anyhow::{Context, Result};
use clap::Args;
use felix_frame::{CHANNELS_PER_FRAME, COLDATA_BLOCKS, HDR_FIELDS_PER_BLOCK, WibFrame};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;

/// 字段导出参数
#[derive(Args, Debug)]
pub struct FieldsCommand {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// 输出文件路径
    #[arg(short, long)]
    pub output: PathBuf,
}

impl FieldsCommand {
    pub fn execute(&self) -> Result<()> {
        // === 1. 打开输入（先校验，坏输入不产生输出文件） ===

        let mut file = self.scan.open_input()?;

        // === 2. 创建输出 ===

        let out = File::create(&self.output)
            .with_context(|| format!("cannot create output file: {}", self.output.display()))?;
        let mut out = BufWriter::new(out);

        // === 3. 扫描循环 ===

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
                write_row(&mut out, &frame)?;
            }

            if scan.done() {
                break;
            }
        }

        out.flush()?;

        // === 4. 汇总 ===

        print_summary(&self.scan, &scan.summary());
        Ok(())
    }
}

/// 一帧的全部解码字段：WIB 头、4 个 coldata 块头、256 个通道
fn write_row<W: Write>(out: &mut W, frame: &WibFrame<'_>) -> Result<()> {
    write!(out, "{}", frame.timestamp())?;
    write!(out, ",{}", frame.slot_no())?;
    write!(out, ",{}", frame.crate_no())?;
    write!(out, ",{}", frame.fiber_no())?;
    write!(out, ",{}", frame.version())?;
    write!(out, ",{}", frame.wib_errors())?;
    write!(out, ",{}", frame.oos())?;
    write!(out, ",{}", frame.mm())?;
    write!(out, ",{}", frame.wib_counter())?;

    for block in 0..COLDATA_BLOCKS {
        write!(out, ",{}", frame.checksum_a(block))?;
        write!(out, ",{}", frame.checksum_b(block))?;
        write!(out, ",{}", frame.error_register(block))?;
        write!(out, ",{}", frame.s1_error(block))?;
        write!(out, ",{}", frame.s2_error(block))?;
        write!(out, ",{}", frame.coldata_convert_count(block))?;
        for field in 0..HDR_FIELDS_PER_BLOCK {
            write!(out, ",{}", frame.hdr(block, field))?;
        }
    }

    for ch in 0..CHANNELS_PER_FRAME {
        write!(out, ",{}", frame.channel(ch))?;
    }
    writeln!(out)?;
    Ok(())
}
