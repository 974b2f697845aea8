//! words 命令
//!
//! 导出窗口内帧的原始 32-bit 字（每字一行）

use crate::commands::scan::{ScanArgs, print_summary, report_anomaly};
use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// 原始字导出参数
#[derive(Args, Debug)]
pub struct WordsCommand {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// 输出文件路径（缺省为输入路径加 `.33b` 后缀）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl WordsCommand {
    /// 实际输出路径
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => {
                let mut os = self.scan.input.clone().into_os_string();
                os.push(".33b");
                PathBuf::from(os)
            },
        }
    }

    pub fn execute(&self) -> Result<()> {
        // === 1. 打开输入（先校验，坏输入不产生输出文件） ===

        let mut file = self.scan.open_input()?;

        // === 2. 创建输出 ===

        let output = self.output_path();
        info!("Writing frame words to {}", output.display());
        let out = File::create(&output)
            .with_context(|| format!("cannot create output file: {}", output.display()))?;
        let mut out = BufWriter::new(out);

        // === 3. 扫描循环 ===

        let limit = self.scan.frame_limit(file.frame_count());
        let mut scan = self.scan.frame_scan();

        for index in 0..limit {
            let timestamp = match file.frame(index) {
                Some(frame) => frame.timestamp(),
                None => {
                    warn!("Frame {} unreadable, stopping scan", index);
                    break;
                },
            };

            let step = scan.step(index, timestamp);
            if let Some(anomaly) = step.anomaly {
                report_anomaly(&anomaly, step.selected);
            }

            if step.selected {
                let Some(words) = file.frame_words(index) else {
                    warn!("Frame {} unreadable, stopping scan", index);
                    break;
                };
                // 哨兵槽（下标 0）不输出
                for &word in &words[1..] {
                    writeln!(out, "{:#010x} 1", word)?;
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::scan::{ContinuityArg, PolicyArg};

    fn command(output: Option<PathBuf>) -> WordsCommand {
        WordsCommand {
            scan: ScanArgs {
                input: PathBuf::from("run42.dump"),
                first: 1000,
                last: 1250,
                frames: -1,
                policy: PolicyArg::Threshold,
                guard: 1600,
                continuity: ContinuityArg::Always,
                stop_on_close: false,
            },
            output,
        }
    }

    #[test]
    fn test_default_output_appends_33b() {
        let cmd = command(None);
        assert_eq!(cmd.output_path(), PathBuf::from("run42.dump.33b"));
    }

    #[test]
    fn test_explicit_output_wins() {
        let cmd = command(Some(PathBuf::from("elsewhere.txt")));
        assert_eq!(cmd.output_path(), PathBuf::from("elsewhere.txt"));
    }
}
