//! # FELIX CLI
//!
//! FELIX WIB 帧转储的命令行提取工具。
//!
//! ## 子命令
//!
//! ```bash
//! # 窗口内帧的 256 通道 ADC 表格
//! felix-cli table -i run42.dump -o run42.txt -f 26220000000 -l 26220005000
//!
//! # 窗口内帧的原始 32-bit 字（默认输出 <input>.33b）
//! felix-cli words -i run42.dump -f 26220000000 -l 26220005000
//!
//! # 窗口内帧的全部解码字段（CSV）
//! felix-cli fields -i run42.dump -o run42.csv -f 26220000000 -l 26220005000 --policy exact
//! ```
//!
//! 三个子命令共享同一组窗口/连续性参数，见 `--help`。

use anyhow::Result;
use clap::{Parser, Subcommand};

mod chanmap;
mod commands;

use commands::{FieldsCommand, TableCommand, WordsCommand};

/// FELIX CLI - WIB 帧转储提取工具
#[derive(Parser, Debug)]
#[command(name = "felix-cli")]
#[command(about = "Command-line extraction tools for FELIX WIB frame dumps", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 导出窗口内帧的 256 通道 ADC 表格
    Table {
        #[command(flatten)]
        args: TableCommand,
    },

    /// 导出窗口内帧的原始 32-bit 字
    Words {
        #[command(flatten)]
        args: WordsCommand,
    },

    /// 导出窗口内帧的全部解码字段（CSV）
    Fields {
        #[command(flatten)]
        args: FieldsCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("felix_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Table { args } => {
            // ADC 表格导出
            args.execute()
        },

        Commands::Words { args } => {
            // 原始字导出
            args.execute()
        },

        Commands::Fields { args } => {
            // 字段导出
            args.execute()
        },
    }
}
