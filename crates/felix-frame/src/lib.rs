//! # FELIX Frame
//!
//! FELIX 读出链路 WIB 帧转储的布局解码与文件访问（无采集硬件依赖）
//!
//! ## 模块
//!
//! - `frame`: 464 字节 WIB 帧的字段级解码
//! - `file`: 按记录随机定位的转储文件读取器
//! - `window`: 时间戳窗口过滤与连续性检查
//!
//! ## 字节序
//!
//! 转储文件是 116 个 32-bit 字的小端序列，所有字段先按小端取字、
//! 再在字内按位提取。
//!
//! ## 读取器别名规则
//!
//! [`FrameFile`] 内部只持有一块帧缓冲，[`WibFrame`] 视图借用这块
//! 缓冲，因此视图只在下一次读取前有效。该规则由借用检查器强制，
//! 需要跨读取保留数据时先拷贝 [`WibFrame::as_bytes`]。

pub mod file;
pub mod frame;
pub mod window;

#[cfg(test)]
pub(crate) mod testutil;

// 重新导出常用类型
pub use file::*;
pub use frame::*;
pub use window::*;

use std::path::PathBuf;
use thiserror::Error;

/// 转储文件打开/校验错误类型
///
/// 只在 [`FrameFile::open`] 阶段产生：打开后的逐帧读取以 `Option`
/// 表达越界和截断，不再返回错误。
#[derive(Error, Debug)]
pub enum FrameFileError {
    #[error("cannot open frame file {}: {}", .path.display(), .source)]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot stat frame file {}: {}", .path.display(), .source)]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("frame file {} is empty", .path.display())]
    Empty { path: PathBuf },

    #[error(
        "frame file {} is {} bytes, which is not a multiple of the {}-byte record",
        .path.display(),
        .length,
        .frame_bytes
    )]
    Misaligned {
        path: PathBuf,
        length: u64,
        frame_bytes: usize,
    },
}
