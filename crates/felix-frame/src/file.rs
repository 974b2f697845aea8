//! # 帧转储文件读取
//!
//! 把一个无头部、无魔数的扁平二进制文件当作 gap-free 的 WIB 帧序列
//! 随机访问。合法性只由一条规则判定：文件长度必须是 464 字节记录的
//! 正整数倍。读取器持有唯一一块可复用的解码缓冲区，返回的帧视图借用
//! 该缓冲区，因此在视图存活期间无法发起下一次读取（别名规则由借用
//! 检查器保证）。

use crate::frame::{FRAME_BYTES, FRAME_WORDS, RAW_BLOCK_WORDS, WORD_BYTES, WibFrame};
use crate::FrameFileError;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 一个已打开并通过长度校验的帧转储文件
///
/// 文件句柄和解码缓冲区随 `FrameFile` 的生命周期释放；构造失败不会
/// 留下打开的句柄。实例之间不共享任何资源。
#[derive(Debug)]
pub struct FrameFile {
    file: File,
    path: PathBuf,
    length: u64,
    frame_count: u64,
    buf: [u8; FRAME_BYTES],
}

impl FrameFile {
    /// 打开并校验一个转储文件
    ///
    /// 文件不存在/不可读、为空、或长度不是记录大小的整数倍时返回
    /// [`FrameFileError`]，不做部分解码。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FrameFileError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| FrameFileError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let length = file
            .metadata()
            .map_err(|source| FrameFileError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        if length == 0 {
            return Err(FrameFileError::Empty {
                path: path.to_path_buf(),
            });
        }
        if length % FRAME_BYTES as u64 != 0 {
            return Err(FrameFileError::Misaligned {
                path: path.to_path_buf(),
                length,
                frame_bytes: FRAME_BYTES,
            });
        }

        let frame_count = length / FRAME_BYTES as u64;
        debug!(
            "Opened frame dump {} ({} bytes, {} frames)",
            path.display(),
            length,
            frame_count
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            length,
            frame_count,
            buf: [0u8; FRAME_BYTES],
        })
    }

    /// 文件字节长度
    pub fn length(&self) -> u64 {
        self.length
    }

    /// 记录总数（length / 464，构造时算好）
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// 打开时的文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取并解码第 `index` 帧
    ///
    /// 每次调用都 seek 到 `index * 464` 再整条读入共享缓冲区，读取
    /// 顺序任意（包括回退）。越界下标或中途读取失败（例如打开后文件
    /// 被截断）返回 `None`，绝不返回半填充的视图。
    pub fn frame(&mut self, index: u64) -> Option<WibFrame<'_>> {
        if index >= self.frame_count {
            return None;
        }
        self.file
            .seek(SeekFrom::Start(index * FRAME_BYTES as u64))
            .ok()?;
        self.file.read_exact(&mut self.buf).ok()?;
        Some(WibFrame::new(&self.buf))
    }

    /// 按字读取第 `index` 帧的原始 32 位字
    ///
    /// 116 个字逐个独立 seek + 读取，失败定位到单个字。返回的数组
    /// 下标 0 是保留哨兵槽（本方法恒置 0，下游二进制导出工具会在此
    /// 写入 end-of-block 标记），有效字占下标 1..=116。越界与 I/O
    /// 失败语义同 [`FrameFile::frame`]。
    pub fn frame_words(&mut self, index: u64) -> Option<[u32; RAW_BLOCK_WORDS]> {
        if index >= self.frame_count {
            return None;
        }

        let base = index * FRAME_BYTES as u64;
        let mut words = [0u32; RAW_BLOCK_WORDS];
        let mut word_buf = [0u8; WORD_BYTES];
        for (offset, slot) in words[1..=FRAME_WORDS].iter_mut().enumerate() {
            self.file
                .seek(SeekFrom::Start(base + (offset * WORD_BYTES) as u64))
                .ok()?;
            self.file.read_exact(&mut word_buf).ok()?;
            *slot = u32::from_le_bytes(word_buf);
        }
        Some(words)
    }
}
