//! 紧凑自动存档格式（.rqa）
//!
//! 16 字节文件头 + Zstd 压缩的 MessagePack 快照。
//! 快照内容与 JSON 导出相同，加载时同样走导入校验。

use crate::error::FileError;
use crate::snapshot::ProjectSnapshot;
use roomquote_core::config::LayoutConfig;
use roomquote_core::model::LayoutDocument;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 文件魔数 "RQAS"
const MAGIC: &[u8; 4] = b"RQAS";

/// 存档格式版本
const ARCHIVE_VERSION: u32 = 1;

/// Zstd 压缩级别
const COMPRESSION_LEVEL: i32 = 3;

/// 文件头
#[derive(Debug, PartialEq)]
struct ArchiveHeader {
    magic: [u8; 4],
    version: u32,
    /// 预留
    flags: u32,
    payload_len: u32,
}

impl ArchiveHeader {
    const SIZE: usize = 16;

    fn new(payload_len: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: ARCHIVE_VERSION,
            flags: 0,
            payload_len,
        }
    }

    fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.flags.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }

    fn read(reader: &mut impl Read) -> Result<Self, FileError> {
        let mut bytes = [0u8; Self::SIZE];
        reader.read_exact(&mut bytes)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a RoomQuote archive".to_string(),
            ));
        }

        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self {
            magic,
            version: word(4),
            flags: word(8),
            payload_len: word(12),
        })
    }
}

/// 编码为存档字节
pub fn encode(doc: &LayoutDocument) -> Result<Vec<u8>, FileError> {
    let snapshot = ProjectSnapshot::capture(doc);
    // 按字段名编码，可选字段缺省时不会错位
    let packed = rmp_serde::to_vec_named(&snapshot)?;
    let compressed = zstd::encode_all(packed.as_slice(), COMPRESSION_LEVEL)?;

    let payload_len = u32::try_from(compressed.len()).map_err(|_| {
        FileError::InvalidFormat(format!("Archive payload too large: {} bytes", compressed.len()))
    })?;

    let mut bytes = Vec::with_capacity(ArchiveHeader::SIZE + compressed.len());
    bytes.extend_from_slice(&ArchiveHeader::new(payload_len).to_bytes());
    bytes.extend_from_slice(&compressed);
    Ok(bytes)
}

/// 从存档字节解码
pub fn decode(mut reader: impl Read, config: &LayoutConfig) -> Result<LayoutDocument, FileError> {
    let header = ArchiveHeader::read(&mut reader)?;
    if header.version > ARCHIVE_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "Archive version {} is newer than supported version {}",
            header.version, ARCHIVE_VERSION
        )));
    }

    let mut compressed = vec![0u8; header.payload_len as usize];
    reader.read_exact(&mut compressed)?;
    let packed = zstd::decode_all(compressed.as_slice())?;
    let snapshot: ProjectSnapshot = rmp_serde::from_slice(&packed)?;
    snapshot.into_document(config)
}

/// 写入自动存档
pub fn save(doc: &LayoutDocument, path: &Path) -> Result<(), FileError> {
    let bytes = encode(doc)?;
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&bytes)?;
    writer.flush()?;

    tracing::info!(
        "Autosaved {} entities to {} ({} bytes)",
        doc.entity_count(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// 读取自动存档
pub fn load(path: &Path, config: &LayoutConfig) -> Result<LayoutDocument, FileError> {
    let reader = BufReader::new(File::open(path)?);
    let doc = decode(reader, config)?;
    tracing::info!(
        "Restored {} entities from {}",
        doc.entity_count(),
        path.display()
    );
    Ok(doc)
}
