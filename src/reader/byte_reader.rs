//! 字节读取器
//!
//! 小端序的类型化读取，定宽/变长字符串按调用方提供的代码页解码

use std::io::{Cursor, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::{Encoding, BIG5, GBK};
use glam::{Vec2, Vec3};

use crate::{AssetError, Result};

/// 预分配元素数上限；计数来自不可信数据，容量超出部分随读取增长
pub(crate) const MAX_PREALLOC: usize = 4096;

/// 把不可信的计数收敛为安全的预分配容量
pub(crate) fn reserve_hint(count: usize) -> usize {
    count.min(MAX_PREALLOC)
}

/// 代码页编号映射到具体编码（936 简体 GBK，950 繁体 Big5）
fn encoding_for_codepage(codepage: u16) -> &'static Encoding {
    match codepage {
        950 => BIG5,
        _ => GBK,
    }
}

/// 顺序、可随机定位的小端字节读取器
pub struct ByteReader<R: Read + Seek> {
    inner: R,
    encoding: &'static Encoding,
}

impl<'a> ByteReader<Cursor<&'a [u8]>> {
    /// 从字节切片创建
    pub fn from_bytes(bytes: &'a [u8], codepage: u16) -> Self {
        Self::new(Cursor::new(bytes), codepage)
    }
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(inner: R, codepage: u16) -> Self {
        Self {
            inner,
            encoding: encoding_for_codepage(codepage),
        }
    }

    fn short_read(err: std::io::Error, what: &str) -> AssetError {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            AssetError::MalformedStructure(format!("unexpected end of data while reading {what}"))
        } else {
            AssetError::Io(err)
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(|e| Self::short_read(e, "u8"))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.inner.read_i8().map_err(|e| Self::short_read(e, "i8"))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.inner
            .read_u16::<LittleEndian>()
            .map_err(|e| Self::short_read(e, "u16"))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.inner
            .read_i16::<LittleEndian>()
            .map_err(|e| Self::short_read(e, "i16"))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| Self::short_read(e, "u32"))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.inner
            .read_i32::<LittleEndian>()
            .map_err(|e| Self::short_read(e, "i32"))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.inner
            .read_f32::<LittleEndian>()
            .map_err(|e| Self::short_read(e, "f32"))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(reserve_hint(count));
        let read = (&mut self.inner)
            .take(count as u64)
            .read_to_end(&mut buf)
            .map_err(AssetError::Io)?;
        if read < count {
            return Err(AssetError::MalformedStructure(format!(
                "unexpected end of data while reading byte array ({read} of {count} bytes)"
            )));
        }
        Ok(buf)
    }

    pub fn read_f32s(&mut self, count: usize) -> Result<Vec<f32>> {
        let mut values = Vec::with_capacity(reserve_hint(count));
        for _ in 0..count {
            values.push(self.read_f32()?);
        }
        Ok(values)
    }

    pub fn read_u32s(&mut self, count: usize) -> Result<Vec<u32>> {
        let mut values = Vec::with_capacity(reserve_hint(count));
        for _ in 0..count {
            values.push(self.read_u32()?);
        }
        Ok(values)
    }

    pub fn read_i32s(&mut self, count: usize) -> Result<Vec<i32>> {
        let mut values = Vec::with_capacity(reserve_hint(count));
        for _ in 0..count {
            values.push(self.read_i32()?);
        }
        Ok(values)
    }

    /// 读取定宽字符串，按代码页解码并在首个 NUL 处截断
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let (decoded, _, _) = self.encoding.decode(&bytes[..end]);
        Ok(decoded.into_owned())
    }

    /// 读取 GameBox 空间的二维向量（原始值，不做坐标转换）
    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    /// 读取 GameBox 空间的三维向量（原始值，不做坐标转换）
    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3s(&mut self, count: usize) -> Result<Vec<Vec3>> {
        let mut values = Vec::with_capacity(reserve_hint(count));
        for _ in 0..count {
            values.push(self.read_vec3()?);
        }
        Ok(values)
    }

    /// 绝对定位
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(AssetError::Io)?;
        Ok(())
    }

    /// 当前读取位置
    pub fn position(&mut self) -> Result<u64> {
        self.inner.stream_position().map_err(AssetError::Io)
    }
}
