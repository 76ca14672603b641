//! 二进制游标 - 所有格式解码器共用的顺序/随机读取器

mod byte_reader;

pub use byte_reader::ByteReader;
pub(crate) use byte_reader::reserve_hint;
