use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
  #[error("invalid header: {0}")]
  InvalidHeader(String),
  #[error("unexpected end of data at offset 0x{offset:X}")]
  Truncated { offset: usize },
  #[error("block decompression produced no data at offset 0x{offset:X}")]
  Decompression { offset: usize },
  #[error("unsupported replay version: {0}")]
  UnsupportedVersion(u32),
  #[error("unknown block id 0x{id:02X} at offset 0x{offset:X}")]
  UnknownBlock { id: u8, offset: usize },
  #[error("unknown action id 0x{id:02X} at offset 0x{offset:X}")]
  UnknownAction { id: u8, offset: usize },
  #[error("read: {0}")]
  Io(#[from] std::io::Error),
  #[error("bin decode: {0}")]
  BinDecode(#[from] w3g_util::error::BinDecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
