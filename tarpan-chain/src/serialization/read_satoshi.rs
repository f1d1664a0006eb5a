use std::io;

use byteorder::{LittleEndian, ReadBytesExt};

use super::SerializationError;

/// Extends [`Read`] with methods for reading Bitcoin types.
///
/// [`Read`]: https://doc.rust-lang.org/std/io/trait.Read.html
pub trait ReadSatoshiExt: io::Read {
    /// Reads a `u64` using the Bitcoin `CompactSize` encoding.
    #[inline]
    fn read_compactsize(&mut self) -> Result<u64, SerializationError> {
        let flag_byte = self.read_u8()?;
        match flag_byte {
            0xff => Ok(self.read_u64::<LittleEndian>()?),
            0xfe => Ok(self.read_u32::<LittleEndian>()? as u64),
            0xfd => Ok(self.read_u16::<LittleEndian>()? as u64),
            n => Ok(n as u64),
        }
    }

    /// Convenience method to read a `[u8; 4]`.
    #[inline]
    fn read_4_bytes(&mut self) -> io::Result<[u8; 4]> {
        let mut bytes = [0; 4];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Convenience method to read a `[u8; 32]`.
    #[inline]
    fn read_32_bytes(&mut self) -> io::Result<[u8; 32]> {
        let mut bytes = [0; 32];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

/// Mark all types implementing `Read` as implementing the extension.
impl<R: io::Read + ?Sized> ReadSatoshiExt for R {}
