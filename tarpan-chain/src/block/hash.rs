use std::{fmt, io};

use crate::serialization::{
    sha256d, ReadSatoshiExt, SatoshiDeserialize, SatoshiSerialize, SerializationError,
};

use super::Header;

/// A SHA-256d hash of a block header.
///
/// This is usually called a 'block hash', as it is frequently used to
/// identify the entire block, since the hash preimage includes the merkle
/// root of the transactions in this block. But technically it is only a
/// hash of the 80-byte block header, not of the transaction bytes.
///
/// Hashes are stored in the internal (little-endian) byte order used for
/// proof-of-work comparisons; `Display` and `FromStr` use the reversed hex
/// form shown by block explorers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl<'a> From<&'a Header> for Hash {
    fn from(header: &'a Header) -> Self {
        let mut hash_writer = sha256d::Writer::default();
        header
            .satoshi_serialize(&mut hash_writer)
            .expect("Writers don't error");
        Self(hash_writer.finish())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.write_str(&hex::encode(reversed))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        f.debug_tuple("block::Hash")
            .field(&hex::encode(reversed))
            .finish()
    }
}

impl std::str::FromStr for Hash {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0; 32];
        if hex::decode_to_slice(s, &mut bytes[..]).is_err() {
            Err(SerializationError::Parse("hex decoding error"))
        } else {
            bytes.reverse();
            Ok(Hash(bytes))
        }
    }
}

impl SatoshiSerialize for Hash {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_all(&self.0)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Hash {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Hash(reader.read_32_bytes()?))
    }
}
