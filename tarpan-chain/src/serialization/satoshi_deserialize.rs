use std::{io, sync::Arc};

use super::{ReadSatoshiExt, SerializationError};

/// Consensus-critical deserialization for Bitcoin.
///
/// This trait provides a generic deserialization for consensus-critical
/// formats, such as network messages, transactions, blocks, etc. It is
/// intended for use only when the serialized data is in the canonical
/// Bitcoin wire format.
pub trait SatoshiDeserialize: Sized {
    /// Try to read `self` from the given `reader`.
    fn satoshi_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError>;
}

impl<T: SatoshiDeserialize> SatoshiDeserialize for Vec<T> {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = reader.read_compactsize()?;
        // We don't trust the claimed length enough to preallocate it in full:
        // a malicious message could claim billions of entries.
        let mut vec = Vec::with_capacity(len.min(1024) as usize);
        for _ in 0..len {
            vec.push(T::satoshi_deserialize(&mut reader)?);
        }
        Ok(vec)
    }
}

impl<T: SatoshiDeserialize> SatoshiDeserialize for Arc<T> {
    fn satoshi_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Arc::new(T::satoshi_deserialize(reader)?))
    }
}
