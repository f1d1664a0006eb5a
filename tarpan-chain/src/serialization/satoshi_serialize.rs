use std::{io, sync::Arc};

use super::WriteSatoshiExt;

/// Consensus-critical serialization for Bitcoin.
///
/// This trait provides a generic serialization for consensus-critical
/// formats, such as network messages, transactions, blocks, etc. It is
/// intended for use only in consensus-critical contexts; in other contexts,
/// such as internal storage, it would be preferable to use Serde.
pub trait SatoshiSerialize: Sized {
    /// Write `self` to the given `writer` using the canonical format.
    ///
    /// This function has a `satoshi_` prefix to alert the reader that the
    /// serialization in use is consensus-critical serialization, rather than
    /// some other kind of serialization.
    ///
    /// Notice that the error type is [`std::io::Error`]; this indicates that
    /// serialization MUST be infallible up to errors in the underlying writer.
    /// In other words, any type implementing `SatoshiSerialize` must make
    /// illegal states unrepresentable.
    fn satoshi_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error>;

    /// Helper function to construct a vec to serialize the current struct into
    fn satoshi_serialize_to_vec(&self) -> Result<Vec<u8>, io::Error> {
        let mut data = Vec::new();
        self.satoshi_serialize(&mut data)?;
        Ok(data)
    }

    /// Return the size of `self` in its canonical serialization.
    fn satoshi_serialized_size(&self) -> usize {
        self.satoshi_serialize_to_vec()
            .expect("serialization into a Vec is infallible")
            .len()
    }
}

impl<T: SatoshiSerialize> SatoshiSerialize for Vec<T> {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_compactsize(self.len() as u64)?;
        for x in self {
            x.satoshi_serialize(&mut writer)?;
        }
        Ok(())
    }
}

impl<T: SatoshiSerialize> SatoshiSerialize for Arc<T> {
    fn satoshi_serialize<W: io::Write>(&self, writer: W) -> Result<(), io::Error> {
        self.as_ref().satoshi_serialize(writer)
    }
}
