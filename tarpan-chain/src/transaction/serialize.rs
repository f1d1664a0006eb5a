use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::serialization::{SatoshiDeserialize, SatoshiSerialize, SerializationError};

use super::{LockTime, Transaction};

impl SatoshiSerialize for Transaction {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u32::<LittleEndian>(self.version)?;
        self.inputs.satoshi_serialize(&mut writer)?;
        self.outputs.satoshi_serialize(&mut writer)?;
        self.lock_time.satoshi_serialize(&mut writer)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Transaction {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Transaction {
            version: reader.read_u32::<LittleEndian>()?,
            inputs: Vec::satoshi_deserialize(&mut reader)?,
            outputs: Vec::satoshi_deserialize(&mut reader)?,
            lock_time: LockTime::satoshi_deserialize(&mut reader)?,
        })
    }
}
