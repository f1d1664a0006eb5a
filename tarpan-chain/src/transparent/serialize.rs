use std::io;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    serialization::{
        ReadSatoshiExt, SatoshiDeserialize, SatoshiSerialize, SerializationError, WriteSatoshiExt,
    },
    transaction,
};

use super::{Input, OutPoint, Output, Script};

impl SatoshiSerialize for OutPoint {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_all(&self.hash.0[..])?;
        writer.write_u32::<LittleEndian>(self.index)?;
        Ok(())
    }
}

impl SatoshiDeserialize for OutPoint {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(OutPoint {
            hash: transaction::Hash(reader.read_32_bytes()?),
            index: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl SatoshiSerialize for Script {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_compactsize(self.as_raw_bytes().len() as u64)?;
        writer.write_all(self.as_raw_bytes())?;
        Ok(())
    }
}

impl SatoshiDeserialize for Script {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let len = reader.read_compactsize()?;
        let mut bytes = vec![0; len as usize];
        reader.read_exact(&mut bytes)?;
        Ok(Script::new(&bytes))
    }
}

impl SatoshiSerialize for Input {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.previous_output.satoshi_serialize(&mut writer)?;
        self.unlock_script.satoshi_serialize(&mut writer)?;
        writer.write_u32::<LittleEndian>(self.sequence)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Input {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Input {
            previous_output: OutPoint::satoshi_deserialize(&mut reader)?,
            unlock_script: Script::satoshi_deserialize(&mut reader)?,
            sequence: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl SatoshiSerialize for Output {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.value.satoshi_serialize(&mut writer)?;
        self.lock_script.satoshi_serialize(&mut writer)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Output {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Output {
            value: SatoshiDeserialize::satoshi_deserialize(&mut reader)?,
            lock_script: Script::satoshi_deserialize(&mut reader)?,
        })
    }
}
