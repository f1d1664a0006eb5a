use std::{convert::TryInto, io};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{TimeZone, Utc};

use crate::serialization::{
    ReadSatoshiExt, SatoshiDeserialize, SatoshiSerialize, SerializationError,
};
use crate::work::difficulty::CompactDifficulty;

use super::{merkle, Block, Hash, Header};

impl SatoshiSerialize for Header {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        writer.write_u32::<LittleEndian>(self.version)?;
        self.previous_block_hash.satoshi_serialize(&mut writer)?;
        writer.write_all(&self.merkle_root.0[..])?;
        writer
            .write_u32::<LittleEndian>(self.time.timestamp().try_into().expect("time is in range"))?;
        writer.write_u32::<LittleEndian>(self.difficulty_threshold.0)?;
        writer.write_u32::<LittleEndian>(self.nonce)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Header {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Header {
            version: reader.read_u32::<LittleEndian>()?,
            previous_block_hash: Hash::satoshi_deserialize(&mut reader)?,
            merkle_root: merkle::Root(reader.read_32_bytes()?),
            time: Utc
                .timestamp_opt(reader.read_u32::<LittleEndian>()?.into(), 0)
                .single()
                .expect("all u32 values are valid timestamps"),
            difficulty_threshold: CompactDifficulty(reader.read_u32::<LittleEndian>()?),
            nonce: reader.read_u32::<LittleEndian>()?,
        })
    }
}

impl SatoshiSerialize for Block {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        self.header.satoshi_serialize(&mut writer)?;
        self.transactions.satoshi_serialize(&mut writer)?;
        Ok(())
    }
}

impl SatoshiDeserialize for Block {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Block {
            header: Header::satoshi_deserialize(&mut reader)?,
            transactions: Vec::satoshi_deserialize(&mut reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_vectors;

    #[test]
    fn header_length_matches_the_wire_format() {
        let block = test_vectors::genesis_block();
        assert_eq!(80, block.header.satoshi_serialized_size());
    }

    #[test]
    fn genesis_block_round_trips() {
        let bytes = test_vectors::genesis_block_bytes();
        let block = Block::satoshi_deserialize(&bytes[..]).expect("genesis block parses");

        assert_eq!(bytes, block.satoshi_serialize_to_vec().unwrap());
    }

    #[test]
    fn genesis_block_hash_matches() {
        let block = test_vectors::genesis_block();

        assert_eq!(
            test_vectors::GENESIS_BLOCK_HASH
                .parse::<Hash>()
                .expect("hard-coded hash parses"),
            block.hash()
        );
    }

    #[test]
    fn genesis_merkle_root_matches_the_header() {
        let block = test_vectors::genesis_block();

        let merkle_root = block.transactions.iter().collect::<merkle::Root>();
        assert_eq!(block.header.merkle_root, merkle_root);

        // The genesis block has a single transaction, so the root is the
        // coinbase transaction hash.
        assert_eq!(
            merkle::Root(block.transactions[0].hash().0),
            merkle_root
        );
    }

    #[test]
    fn genesis_header_satisfies_its_own_target() {
        use crate::work::difficulty::{ExpandedDifficulty, MAX_BITS};

        let block = test_vectors::genesis_block();
        assert_eq!(MAX_BITS, block.header.difficulty_threshold);

        let target = block
            .header
            .difficulty_threshold
            .to_expanded()
            .expect("genesis difficulty is valid");
        assert!(block.hash() <= target);
        assert!(target <= ExpandedDifficulty::max_target());
    }
}
