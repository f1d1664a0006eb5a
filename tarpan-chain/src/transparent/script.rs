//! Bitcoin script encodings.

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::serialization::SerializationError;

use super::opcodes::OpCode;

/// An encoding of a Bitcoin script.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Script(
    /// # Correctness
    ///
    /// Consensus-critical serialization uses [`SatoshiSerialize`].
    /// [`serde`]-based hex serialization must only be used for testing.
    ///
    /// [`SatoshiSerialize`]: crate::serialization::SatoshiSerialize
    #[serde(with = "hex")]
    Vec<u8>,
);

/// A single parsed script operation: an opcode, plus the pushed data for
/// push operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    /// The raw opcode byte.
    pub code: u8,
    /// The data pushed by this operation, if it is a push.
    pub data: Option<Vec<u8>>,
}

impl Script {
    /// Create a new Bitcoin script from its raw bytes.
    /// The raw bytes must not contain the length prefix.
    pub fn new(raw_bytes: &[u8]) -> Self {
        Script(raw_bytes.to_vec())
    }

    /// Return the raw bytes of the script without the length prefix.
    ///
    /// # Correctness
    ///
    /// These raw bytes do not have a length prefix.
    /// The Bitcoin serialization format requires a length prefix; use
    /// `satoshi_serialize` and `satoshi_deserialize` to create byte data
    /// with a length prefix.
    pub fn as_raw_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse the raw bytes into a sequence of operations.
    ///
    /// Returns an error if a push operation runs past the end of the script.
    pub fn parse_ops(&self) -> Result<Vec<Operation>, SerializationError> {
        let bytes = &self.0;
        let mut ops = Vec::new();
        let mut cursor = 0;

        while cursor < bytes.len() {
            let code = bytes[cursor];
            cursor += 1;

            let data_len = match code {
                0x01..=0x4b => Some(code as usize),
                c if c == OpCode::PushData1 as u8 => {
                    let len = *bytes
                        .get(cursor)
                        .ok_or(SerializationError::Parse("truncated push in script"))?;
                    cursor += 1;
                    Some(len as usize)
                }
                c if c == OpCode::PushData2 as u8 => {
                    let end = cursor + 2;
                    if end > bytes.len() {
                        return Err(SerializationError::Parse("truncated push in script"));
                    }
                    let len = LittleEndian::read_u16(&bytes[cursor..end]);
                    cursor = end;
                    Some(len as usize)
                }
                c if c == OpCode::PushData4 as u8 => {
                    let end = cursor + 4;
                    if end > bytes.len() {
                        return Err(SerializationError::Parse("truncated push in script"));
                    }
                    let len = LittleEndian::read_u32(&bytes[cursor..end]);
                    cursor = end;
                    Some(len as usize)
                }
                _ => None,
            };

            let data = match data_len {
                Some(len) => {
                    let end = cursor
                        .checked_add(len)
                        .ok_or(SerializationError::Parse("truncated push in script"))?;
                    if end > bytes.len() {
                        return Err(SerializationError::Parse("truncated push in script"));
                    }
                    let data = bytes[cursor..end].to_vec();
                    cursor = end;
                    Some(data)
                }
                None => None,
            };

            ops.push(Operation { code, data });
        }

        Ok(ops)
    }

    /// Returns true if this script matches the pay-to-script-hash template:
    /// `HASH160 <20-byte hash> EQUAL`.
    pub fn is_pay_to_script_hash(&self) -> bool {
        self.0.len() == 23
            && self.0[0] == OpCode::Hash160 as u8
            && self.0[1] == OpCode::Push20Bytes as u8
            && self.0[22] == OpCode::Equal as u8
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Script")
            .field(&hex::encode(&self.0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_immediate_pushes() {
        let script = Script::new(&[0x02, 0xaa, 0xbb, OpCode::CheckSig as u8]);
        let ops = script.parse_ops().unwrap();

        assert_eq!(2, ops.len());
        assert_eq!(Some(vec![0xaa, 0xbb]), ops[0].data);
        assert_eq!(OpCode::CheckSig as u8, ops[1].code);
        assert_eq!(None, ops[1].data);
    }

    #[test]
    fn parses_pushdata_lengths() {
        let mut bytes = vec![OpCode::PushData1 as u8, 3, 1, 2, 3];
        bytes.extend([OpCode::PushData2 as u8, 2, 0, 0xcc, 0xdd]);
        let ops = Script::new(&bytes).parse_ops().unwrap();

        assert_eq!(Some(vec![1, 2, 3]), ops[0].data);
        assert_eq!(Some(vec![0xcc, 0xdd]), ops[1].data);
    }

    #[test]
    fn rejects_truncated_pushes() {
        assert!(Script::new(&[0x05, 0x01]).parse_ops().is_err());
        assert!(Script::new(&[OpCode::PushData1 as u8]).parse_ops().is_err());
        assert!(Script::new(&[OpCode::PushData2 as u8, 0xff]).parse_ops().is_err());
        assert!(Script::new(&[OpCode::PushData4 as u8, 0xff, 0xff, 0xff, 0xff])
            .parse_ops()
            .is_err());
    }

    #[test]
    fn recognizes_pay_to_script_hash() {
        let mut p2sh = vec![OpCode::Hash160 as u8, OpCode::Push20Bytes as u8];
        p2sh.extend([0x11; 20]);
        p2sh.push(OpCode::Equal as u8);
        assert!(Script::new(&p2sh).is_pay_to_script_hash());

        // One byte short of the template
        assert!(!Script::new(&p2sh[..22]).is_pay_to_script_hash());
        // A pay-to-pubkey script
        assert!(!Script::new(&[0xac]).is_pay_to_script_hash());
    }
}
