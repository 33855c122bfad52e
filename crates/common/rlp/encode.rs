use bytes::BufMut;
use ethereum_types::{Address, H256, U256};

use crate::constants::RLP_NULL;

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }

    fn length(&self) -> usize {
        self.encode_to_vec().len()
    }
}

/// Writes the header for a byte string of `length` bytes or a list whose
/// payload spans `length` bytes. `offset` is `RLP_NULL` for strings and
/// `RLP_EMPTY_LIST` for lists.
pub(crate) fn encode_length(length: usize, offset: u8, buf: &mut dyn BufMut) {
    if length < 56 {
        buf.put_u8(offset + length as u8);
    } else {
        let be_length = length.to_be_bytes();
        let start = be_length.iter().position(|&b| b != 0).unwrap_or(7);
        let len_of_len = be_length.len() - start;
        buf.put_u8(offset + 55 + len_of_len as u8);
        buf.put_slice(&be_length[start..]);
    }
}

/// Encodes a slice as an RLP byte string.
pub fn encode_bytes(bytes: &[u8], buf: &mut dyn BufMut) {
    if bytes.len() == 1 && bytes[0] < RLP_NULL {
        buf.put_u8(bytes[0]);
    } else {
        encode_length(bytes.len(), RLP_NULL, buf);
        buf.put_slice(bytes);
    }
}

fn encode_uint_bytes(be_bytes: &[u8], buf: &mut dyn BufMut) {
    let start = be_bytes.iter().position(|&b| b != 0).unwrap_or(be_bytes.len());
    encode_bytes(&be_bytes[start..], buf);
}

macro_rules! impl_rlp_encode_uint {
    ($($t:ty),+) => {
        $(impl RLPEncode for $t {
            fn encode(&self, buf: &mut dyn BufMut) {
                encode_uint_bytes(&self.to_be_bytes(), buf);
            }
        })+
    };
}

impl_rlp_encode_uint!(u8, u16, u32, u64, u128, usize);

impl RLPEncode for bool {
    fn encode(&self, buf: &mut dyn BufMut) {
        if *self {
            buf.put_u8(0x01);
        } else {
            buf.put_u8(RLP_NULL);
        }
    }
}

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_uint_bytes(&self.to_big_endian(), buf);
    }
}

// Byte payloads go through `Bytes` (or `encode_bytes` directly): a `Vec<u8>`
// hits the generic list impl below and encodes as a list of integers.
impl RLPEncode for bytes::Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_bytes(self, buf);
    }
}

macro_rules! impl_rlp_encode_hash {
    ($($t:ty),+) => {
        $(impl RLPEncode for $t {
            fn encode(&self, buf: &mut dyn BufMut) {
                encode_bytes(self.as_bytes(), buf);
            }
        })+
    };
}

impl_rlp_encode_hash!(Address, H256);

impl<T: RLPEncode> RLPEncode for Vec<T> {
    fn encode(&self, buf: &mut dyn BufMut) {
        let mut payload = Vec::new();
        for item in self {
            item.encode(&mut payload);
        }
        encode_length(payload.len(), crate::constants::RLP_EMPTY_LIST, buf);
        buf.put_slice(&payload);
    }
}

impl<A: RLPEncode, B: RLPEncode> RLPEncode for (A, B) {
    fn encode(&self, buf: &mut dyn BufMut) {
        let mut payload = Vec::new();
        self.0.encode(&mut payload);
        self.1.encode(&mut payload);
        encode_length(payload.len(), crate::constants::RLP_EMPTY_LIST, buf);
        buf.put_slice(&payload);
    }
}
