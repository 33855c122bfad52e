use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use crate::error::RLPDecodeError;

pub trait RLPDecode: Sized {
    /// Decodes one RLP item from the start of `rlp`, returning the value and
    /// the bytes that follow it.
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    /// Decodes one RLP item that must span the whole input.
    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::InvalidLength);
        }
        Ok(decoded)
    }
}

/// Splits the first RLP item of `data` into `(is_list, payload, rest)`.
///
/// Rejects non-canonical headers: long forms used for payloads that fit the
/// short form, length prefixes with leading zero bytes, and single bytes
/// below `0x80` wrapped in a string header.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let first = *data.first().ok_or(RLPDecodeError::InvalidLength)?;
    match first {
        0x00..=0x7f => Ok((false, &data[..1], &data[1..])),
        0x80..=0xb7 => {
            let length = (first - 0x80) as usize;
            let payload = data.get(1..1 + length).ok_or(RLPDecodeError::InvalidLength)?;
            if length == 1 && payload[0] < 0x80 {
                return Err(RLPDecodeError::MalformedData);
            }
            Ok((false, payload, &data[1 + length..]))
        }
        0xb8..=0xbf => {
            let (payload, rest) = decode_long_payload(data, first - 0xb7)?;
            Ok((false, payload, rest))
        }
        0xc0..=0xf7 => {
            let length = (first - 0xc0) as usize;
            let payload = data.get(1..1 + length).ok_or(RLPDecodeError::InvalidLength)?;
            Ok((true, payload, &data[1 + length..]))
        }
        0xf8..=0xff => {
            let (payload, rest) = decode_long_payload(data, first - 0xf7)?;
            Ok((true, payload, rest))
        }
    }
}

fn decode_long_payload(data: &[u8], len_of_len: u8) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let len_of_len = len_of_len as usize;
    let length_bytes = data.get(1..1 + len_of_len).ok_or(RLPDecodeError::InvalidLength)?;
    if length_bytes[0] == 0 {
        return Err(RLPDecodeError::MalformedData);
    }
    let mut length = 0usize;
    for byte in length_bytes {
        length = length
            .checked_mul(256)
            .and_then(|l| l.checked_add(*byte as usize))
            .ok_or(RLPDecodeError::InvalidLength)?;
    }
    if length < 56 {
        return Err(RLPDecodeError::MalformedData);
    }
    let start = 1 + len_of_len;
    let end = start
        .checked_add(length)
        .ok_or(RLPDecodeError::InvalidLength)?;
    let payload = data.get(start..end).ok_or(RLPDecodeError::InvalidLength)?;
    Ok((payload, &data[end..]))
}

/// Whether the first item of `rlp` is a byte string rather than a list.
/// Typed transactions travel over the wire wrapped as byte strings; legacy
/// ones as plain lists.
pub fn is_encoded_as_bytes(rlp: &[u8]) -> Result<bool, RLPDecodeError> {
    let first = rlp.first().ok_or(RLPDecodeError::InvalidLength)?;
    Ok(*first < 0xc0)
}

/// Payload of a byte-string item, without its header.
pub fn get_rlp_bytes_item_payload(rlp: &[u8]) -> Result<&[u8], RLPDecodeError> {
    let (is_list, payload, _) = decode_rlp_item(rlp)?;
    if is_list {
        return Err(RLPDecodeError::UnexpectedList);
    }
    Ok(payload)
}

fn decode_uint_payload(rlp: &[u8], max_size: usize) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(rlp)?;
    if is_list {
        return Err(RLPDecodeError::UnexpectedList);
    }
    if !payload.is_empty() && payload[0] == 0 {
        return Err(RLPDecodeError::NonCanonicalInteger);
    }
    if payload.len() > max_size {
        return Err(RLPDecodeError::InvalidLength);
    }
    Ok((payload, rest))
}

macro_rules! impl_rlp_decode_uint {
    ($($t:ty),+) => {
        $(impl RLPDecode for $t {
            fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                let (payload, rest) = decode_uint_payload(rlp, core::mem::size_of::<$t>())?;
                let mut value: $t = 0;
                for byte in payload {
                    value = value << 8 | *byte as $t;
                }
                Ok((value, rest))
            }
        })+
    };
}

impl_rlp_decode_uint!(u16, u32, u64, u128, usize);

impl RLPDecode for u8 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (payload, rest) = decode_uint_payload(rlp, 1)?;
        Ok((payload.first().copied().unwrap_or_default(), rest))
    }
}

impl RLPDecode for bool {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if is_list {
            return Err(RLPDecodeError::UnexpectedList);
        }
        match payload {
            [] => Ok((false, rest)),
            [0x01] => Ok((true, rest)),
            _ => Err(RLPDecodeError::MalformedBoolean),
        }
    }
}

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (payload, rest) = decode_uint_payload(rlp, 32)?;
        Ok((U256::from_big_endian(payload), rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if is_list {
            return Err(RLPDecodeError::UnexpectedList);
        }
        Ok((Bytes::copy_from_slice(payload), rest))
    }
}

macro_rules! impl_rlp_decode_hash {
    ($($t:ty),+) => {
        $(impl RLPDecode for $t {
            fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                let (is_list, payload, rest) = decode_rlp_item(rlp)?;
                if is_list {
                    return Err(RLPDecodeError::UnexpectedList);
                }
                if payload.len() != <$t>::len_bytes() {
                    return Err(RLPDecodeError::InvalidLength);
                }
                Ok((<$t>::from_slice(payload), rest))
            }
        })+
    };
}

impl_rlp_decode_hash!(Address, H256);

impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, mut payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let mut items = Vec::new();
        while !payload.is_empty() {
            let (item, remaining) = T::decode_unfinished(payload)?;
            items.push(item);
            payload = remaining;
        }
        Ok((items, rest))
    }
}

impl<A: RLPDecode, B: RLPDecode> RLPDecode for (A, B) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::UnexpectedString);
        }
        let (first, payload) = A::decode_unfinished(payload)?;
        let (second, payload) = B::decode_unfinished(payload)?;
        if !payload.is_empty() {
            return Err(RLPDecodeError::MalformedData);
        }
        Ok(((first, second), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::RLPEncode;

    #[test]
    fn decode_uint_round_trip() {
        for value in [0u64, 1, 0x7f, 0x80, 0x5208, u64::MAX] {
            let encoded = value.encode_to_vec();
            assert_eq!(u64::decode(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn reject_uint_with_leading_zero() {
        // 0x5208 encoded with a spurious zero byte in front.
        let encoded = [0x83, 0x00, 0x52, 0x08];
        assert_eq!(
            u64::decode(&encoded),
            Err(RLPDecodeError::NonCanonicalInteger)
        );
        assert_eq!(
            U256::decode(&encoded),
            Err(RLPDecodeError::NonCanonicalInteger)
        );
        // A lone zero byte must be encoded as the empty string.
        assert_eq!(
            u64::decode(&[0x81, 0x00]),
            Err(RLPDecodeError::NonCanonicalInteger)
        );
    }

    #[test]
    fn reject_single_byte_wrapped_in_header() {
        assert_eq!(u64::decode(&[0x81, 0x05]), Err(RLPDecodeError::MalformedData));
    }

    #[test]
    fn reject_long_form_for_short_payload() {
        let mut data = vec![0xb8, 0x02];
        data.extend_from_slice(&[0xaa, 0xbb]);
        assert_eq!(Bytes::decode(&data), Err(RLPDecodeError::MalformedData));
    }

    #[test]
    fn decode_hash_requires_exact_length() {
        let bytes = Bytes::from(vec![0xcd; 21]);
        let encoded = bytes.encode_to_vec();
        assert_eq!(Address::decode(&encoded), Err(RLPDecodeError::InvalidLength));
    }

    #[test]
    fn decode_nested_list() {
        let list = vec![(
            Address::from_low_u64_be(7),
            vec![H256::from_low_u64_be(1), H256::from_low_u64_be(2)],
        )];
        let encoded = list.encode_to_vec();
        let decoded = Vec::<(Address, Vec<H256>)>::decode(&encoded).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn bytes_vs_list_detection() {
        let as_bytes = Bytes::from(vec![0x7e, 0x01]).encode_to_vec();
        assert!(is_encoded_as_bytes(&as_bytes).unwrap());
        assert_eq!(
            get_rlp_bytes_item_payload(&as_bytes).unwrap(),
            &[0x7e, 0x01]
        );
        let as_list = vec![1u8, 2].encode_to_vec();
        assert!(!is_encoded_as_bytes(&as_list).unwrap());
        assert_eq!(
            get_rlp_bytes_item_payload(&as_list),
            Err(RLPDecodeError::UnexpectedList)
        );
    }
}
