use bytes::BufMut;

use crate::{
    constants::RLP_EMPTY_LIST,
    decode::{decode_rlp_item, RLPDecode},
    encode::{encode_length, RLPEncode},
    error::RLPDecodeError,
};

/// Builds the RLP list encoding of a struct field by field.
///
/// ```ignore
/// Encoder::new(buf)
///     .encode_field(&value.nonce)
///     .encode_field(&value.data)
///     .finish();
/// ```
#[must_use = "the list header is only written by finish()"]
pub struct Encoder<'a> {
    buf: &'a mut dyn BufMut,
    payload: Vec<u8>,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut dyn BufMut) -> Self {
        Self {
            buf,
            payload: Vec::new(),
        }
    }

    pub fn encode_field<T: RLPEncode + ?Sized>(mut self, value: &T) -> Self {
        value.encode(&mut self.payload);
        self
    }

    /// Encodes the value if present; absent values add nothing to the list.
    pub fn encode_optional_field<T: RLPEncode>(mut self, value: &Option<T>) -> Self {
        if let Some(value) = value {
            value.encode(&mut self.payload);
        }
        self
    }

    /// Writes the list header followed by the accumulated payload.
    pub fn finish(self) {
        encode_length(self.payload.len(), RLP_EMPTY_LIST, self.buf);
        self.buf.put_slice(&self.payload);
    }
}

/// Walks the RLP list encoding of a struct field by field.
///
/// ```ignore
/// let decoder = Decoder::new(rlp)?;
/// let (nonce, decoder) = decoder.decode_field("nonce")?;
/// let (data, decoder) = decoder.decode_field("data")?;
/// let rest = decoder.finish()?;
/// ```
#[derive(Debug)]
#[must_use = "leftover payload is only checked by finish()"]
pub struct Decoder<'a> {
    payload: &'a [u8],
    remaining: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(rlp: &'a [u8]) -> Result<Self, RLPDecodeError> {
        match decode_rlp_item(rlp)? {
            (true, payload, remaining) => Ok(Self { payload, remaining }),
            (false, ..) => Err(RLPDecodeError::UnexpectedString),
        }
    }

    pub fn decode_field<T: RLPDecode>(
        self,
        name: &'static str,
    ) -> Result<(T, Self), RLPDecodeError> {
        if self.payload.is_empty() {
            return Err(RLPDecodeError::MissingField(name));
        }
        let (field, payload) = T::decode_unfinished(self.payload)?;
        Ok((field, Self { payload, ..self }))
    }

    /// Decodes one more field if the list has one left, `None` otherwise.
    pub fn decode_optional_field<T: RLPDecode>(self) -> Result<(Option<T>, Self), RLPDecodeError> {
        if self.payload.is_empty() {
            return Ok((None, self));
        }
        let (field, payload) = T::decode_unfinished(self.payload)?;
        Ok((Some(field), Self { payload, ..self }))
    }

    pub fn is_done(&self) -> bool {
        self.payload.is_empty()
    }

    /// Returns the bytes after the list, failing if the list itself has
    /// undecoded fields left.
    pub fn finish(self) -> Result<&'a [u8], RLPDecodeError> {
        if !self.payload.is_empty() {
            return Err(RLPDecodeError::MalformedData);
        }
        Ok(self.remaining)
    }

    /// Like [`Decoder::finish`], but ignores undecoded fields.
    pub fn finish_unchecked(self) -> &'a [u8] {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_decoder_round_trip() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf)
            .encode_field(&42u64)
            .encode_field(&bytes::Bytes::from_static(b"hello"))
            .finish();

        let decoder = Decoder::new(&buf).unwrap();
        let (number, decoder) = decoder.decode_field::<u64>("number").unwrap();
        let (data, decoder) = decoder.decode_field::<bytes::Bytes>("data").unwrap();
        assert_eq!(number, 42);
        assert_eq!(data.as_ref(), b"hello");
        assert_eq!(decoder.finish().unwrap(), &[] as &[u8]);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).encode_field(&1u8).finish();

        let decoder = Decoder::new(&buf).unwrap();
        let (_, decoder) = decoder.decode_field::<u8>("first").unwrap();
        let err = decoder.decode_field::<u8>("second").unwrap_err();
        assert_eq!(err, RLPDecodeError::MissingField("second"));
    }

    #[test]
    fn optional_field_on_exhausted_list() {
        let mut buf = Vec::new();
        Encoder::new(&mut buf).encode_field(&1u8).finish();

        let decoder = Decoder::new(&buf).unwrap();
        let (_, decoder) = decoder.decode_field::<u8>("first").unwrap();
        let (missing, decoder) = decoder.decode_optional_field::<u64>().unwrap();
        assert!(missing.is_none());
        assert!(decoder.is_done());
    }

    #[test]
    fn decoding_a_byte_string_as_a_struct_fails() {
        let data = bytes::Bytes::from_static(b"not a list").encode_to_vec();
        assert!(matches!(
            Decoder::new(&data),
            Err(RLPDecodeError::UnexpectedString)
        ));
    }
}
