use super::error::{DecodeError, DecodeReason};
use alloy_primitives::{Address, U256};
use std::mem::size_of;

/// Decoded item prefix: wire type and payload size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemHeader {
    pub list: bool,
    pub payload_length: usize,
}

pub(crate) enum Node<'a> {
    String(&'a [u8]),
    List(RlpReader<'a>),
}

/// Strict cursor over an RLP buffer.
///
/// Every read validates canonical form before returning, and all errors are
/// reported with the absolute offset into the original input. A reader
/// produced by [`RlpReader::enter_list`] is confined to the list payload.
#[derive(Clone, Debug)]
pub struct RlpReader<'a> {
    buf: &'a [u8],
    offset: usize,
    nested: bool,
}

impl<'a> RlpReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0, nested: false }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn error(&self, reason: DecodeReason) -> DecodeError {
        DecodeError::new(self.offset, reason)
    }

    fn overrun(&self) -> DecodeReason {
        if self.nested {
            DecodeReason::ListOverrun
        } else {
            DecodeReason::InputTooShort
        }
    }

    fn advance(&mut self, n: usize) {
        self.buf = &self.buf[n..];
        self.offset += n;
    }

    /// Parses the prefix at the cursor and moves past it.
    ///
    /// A single byte below 0x80 is its own payload, so nothing is consumed
    /// for it here.
    pub fn read_header(&mut self) -> Result<ItemHeader, DecodeError> {
        let prefix = *self
            .buf
            .first()
            .ok_or_else(|| self.error(DecodeReason::InputTooShort))?;

        let (list, header_len, payload_length) = match prefix {
            0x00..=0x7f => {
                return Ok(ItemHeader { list: false, payload_length: 1 });
            }
            0x80..=0xb7 => {
                let len = usize::from(prefix - 0x80);
                if len == 1 && self.buf.get(1).is_some_and(|&b| b < 0x80) {
                    return Err(self.error(DecodeReason::NonCanonicalSingleByte));
                }
                (false, 1, len)
            }
            0xb8..=0xbf => {
                let len_of_len = usize::from(prefix - 0xb7);
                (false, 1 + len_of_len, self.read_long_length(len_of_len)?)
            }
            0xc0..=0xf7 => (true, 1, usize::from(prefix - 0xc0)),
            0xf8..=0xff => {
                let len_of_len = usize::from(prefix - 0xf7);
                (true, 1 + len_of_len, self.read_long_length(len_of_len)?)
            }
        };

        if payload_length > self.buf.len() - header_len {
            return Err(self.error(self.overrun()));
        }
        self.advance(header_len);
        Ok(ItemHeader { list, payload_length })
    }

    fn read_long_length(&self, len_of_len: usize) -> Result<usize, DecodeError> {
        let bytes = self
            .buf
            .get(1..1 + len_of_len)
            .ok_or_else(|| self.error(self.overrun()))?;
        if bytes[0] == 0 {
            return Err(self.error(DecodeReason::LeadingZeroLength));
        }
        if len_of_len > size_of::<usize>() {
            return Err(self.error(DecodeReason::LengthOverflow));
        }
        let length = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        if length < 56 {
            return Err(self.error(DecodeReason::NonCanonicalSize));
        }
        Ok(length)
    }

    pub(crate) fn read_node(&mut self) -> Result<Node<'a>, DecodeError> {
        let header = self.read_header()?;
        let start = self.offset;
        let buf = self.buf;
        let payload = &buf[..header.payload_length];
        self.advance(header.payload_length);

        if header.list {
            Ok(Node::List(RlpReader { buf: payload, offset: start, nested: true }))
        } else {
            Ok(Node::String(payload))
        }
    }

    /// Reads a string item and returns its payload.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.offset;
        match self.read_node()? {
            Node::String(bytes) => Ok(bytes),
            Node::List(_) => Err(DecodeError::new(start, DecodeReason::UnexpectedList)),
        }
    }

    /// Reads a list item and returns a reader confined to its payload.
    pub fn enter_list(&mut self) -> Result<RlpReader<'a>, DecodeError> {
        let start = self.offset;
        match self.read_node()? {
            Node::List(body) => Ok(body),
            Node::String(_) => Err(DecodeError::new(start, DecodeReason::UnexpectedString)),
        }
    }

    pub fn skip(&mut self) -> Result<(), DecodeError> {
        self.read_node().map(|_| ())
    }

    /// Number of items left in this reader. Only headers are validated.
    pub fn item_count(&self) -> Result<usize, DecodeError> {
        let mut probe = self.clone();
        let mut count = 0;
        while !probe.is_empty() {
            probe.skip()?;
            count += 1;
        }
        Ok(count)
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let start = self.offset;
        let bytes = self.read_bytes()?;
        u64_from_canonical(bytes).map_err(|reason| DecodeError::new(start, reason))
    }

    pub fn read_u256(&mut self) -> Result<U256, DecodeError> {
        let start = self.offset;
        let bytes = self.read_bytes()?;
        u256_from_canonical(bytes).map_err(|reason| DecodeError::new(start, reason))
    }

    /// Reads a recipient: 20 bytes, or the empty string for "none".
    pub fn read_address_or_empty(&mut self) -> Result<Option<Address>, DecodeError> {
        let start = self.offset;
        let bytes = self.read_bytes()?;
        address_from_canonical(bytes).map_err(|reason| DecodeError::new(start, reason))
    }

    /// Fails if any input is left unread.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self.error(DecodeReason::TrailingBytes))
        }
    }
}

fn check_integer(bytes: &[u8], max_bytes: usize) -> Result<(), DecodeReason> {
    if bytes.len() > max_bytes {
        return Err(DecodeReason::IntegerOverflow { max_bytes });
    }
    if bytes.first() == Some(&0) {
        return Err(DecodeReason::LeadingZeroInteger);
    }
    Ok(())
}

pub(crate) fn u64_from_canonical(bytes: &[u8]) -> Result<u64, DecodeReason> {
    check_integer(bytes, size_of::<u64>())?;
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

pub(crate) fn u256_from_canonical(bytes: &[u8]) -> Result<U256, DecodeReason> {
    check_integer(bytes, 32)?;
    Ok(U256::from_be_slice(bytes))
}

pub(crate) fn address_from_canonical(bytes: &[u8]) -> Result<Option<Address>, DecodeReason> {
    match bytes.len() {
        0 => Ok(None),
        20 => Ok(Some(Address::from_slice(bytes))),
        got => Err(DecodeReason::InvalidAddressLength { got }),
    }
}
