//! Recursive Length Prefix codec.
//!
//! Encoding goes through [`alloy_rlp::Encodable`]. Decoding is strict: every
//! item must be in its unique canonical form, and the generic decoder walks
//! nested lists with an explicit stack bounded by [`MAX_DEPTH`], so crafted
//! input cannot exhaust the call stack. All decoded bytes are copied out of
//! the input, which keeps allocation proportional to input length.

mod error;
mod reader;

pub use error::{DecodeError, DecodeReason};
pub use reader::{ItemHeader, RlpReader};

pub(crate) use reader::{address_from_canonical, u256_from_canonical, u64_from_canonical};

use alloy_primitives::Bytes;
use alloy_rlp::{BufMut, Encodable, Header};
use reader::Node;
use tracing::trace;

/// Maximum list nesting accepted by [`decode_exact`].
pub const MAX_DEPTH: usize = 128;

/// The only wire-level shape: a byte string or a list of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    String(Bytes),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(bytes) => Some(bytes.as_ref()),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[RlpItem]> {
        match self {
            Self::String(_) => None,
            Self::List(items) => Some(items),
        }
    }

    fn payload_length(items: &[RlpItem]) -> usize {
        items.iter().map(Encodable::length).sum()
    }
}

impl From<&[u8]> for RlpItem {
    fn from(bytes: &[u8]) -> Self {
        Self::String(Bytes::from(bytes.to_vec()))
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        Self::List(items)
    }
}

impl Encodable for RlpItem {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::String(bytes) => bytes.encode(out),
            Self::List(items) => {
                Header { list: true, payload_length: Self::payload_length(items) }.encode(out);
                for item in items {
                    item.encode(out);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::String(bytes) => bytes.length(),
            Self::List(items) => {
                let payload_length = Self::payload_length(items);
                Header { list: true, payload_length }.length() + payload_length
            }
        }
    }
}

/// Decodes exactly one item; trailing bytes are an error.
pub fn decode_exact(bytes: &[u8]) -> Result<RlpItem, DecodeError> {
    let mut reader = RlpReader::new(bytes);
    let item = decode_item(&mut reader)?;
    reader.finish()?;
    Ok(item)
}

struct Frame<'a> {
    body: RlpReader<'a>,
    items: Vec<RlpItem>,
}

impl<'a> Frame<'a> {
    fn new(body: RlpReader<'a>) -> Self {
        Self { body, items: Vec::new() }
    }
}

/// Reads the next item from `reader`, including any nested lists.
pub fn decode_item(reader: &mut RlpReader<'_>) -> Result<RlpItem, DecodeError> {
    let root = match reader.read_node()? {
        Node::String(bytes) => return Ok(RlpItem::from(bytes)),
        Node::List(body) => body,
    };

    let mut parents: Vec<Frame<'_>> = Vec::new();
    let mut frame = Frame::new(root);
    loop {
        if frame.body.is_empty() {
            let item = RlpItem::List(frame.items);
            match parents.pop() {
                Some(mut parent) => {
                    parent.items.push(item);
                    frame = parent;
                }
                None => return Ok(item),
            }
            continue;
        }

        let at = frame.body.offset();
        match frame.body.read_node()? {
            Node::String(bytes) => frame.items.push(RlpItem::from(bytes)),
            Node::List(body) => {
                // `frame` is at depth parents.len() + 1
                if parents.len() + 1 >= MAX_DEPTH {
                    trace!(target: "txcheck::rlp", offset = at, "rejecting nested list beyond depth limit");
                    return Err(DecodeError::new(at, DecodeReason::DepthLimitExceeded { max: MAX_DEPTH }));
                }
                let parent = std::mem::replace(&mut frame, Frame::new(body));
                parents.push(parent);
            }
        }
    }
}
