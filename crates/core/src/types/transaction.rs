use crate::rlp::{
    address_from_canonical, u256_from_canonical, u64_from_canonical, DecodeError, DecodeReason,
    RlpItem, RlpReader,
};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{BufMut, Encodable, Header};

/// Number of top-level fields in a signed legacy transaction.
pub const TRANSACTION_FIELDS: usize = 9;

/// A signed legacy transaction as carried on the wire.
///
/// Values are produced by [`Transaction::decode`] and are not mutated
/// afterwards; hashes and the sender are derived on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    /// Decodes a transaction from exactly `bytes`, rejecting trailing data.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = RlpReader::new(bytes);
        let tx = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(tx)
    }

    /// Reads one transaction list from the cursor.
    ///
    /// Fields are counted as they are read; an arity error points at the
    /// start of the list.
    pub fn read(reader: &mut RlpReader<'_>) -> Result<Self, DecodeError> {
        let list_start = reader.offset();
        let mut fields = Fields { body: reader.enter_list()?, list_start, read: 0 };

        let tx = Self {
            nonce: fields.next()?.read_u64()?,
            gas_price: fields.next()?.read_u256()?,
            gas_limit: fields.next()?.read_u64()?,
            to: fields.next()?.read_address_or_empty()?,
            value: fields.next()?.read_u256()?,
            input: Bytes::from(fields.next()?.read_bytes()?.to_vec()),
            v: fields.next()?.read_u256()?,
            r: fields.next()?.read_u256()?,
            s: fields.next()?.read_u256()?,
        };
        fields.finish()?;
        Ok(tx)
    }

    /// Projects an already decoded item onto the transaction shape.
    ///
    /// Offsets in errors are relative to the start of `item`'s encoding.
    pub fn from_item(item: &RlpItem) -> Result<Self, DecodeError> {
        let items = item
            .as_list()
            .ok_or(DecodeError::new(0, DecodeReason::UnexpectedString))?;
        if items.len() != TRANSACTION_FIELDS {
            return Err(DecodeError::new(
                0,
                DecodeReason::FieldCount { expected: TRANSACTION_FIELDS, got: items.len() },
            ));
        }

        let payload_length: usize = items.iter().map(Encodable::length).sum();
        let mut offsets = Vec::with_capacity(items.len());
        let mut at = Header { list: true, payload_length }.length();
        for field in items {
            offsets.push(at);
            at += field.length();
        }

        Ok(Self {
            nonce: project(items, &offsets, 0, u64_from_canonical)?,
            gas_price: project(items, &offsets, 1, u256_from_canonical)?,
            gas_limit: project(items, &offsets, 2, u64_from_canonical)?,
            to: project(items, &offsets, 3, address_from_canonical)?,
            value: project(items, &offsets, 4, u256_from_canonical)?,
            input: project(items, &offsets, 5, |bytes| Ok(Bytes::from(bytes.to_vec())))?,
            v: project(items, &offsets, 6, u256_from_canonical)?,
            r: project(items, &offsets, 7, u256_from_canonical)?,
            s: project(items, &offsets, 8, u256_from_canonical)?,
        })
    }

    /// Keccak-256 of the full signed encoding.
    pub fn hash(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// True when `v` carries a chain id (`v >= 35`).
    pub fn is_protected(&self) -> bool {
        self.v >= U256::from(35)
    }

    /// Chain id embedded in `v`, if the signature is replay protected.
    pub fn chain_id(&self) -> Option<U256> {
        self.is_protected().then(|| (self.v - U256::from(35)) >> 1usize)
    }

    /// Appends the six unsigned fields, without a list header.
    pub(crate) fn encode_unsigned_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.encode_to(out);
        self.value.encode(out);
        self.input.encode(out);
    }

    fn encode_to(&self, out: &mut dyn BufMut) {
        match &self.to {
            Some(to) => to.encode(out),
            None => out.put_u8(alloy_rlp::EMPTY_STRING_CODE),
        }
    }

    fn to_length(&self) -> usize {
        self.to.as_ref().map_or(1, Encodable::length)
    }

    fn payload_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to_length()
            + self.value.length()
            + self.input.length()
            + self.v.length()
            + self.r.length()
            + self.s.length()
    }
}

/// Cursor over a transaction list body that tracks how many fields were read.
struct Fields<'a> {
    body: RlpReader<'a>,
    list_start: usize,
    read: usize,
}

impl<'a> Fields<'a> {
    fn arity_error(&self, got: usize) -> DecodeError {
        DecodeError::new(
            self.list_start,
            DecodeReason::FieldCount { expected: TRANSACTION_FIELDS, got },
        )
    }

    fn next(&mut self) -> Result<&mut RlpReader<'a>, DecodeError> {
        if self.body.is_empty() {
            return Err(self.arity_error(self.read));
        }
        self.read += 1;
        Ok(&mut self.body)
    }

    fn finish(&self) -> Result<(), DecodeError> {
        if self.body.is_empty() {
            return Ok(());
        }
        let extra = self.body.item_count()?;
        Err(self.arity_error(self.read + extra))
    }
}

fn project<T>(
    items: &[RlpItem],
    offsets: &[usize],
    index: usize,
    parse: impl FnOnce(&[u8]) -> Result<T, DecodeReason>,
) -> Result<T, DecodeError> {
    let at = offsets[index];
    let bytes = items[index]
        .as_bytes()
        .ok_or(DecodeError::new(at, DecodeReason::UnexpectedList))?;
    parse(bytes).map_err(|reason| DecodeError::new(at, reason))
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.payload_length() }.encode(out);
        self.encode_unsigned_fields(out);
        self.v.encode(out);
        self.r.encode(out);
        self.s.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.payload_length();
        Header { list: true, payload_length }.length() + payload_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rlp::decode_exact;
    use alloy_primitives::{address, hex};

    const LEGACY_TX: [u8; 97] = hex!("f85f800182520894095e7baea6a6c7c4c2dfeb977efac326af552d870a801ba048b55bfa915ac795c431978d8a6a992b628d557da5ff759b307d495a36649353a0efffd310ac743f371de3b9f7f9cb56c0b28ad43601b4ab949f53faa07bd2c804");

    fn sample() -> Transaction {
        Transaction {
            nonce: 42,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21_000,
            to: Some(Address::repeat_byte(0x12)),
            value: U256::from(1_000_000_000_000_000_000u64),
            input: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            v: U256::from(27),
            r: U256::from(123),
            s: U256::from(456),
        }
    }

    #[test]
    fn test_decode_legacy_transaction() {
        let tx = Transaction::decode(&LEGACY_TX).expect("Failed to decode transaction");

        assert_eq!(tx.nonce, 0);
        assert_eq!(tx.gas_price, U256::from(1));
        assert_eq!(tx.gas_limit, 21_000);
        assert_eq!(tx.to, Some(address!("095e7baea6a6c7c4c2dfeb977efac326af552d87")));
        assert_eq!(tx.value, U256::from(10));
        assert!(tx.input.is_empty());
        assert_eq!(tx.v, U256::from(27));
        assert_eq!(
            tx.r,
            U256::from_be_bytes(hex!("48b55bfa915ac795c431978d8a6a992b628d557da5ff759b307d495a36649353"))
        );
        assert!(!tx.is_protected());
        assert_eq!(tx.chain_id(), None);
    }

    #[test]
    fn test_transaction_rlp_roundtrip() {
        let tx = sample();
        let buffer = alloy_rlp::encode(&tx);
        assert_eq!(buffer.len(), tx.length());

        let decoded = Transaction::decode(&buffer).expect("Failed to decode transaction");
        assert_eq!(tx, decoded);

        let reencoded = alloy_rlp::encode(Transaction::decode(&LEGACY_TX).unwrap());
        assert_eq!(reencoded, LEGACY_TX.to_vec());
    }

    #[test]
    fn test_empty_list_is_wrong_arity() {
        let err = Transaction::decode(&[0xc0]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::new(0, DecodeReason::FieldCount { expected: 9, got: 0 })
        );
    }

    #[test]
    fn test_extra_field_is_wrong_arity() {
        let mut fields = decode_exact(&LEGACY_TX).unwrap().as_list().unwrap().to_vec();
        fields.push(RlpItem::from(&[0x01u8][..]));
        let encoded = alloy_rlp::encode(RlpItem::List(fields.clone()));

        let err = Transaction::decode(&encoded).unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeReason::FieldCount { expected: 9, got: 10 }));

        // leftovers of any wire type are counted
        fields.push(RlpItem::from(&[0x02u8][..]));
        fields.push(RlpItem::List(vec![]));
        let err = Transaction::decode(&alloy_rlp::encode(RlpItem::List(fields))).unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeReason::FieldCount { expected: 9, got: 12 }));
    }

    #[test]
    fn test_missing_field_is_wrong_arity() {
        let mut fields = decode_exact(&LEGACY_TX).unwrap().as_list().unwrap().to_vec();
        fields.pop();
        let encoded = alloy_rlp::encode(RlpItem::List(fields));

        let err = Transaction::decode(&encoded).unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeReason::FieldCount { expected: 9, got: 8 }));
    }

    #[test]
    fn test_contract_creation_has_no_recipient() {
        let tx = Transaction { to: None, ..sample() };
        let decoded = Transaction::decode(&alloy_rlp::encode(&tx)).unwrap();
        assert_eq!(decoded.to, None);
        assert!(decoded.is_contract_creation());
    }

    #[test]
    fn test_rejects_short_recipient() {
        let mut fields = decode_exact(&LEGACY_TX).unwrap().as_list().unwrap().to_vec();
        fields[3] = RlpItem::from(&[0x09u8; 19][..]);
        let encoded = alloy_rlp::encode(RlpItem::List(fields));

        let err = Transaction::decode(&encoded).unwrap_err();
        // list header (2) + nonce (1) + gas price (1) + gas limit (3)
        assert_eq!(err, DecodeError::new(7, DecodeReason::InvalidAddressLength { got: 19 }));
    }

    #[test]
    fn test_rejects_list_in_string_field() {
        let mut fields = decode_exact(&LEGACY_TX).unwrap().as_list().unwrap().to_vec();
        fields[5] = RlpItem::List(vec![]);
        let encoded = alloy_rlp::encode(RlpItem::List(fields));

        let err = Transaction::decode(&encoded).unwrap_err();
        assert_eq!(err.reason, DecodeReason::UnexpectedList);
    }

    #[test]
    fn test_rejects_string_instead_of_list() {
        let err = Transaction::decode(&hex!("83646f67")).unwrap_err();
        assert_eq!(err, DecodeError::new(0, DecodeReason::UnexpectedString));
    }

    #[test]
    fn test_rejects_trailing_data() {
        let mut bytes = LEGACY_TX.to_vec();
        bytes.push(0x80);
        let err = Transaction::decode(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::new(97, DecodeReason::TrailingBytes));
    }

    #[test]
    fn test_rejects_non_canonical_nonce() {
        let mut fields = decode_exact(&LEGACY_TX).unwrap().as_list().unwrap().to_vec();
        fields[0] = RlpItem::from(&[0x00u8][..]);
        let encoded = alloy_rlp::encode(RlpItem::List(fields));

        let err = Transaction::decode(&encoded).unwrap_err();
        assert_eq!(err, DecodeError::new(2, DecodeReason::LeadingZeroInteger));
    }

    #[test]
    fn test_from_item_matches_decode() {
        let item = decode_exact(&LEGACY_TX).unwrap();
        assert_eq!(Transaction::from_item(&item).unwrap(), Transaction::decode(&LEGACY_TX).unwrap());

        let mut fields = item.as_list().unwrap().to_vec();
        fields[3] = RlpItem::from(&[0x09u8; 19][..]);
        let err = Transaction::from_item(&RlpItem::List(fields)).unwrap_err();
        assert_eq!(err, DecodeError::new(7, DecodeReason::InvalidAddressLength { got: 19 }));
    }

    #[test]
    fn test_chain_id_from_v() {
        let tx = Transaction { v: U256::from(37), ..sample() };
        assert!(tx.is_protected());
        assert_eq!(tx.chain_id(), Some(U256::from(1)));

        let tx = Transaction { v: U256::from(35 + 2 * 61 + 1), ..sample() };
        assert_eq!(tx.chain_id(), Some(U256::from(61)));
    }

    #[test]
    fn test_hash_covers_signature() {
        let tx = sample();
        let other = Transaction { s: U256::from(457), ..sample() };
        assert_ne!(tx.hash(), other.hash());
        assert_eq!(tx.hash(), keccak256(alloy_rlp::encode(&tx)));
    }
}
