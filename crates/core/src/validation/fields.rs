use super::{ExpectedTransaction, FieldMismatch, FieldValue, TxField};
use crate::types::transaction::Transaction;
use alloy_primitives::{Address, U256};

fn check_uint(field: TxField, got: U256, want: U256) -> Result<(), FieldMismatch> {
    if got == want {
        return Ok(());
    }
    Err(FieldMismatch {
        field,
        got: FieldValue::Uint(got),
        want: FieldValue::Uint(want),
    })
}

impl ExpectedTransaction {
    /// Compares every field of `tx` with the expectation and reports the first
    /// difference.
    ///
    /// A decoded contract creation matches only the zero-address sentinel.
    pub fn verify(&self, tx: &Transaction) -> Result<(), FieldMismatch> {
        if tx.input != self.data {
            return Err(FieldMismatch {
                field: TxField::Data,
                got: FieldValue::Bytes(tx.input.clone()),
                want: FieldValue::Bytes(self.data.clone()),
            });
        }
        check_uint(TxField::GasLimit, U256::from(tx.gas_limit), U256::from(self.gas_limit))?;
        check_uint(TxField::GasPrice, tx.gas_price, self.gas_price)?;
        check_uint(TxField::Nonce, U256::from(tx.nonce), U256::from(self.nonce))?;
        check_uint(TxField::R, tx.r, self.r)?;
        check_uint(TxField::S, tx.s, self.s)?;
        check_uint(TxField::V, tx.v, self.v)?;

        let recipient_matches = match tx.to {
            None => self.to == Address::ZERO,
            Some(to) => to == self.to,
        };
        if !recipient_matches {
            return Err(FieldMismatch {
                field: TxField::To,
                got: FieldValue::Recipient(tx.to),
                want: FieldValue::Recipient(Some(self.to)),
            });
        }

        check_uint(TxField::Value, tx.value, self.value)
    }
}
