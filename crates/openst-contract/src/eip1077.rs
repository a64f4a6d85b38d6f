//! EIP-1077 executable signed messages, as verified by `TokenHolder.executeRule`.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::{sol_data, SolType};

use crate::ContractResult;

/// The fields of an EIP-1077 transaction. `value`, `gas_price`, `gas` and `gas_token` are hashed
/// as single bytes (`uint8`), matching the on-chain verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Eip1077Transaction {
    /// Always the `TokenHolder` contract executing the call.
    pub from: Address,
    pub to: Address,
    pub value: u8,
    pub data: Bytes,
    pub nonce: U256,
    pub gas_price: u8,
    pub gas: u8,
    pub gas_token: u8,
    pub call_prefix: FixedBytes<4>,
    pub extra_hash: B256,
}

/// `v`, `r`, `s` components as `executeRule` expects them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignatureParts {
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

impl Eip1077Transaction {
    /// A rule call from `token_holder` to `rule` with zero value, gas price, gas and gas token.
    pub fn rule_call(
        token_holder: Address,
        rule: Address,
        data: Bytes,
        nonce: U256,
        call_prefix: FixedBytes<4>,
    ) -> Self {
        Self {
            from: token_holder,
            to: rule,
            value: 0,
            data,
            nonce,
            gas_price: 0,
            gas: 0,
            gas_token: 0,
            call_prefix,
            extra_hash: B256::ZERO,
        }
    }

    /// The tightly packed message whose hash gets signed.
    pub fn packed_message(&self) -> Vec<u8> {
        <(
            sol_data::FixedBytes<1>,
            sol_data::FixedBytes<1>,
            sol_data::Address,
            sol_data::Address,
            sol_data::Uint<8>,
            sol_data::FixedBytes<32>,
            sol_data::Uint<256>,
            sol_data::Uint<8>,
            sol_data::Uint<8>,
            sol_data::Uint<8>,
            sol_data::FixedBytes<4>,
            sol_data::FixedBytes<32>,
        ) as SolType>::abi_encode_packed(&(
            FixedBytes::<1>([0x19]),
            FixedBytes::<1>([0x00]),
            self.from,
            self.to,
            self.value,
            keccak256(&self.data),
            self.nonce,
            self.gas_price,
            self.gas,
            self.gas_token,
            self.call_prefix,
            self.extra_hash,
        ))
    }

    pub fn message_hash(&self) -> B256 {
        keccak256(self.packed_message())
    }

    /// Sign the message hash directly (no `personal_sign` prefix).
    pub fn sign(&self, signer: &impl SignerSync) -> ContractResult<SignatureParts> {
        let signature = signer.sign_hash_sync(&self.message_hash())?;
        let bytes = signature.as_bytes();
        Ok(SignatureParts {
            r: B256::from_slice(&bytes[0..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_primitives::{address, bytes, fixed_bytes};
    use alloy_signer_local::PrivateKeySigner;

    use super::*;

    const TOKEN_HOLDER: Address = address!("f8c9018DEA785A7cc8A59fE1F8A64B6f64f060cD");
    const RULE: Address = address!("7F8d92283Fa96f9F2FE1596e718584F8aCA70264");
    const EPHEMERAL_KEY: &str =
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn sample() -> Eip1077Transaction {
        Eip1077Transaction::rule_call(
            TOKEN_HOLDER,
            RULE,
            bytes!("a9059cbb0000000000000000000000000000000000000000000000000000000000000001"),
            U256::from(1),
            fixed_bytes!("97ebe030"),
        )
    }

    #[test]
    fn packed_message_layout() {
        let tx = sample();
        let packed = tx.packed_message();

        // 0x19 | 0x00 | from | to | value | keccak(data) | nonce | gasPrice | gas | gasToken
        // | callPrefix | extraHash
        assert_eq!(packed.len(), 1 + 1 + 20 + 20 + 1 + 32 + 32 + 1 + 1 + 1 + 4 + 32);
        assert_eq!(&packed[0..2], &[0x19, 0x00]);
        assert_eq!(&packed[2..22], TOKEN_HOLDER.as_slice());
        assert_eq!(&packed[22..42], RULE.as_slice());
        assert_eq!(packed[42], 0);
        assert_eq!(&packed[43..75], keccak256(&tx.data).as_slice());
        assert_eq!(&packed[75..107], &U256::from(1).to_be_bytes::<32>());
        assert_eq!(&packed[110..114], tx.call_prefix.as_slice());
        assert_eq!(&packed[114..], B256::ZERO.as_slice());
    }

    #[test]
    fn nonce_changes_the_hash() {
        let mut other = sample();
        other.nonce = U256::from(2);
        assert_ne!(sample().message_hash(), other.message_hash());
    }

    #[test]
    fn signature_recovers_to_the_ephemeral_key() {
        let signer = PrivateKeySigner::from_str(EPHEMERAL_KEY).unwrap();
        let tx = sample();
        let parts = tx.sign(&signer).unwrap();

        assert!(parts.v == 27 || parts.v == 28);

        let signature = signer.sign_hash_sync(&tx.message_hash()).unwrap();
        let recovered = signature
            .recover_address_from_prehash(&tx.message_hash())
            .unwrap();
        assert_eq!(recovered, signer.address());
        assert_eq!(signature.as_bytes()[64], parts.v);
    }
}
