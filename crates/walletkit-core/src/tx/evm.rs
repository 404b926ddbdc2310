/*
[INPUT]:  EvmTransferRequest, sender address, wallet key, an EvmRpc
[OUTPUT]: EIP-155 legacy transactions: built, signed (RLP hex + hash), submitted
[POS]:    Transaction layer - EVM family Built -> Signed -> Submitted
[UPDATE]: When adding typed (EIP-1559) transactions or changing gas policy
*/

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, Bytes, TxKind, U256, keccak256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use tracing::{debug, info};

use crate::address::evm;
use crate::crypto::KeyMaterial;
use crate::error::{Result, WalletError};
use crate::network::EvmRpc;
use crate::types::{AddressFormat, AssetSymbol, CallRequest, EvmTransferRequest, SubmittedTransaction};
use crate::wallet::WalletRecord;

/// Gas for a plain value transfer
pub const TRANSFER_GAS: u64 = 21_000;

const ETHER_DECIMALS: usize = 18;
const LABEL: &str = "EVM";

pub struct EvmTransactionBuilder;

impl EvmTransactionBuilder {
    /// Resolve nonce and gas price over `rpc` unless supplied. Gas limit is
    /// 21000 for plain transfers, otherwise supplied or estimated.
    pub async fn build<R: EvmRpc + ?Sized>(
        rpc: &R,
        from: &str,
        request: EvmTransferRequest,
    ) -> Result<BuiltEvmTransaction> {
        let from_address = evm::parse(from).map_err(|e| WalletError::signing(LABEL, e))?;
        let to = evm::parse(&request.to).map_err(|e| WalletError::signing(LABEL, e))?;
        let value = parse_value(&request.value).map_err(|e| WalletError::signing(LABEL, e))?;
        let input = match request.data.as_deref() {
            Some(data) => decode_data(data).map_err(|e| WalletError::signing(LABEL, e))?,
            None => Bytes::new(),
        };

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => rpc.transaction_count(from).await?,
        };
        let gas_price = match request.gas_price {
            Some(price) => price,
            None => rpc.gas_price().await?,
        };
        let gas_limit = match request.gas_limit {
            Some(limit) => limit,
            None if input.is_empty() => TRANSFER_GAS,
            None => {
                let call = CallRequest {
                    from: from.to_string(),
                    to: to.to_checksum(None),
                    value: format!("0x{value:x}"),
                    data: request.data.clone(),
                };
                rpc.estimate_gas(&call).await?
            }
        };

        let tx = TxLegacy {
            chain_id: Some(request.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Call(to),
            value,
            input,
        };
        debug!(chain_id = request.chain_id, nonce, gas_price, gas_limit, "evm transaction built");

        Ok(BuiltEvmTransaction {
            from: from_address,
            tx,
        })
    }
}

/// Unsigned transaction with every field resolved
#[derive(Debug, Clone)]
pub struct BuiltEvmTransaction {
    from: Address,
    tx: TxLegacy,
}

impl BuiltEvmTransaction {
    pub fn transaction(&self) -> &TxLegacy {
        &self.tx
    }

    pub fn from(&self) -> Address {
        self.from
    }

    /// Sign with the record's key for `symbol`
    pub fn sign(self, record: &WalletRecord, symbol: &AssetSymbol) -> Result<SignedEvmTransaction> {
        if symbol.address_format() != AddressFormat::Evm {
            return Err(WalletError::signing(symbol, "not an EVM asset"));
        }
        let key = record.key(symbol)?;
        self.sign_with(key, symbol)
    }

    /// ECDSA over the EIP-155 signing hash
    pub fn sign_with(self, key: &KeyMaterial, symbol: &AssetSymbol) -> Result<SignedEvmTransaction> {
        let signing_key = key
            .secp256k1_signing_key()
            .ok_or_else(|| WalletError::signing(symbol, "EVM signing needs a secp256k1 key"))?;
        let signer = PrivateKeySigner::from_signing_key(signing_key);
        if signer.address() != self.from {
            return Err(WalletError::signing(
                symbol,
                format!("key controls {}, transaction is from {}", signer.address(), self.from),
            ));
        }

        let signature = signer
            .sign_hash_sync(&self.tx.signature_hash())
            .map_err(|e| WalletError::signing(symbol, e))?;
        let envelope = TxEnvelope::Legacy(self.tx.into_signed(signature));
        let raw = envelope.encoded_2718();
        let hash = keccak256(&raw);

        debug!(symbol = %symbol, hash = %hash, "evm transaction signed");
        Ok(SignedEvmTransaction {
            raw_hex: format!("0x{}", hex::encode(&raw)),
            hash,
        })
    }
}

/// RLP-encoded signed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEvmTransaction {
    pub raw_hex: String,
    pub hash: B256,
}

impl SignedEvmTransaction {
    /// Broadcast once; retries belong to the caller
    pub async fn submit<R: EvmRpc + ?Sized>(self, rpc: &R) -> Result<SubmittedTransaction> {
        let id = rpc.send_raw_transaction(&self.raw_hex).await?;
        info!(hash = %id, "evm transaction submitted");
        Ok(SubmittedTransaction {
            family: AddressFormat::Evm,
            id,
        })
    }
}

/// Decimal ether (or any 18-decimal native unit) to wei
pub fn parse_value(value: &str) -> std::result::Result<U256, String> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());

    if whole.is_empty() && fraction.is_empty() || !all_digits(whole) || !all_digits(fraction) {
        return Err(format!("value {value:?} is not a non-negative decimal"));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(format!("value {value:?} has more than {ETHER_DECIMALS} decimals"));
    }

    let digits = format!("{whole}{fraction:0<width$}", width = ETHER_DECIMALS);
    U256::from_str_radix(&digits, 10).map_err(|e| format!("value {value:?} out of range: {e}"))
}

fn decode_data(data: &str) -> std::result::Result<Bytes, String> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| format!("calldata is not hex: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Curve;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubRpc {
        nonce: u64,
        gas_price: u128,
        estimate: u64,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EvmRpc for StubRpc {
        async fn transaction_count(&self, _address: &str) -> Result<u64> {
            Ok(self.nonce)
        }

        async fn gas_price(&self) -> Result<u128> {
            Ok(self.gas_price)
        }

        async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64> {
            Ok(self.estimate)
        }

        async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String> {
            self.sent.lock().unwrap().push(raw_hex.to_string());
            Ok("0xfeed".to_string())
        }

        async fn balance(&self, _address: &str) -> Result<U256> {
            Ok(U256::ZERO)
        }
    }

    fn eip155_key() -> KeyMaterial {
        KeyMaterial::decode(Curve::Secp256k1, &"46".repeat(32)).unwrap()
    }

    fn from_of(key: &KeyMaterial) -> String {
        evm::encode(key.secp256k1_signing_key().unwrap().verifying_key())
    }

    fn eth() -> AssetSymbol {
        AssetSymbol::new("ETH").unwrap()
    }

    #[rstest]
    #[case("1", "1000000000000000000")]
    #[case("0.5", "500000000000000000")]
    #[case(".25", "250000000000000000")]
    #[case("0", "0")]
    #[case("0.000000000000000001", "1")]
    fn test_parse_value(#[case] input: &str, #[case] wei: &str) {
        assert_eq!(parse_value(input).unwrap(), U256::from_str_radix(wei, 10).unwrap());
    }

    #[rstest]
    #[case("-1")]
    #[case("")]
    #[case("1e18")]
    #[case("0.0000000000000000001")]
    #[case("1.2.3")]
    fn test_parse_value_rejects(#[case] input: &str) {
        assert!(parse_value(input).is_err());
    }

    #[tokio::test]
    async fn test_eip155_reference_transaction() {
        let key = eip155_key();
        let rpc = StubRpc {
            nonce: 9,
            gas_price: 20_000_000_000,
            ..Default::default()
        };
        let request = EvmTransferRequest::new("0x3535353535353535353535353535353535353535", "1", 1);

        let built = EvmTransactionBuilder::build(&rpc, &from_of(&key), request).await.unwrap();
        assert_eq!(built.transaction().gas_limit, TRANSFER_GAS);

        let signed = built.sign_with(&key, &eth()).unwrap();
        assert_eq!(
            signed.raw_hex,
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        let raw = hex::decode(signed.raw_hex.trim_start_matches("0x")).unwrap();
        assert_eq!(signed.hash, keccak256(raw));
    }

    #[tokio::test]
    async fn test_calldata_uses_estimate() {
        let key = eip155_key();
        let rpc = StubRpc {
            estimate: 46_000,
            ..Default::default()
        };
        let mut request = EvmTransferRequest::new("0x3535353535353535353535353535353535353535", "0", 1);
        request.data = Some("0xa9059cbb".to_string());
        request.nonce = Some(3);
        request.gas_price = Some(1);

        let built = EvmTransactionBuilder::build(&rpc, &from_of(&key), request).await.unwrap();
        assert_eq!(built.transaction().gas_limit, 46_000);
        assert_eq!(built.transaction().nonce, 3);
        assert_eq!(built.transaction().input.len(), 4);
    }

    #[tokio::test]
    async fn test_wrong_key_is_signing_failure() {
        let key = eip155_key();
        let rpc = StubRpc::default();
        let request = EvmTransferRequest::new("0x3535353535353535353535353535353535353535", "1", 1);
        let built = EvmTransactionBuilder::build(&rpc, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94", request)
            .await
            .unwrap();
        let err = built.sign_with(&key, &eth()).unwrap_err();
        assert!(matches!(err, WalletError::SigningFailure { .. }));
    }

    #[tokio::test]
    async fn test_bad_value_is_signing_failure() {
        let rpc = StubRpc::default();
        let request = EvmTransferRequest::new("0x3535353535353535353535353535353535353535", "-0.1", 1);
        let err = EvmTransactionBuilder::build(&rpc, &from_of(&eip155_key()), request)
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::SigningFailure { .. }));
    }

    #[tokio::test]
    async fn test_submit_hands_raw_hex_to_rpc() {
        let key = eip155_key();
        let rpc = StubRpc::default();
        let request = EvmTransferRequest::new("0x3535353535353535353535353535353535353535", "0.1", 5);
        let signed = EvmTransactionBuilder::build(&rpc, &from_of(&key), request)
            .await
            .unwrap()
            .sign_with(&key, &eth())
            .unwrap();
        let raw = signed.raw_hex.clone();

        let submitted = signed.submit(&rpc).await.unwrap();
        assert_eq!(submitted.id, "0xfeed");
        assert_eq!(submitted.family, AddressFormat::Evm);
        assert_eq!(rpc.sent.lock().unwrap().as_slice(), &[raw]);
    }
}
