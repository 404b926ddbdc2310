/*
[INPUT]:  SolanaTransferRequest, sender address, wallet keypair, a SolanaRpc
[OUTPUT]: Legacy-message SOL transfers: built, (partially) signed, base64, submitted
[POS]:    Transaction layer - Solana family Built -> Signed -> Submitted
[UPDATE]: When adding instructions, versioned messages or fee policy
*/

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::VerifyingKey;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_hash::Hash;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_system_interface::instruction as system_instruction;
use solana_transaction::Transaction;
use tracing::{debug, info};

pub use solana_message::Message;

use crate::address::solana;
use crate::crypto::KeyMaterial;
use crate::error::{Result, WalletError};
use crate::network::{FeePayerService, SolanaRpc};
use crate::types::{AddressFormat, AssetSymbol, SOL, SolanaTransferRequest, SubmittedTransaction};
use crate::wallet::WalletRecord;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const SOL_DECIMALS: u32 = 9;

fn pubkey(address: &str) -> Result<Pubkey> {
    solana::decode(address)
        .map(Pubkey::new_from_array)
        .map_err(|e| WalletError::signing(SOL, e))
}

/// Slot of `key` among the message's required signers
fn signer_slot(message: &Message, key: &Pubkey) -> Option<usize> {
    let signers = usize::from(message.header.num_required_signatures);
    message.account_keys.iter().take(signers).position(|k| k == key)
}

pub struct SolanaTransactionBuilder;

impl SolanaTransactionBuilder {
    /// Single system transfer. The fee payer defaults to the sender; the
    /// blockhash comes from `rpc`.
    pub async fn build<R: SolanaRpc + ?Sized>(
        rpc: &R,
        from: &str,
        request: SolanaTransferRequest,
    ) -> Result<BuiltSolanaTransaction> {
        let lamports = parse_amount(&request.amount).map_err(|e| WalletError::signing(SOL, e))?;
        let sender = pubkey(from)?;
        let recipient = pubkey(&request.to)?;
        let payer = match request.fee_payer.as_deref() {
            Some(payer) => pubkey(payer)?,
            None => sender,
        };

        let blockhash = rpc.latest_blockhash().await.map_err(|e| match e {
            WalletError::NetworkFailure { .. } => e,
            other => WalletError::network("getLatestBlockhash", other),
        })?;

        let instruction = system_instruction::transfer(&sender, &recipient, lamports);
        let message = Message::new_with_blockhash(&[instruction], Some(&payer), &Hash::new_from_array(blockhash));

        debug!(lamports, sponsored = payer != sender, "solana transfer built");
        Ok(BuiltSolanaTransaction {
            message,
            sender,
            lamports,
        })
    }

    /// Same as [`Self::build`] with the fee payer taken from `sponsor`
    pub async fn build_sponsored<R, F>(
        rpc: &R,
        sponsor: &F,
        from: &str,
        mut request: SolanaTransferRequest,
    ) -> Result<BuiltSolanaTransaction>
    where
        R: SolanaRpc + ?Sized,
        F: FeePayerService + ?Sized,
    {
        request.fee_payer = Some(sponsor.fee_payer().await?);
        Self::build(rpc, from, request).await
    }
}

#[derive(Debug, Clone)]
pub struct BuiltSolanaTransaction {
    message: Message,
    sender: Pubkey,
    lamports: u64,
}

impl BuiltSolanaTransaction {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn lamports(&self) -> u64 {
        self.lamports
    }

    pub fn sign(self, record: &WalletRecord, symbol: &AssetSymbol) -> Result<SignedSolanaTransaction> {
        if symbol.address_format() != AddressFormat::Solana {
            return Err(WalletError::signing(symbol, "not a Solana asset"));
        }
        let key = record.key(symbol)?;
        self.sign_with(key, symbol)
    }

    /// Fill the sender's slot; a sponsor's slot keeps the default signature
    pub fn sign_with(self, key: &KeyMaterial, symbol: &AssetSymbol) -> Result<SignedSolanaTransaction> {
        let signing_key = key
            .ed25519_signing_key()
            .ok_or_else(|| WalletError::signing(symbol, "Solana signing needs an ed25519 key"))?;
        let keypair = Keypair::new_from_array(signing_key.to_bytes());
        if keypair.pubkey() != self.sender {
            return Err(WalletError::signing(symbol, "key does not control the sending account"));
        }
        let sender_slot = signer_slot(&self.message, &self.sender)
            .ok_or_else(|| WalletError::signing(symbol, "sender is not a signer of the message"))?;

        let blockhash = self.message.recent_blockhash;
        let mut transaction = Transaction::new_unsigned(self.message);
        transaction
            .try_partial_sign(&[&keypair], blockhash)
            .map_err(|e| WalletError::signing(symbol, e))?;

        Ok(SignedSolanaTransaction {
            transaction,
            sender_slot,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SignedSolanaTransaction {
    transaction: Transaction,
    sender_slot: usize,
}

impl SignedSolanaTransaction {
    pub fn message(&self) -> &Message {
        &self.transaction.message
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// False while a distinct fee payer has not co-signed
    pub fn is_fully_signed(&self) -> bool {
        self.transaction
            .signatures
            .iter()
            .all(|s| *s != Signature::default())
    }

    /// Base58 keys whose signature slot is still empty
    pub fn missing_signers(&self) -> Vec<String> {
        self.transaction
            .message
            .account_keys
            .iter()
            .zip(&self.transaction.signatures)
            .filter(|(_, sig)| **sig == Signature::default())
            .map(|(key, _)| key.to_string())
            .collect()
    }

    /// Attach an externally produced signature after verifying it
    pub fn add_signature(&mut self, signer: &str, signature: [u8; 64]) -> Result<()> {
        let key = pubkey(signer)?;
        let slot = signer_slot(&self.transaction.message, &key)
            .ok_or_else(|| WalletError::signing(SOL, format!("{signer} is not a signer")))?;

        let verifying_key = VerifyingKey::from_bytes(&key.to_bytes()).map_err(|e| WalletError::signing(SOL, e))?;
        verifying_key
            .verify_strict(
                &self.transaction.message.serialize(),
                &ed25519_dalek::Signature::from_bytes(&signature),
            )
            .map_err(|e| WalletError::signing(SOL, format!("co-signature rejected: {e}")))?;

        self.transaction.signatures[slot] = Signature::from(signature);
        Ok(())
    }

    /// Sender's signature in base58, which is also the transaction id
    /// when the sender pays the fee
    pub fn sender_signature(&self) -> String {
        self.transaction.signatures[self.sender_slot].to_string()
    }

    pub fn wire_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.transaction).map_err(|e| WalletError::signing(SOL, e))
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.wire_bytes()?))
    }

    /// Broadcast once. Refuses partially signed transactions.
    pub async fn submit<R: SolanaRpc + ?Sized>(self, rpc: &R) -> Result<SubmittedTransaction> {
        if !self.is_fully_signed() {
            return Err(WalletError::signing(
                SOL,
                format!("missing signatures from {}", self.missing_signers().join(", ")),
            ));
        }
        let id = rpc.send_transaction(&self.to_base64()?).await?;
        info!(signature = %id, "solana transaction submitted");
        Ok(SubmittedTransaction {
            family: AddressFormat::Solana,
            id,
        })
    }
}

/// Positive decimal SOL with at most 9 fractional digits, in lamports
pub fn parse_amount(amount: &str) -> std::result::Result<u64, String> {
    let value = Decimal::from_str(amount.trim()).map_err(|e| format!("amount {amount:?} is not a decimal: {e}"))?;
    if value <= Decimal::ZERO {
        return Err(format!("amount {amount:?} must be positive"));
    }
    let value = value.normalize();
    if value.scale() > SOL_DECIMALS {
        return Err(format!("amount {amount:?} has more than {SOL_DECIMALS} decimals"));
    }
    value
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .and_then(|lamports| lamports.to_u64())
        .ok_or_else(|| format!("amount {amount:?} overflows lamports"))
}
