//! Alloy-backed client for the gift card contract.

use crate::error::LedgerClientError;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::str::FromStr;
use tracing::{debug, instrument};
use verification_flow::{AccountId, BindingLedger, LedgerError, PhoneNumber};

sol! {
    #[sol(rpc)]
    contract GiftCardRegistry {
        function bindNumber(bytes32 numberHash, address owner) external;
        function unbindNumber(bytes32 numberHash) external;
        function addressForNumber(bytes32 numberHash) external view returns (address);
        function mintCard(address recipient, string tokenURI) external payable returns (uint256);
    }
}

/// Hash a normalized phone number for on-chain storage.
///
/// Raw numbers never go on-chain; the contract only ever sees the
/// SHA-256 of the E.164 form.
pub fn number_hash(number: &str) -> B256 {
    B256::from_slice(&Sha256::digest(number.as_bytes()))
}

/// Gift card operations consumed by the service layer.
#[async_trait]
pub trait GiftCardOps: Send + Sync {
    /// Mint a card NFT to `recipient`, carrying `value` as the card's
    /// funds. Returns the transaction hash.
    async fn mint_card(
        &self,
        recipient: &str,
        token_uri: &str,
        value: U256,
    ) -> Result<String, LedgerClientError>;

    /// Send `value` to the wallet bound to `number`.
    async fn send_to_number(&self, number: &str, value: U256) -> Result<String, LedgerClientError>;

    /// The wallet bound to `number`, if any.
    async fn address_for_number(&self, number: &str)
        -> Result<Option<String>, LedgerClientError>;

    /// Remove the binding for `number`. Returns the transaction hash.
    async fn unbind_number(&self, number: &str) -> Result<String, LedgerClientError>;
}

/// Client for the gift card contract, signing with the service wallet.
#[derive(Clone, Debug)]
pub struct GiftCardClient {
    provider: DynProvider,
    contract: GiftCardRegistry::GiftCardRegistryInstance<DynProvider>,
}

impl GiftCardClient {
    /// Connect to an RPC endpoint and attach to the contract.
    pub fn new(
        rpc_url: &str,
        contract_address: &str,
        private_key: &SecretString,
    ) -> Result<Self, LedgerClientError> {
        let signer = PrivateKeySigner::from_str(private_key.expose_secret())
            .map_err(|_| LedgerClientError::Config("invalid signer key".into()))?;
        let wallet = EthereumWallet::from(signer);

        let url = rpc_url
            .parse()
            .map_err(|e| LedgerClientError::Config(format!("invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url).erased();

        let address = Address::from_str(contract_address)
            .map_err(|e| LedgerClientError::InvalidAddress(format!("{}: {}", contract_address, e)))?;
        let contract = GiftCardRegistry::new(address, provider.clone());

        Ok(Self { provider, contract })
    }

    async fn lookup(&self, number: &str) -> Result<Address, LedgerClientError> {
        let hash = number_hash(number);
        let owner = self.contract.addressForNumber(hash).call().await?;
        Ok(owner)
    }

    /// Bind `number` to `owner` on-chain and wait for the receipt.
    #[instrument(skip(self))]
    pub async fn bind(&self, owner: &str, number: &str) -> Result<String, LedgerClientError> {
        let owner = Address::from_str(owner)
            .map_err(|e| LedgerClientError::InvalidAddress(format!("{}: {}", owner, e)))?;
        let hash = number_hash(number);

        let pending = self.contract.bindNumber(hash, owner).send().await?;
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(LedgerClientError::Reverted("bindNumber".into()));
        }

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        debug!(%tx_hash, "Number bound");
        Ok(tx_hash)
    }
}

#[async_trait]
impl GiftCardOps for GiftCardClient {
    #[instrument(skip(self, token_uri))]
    async fn mint_card(
        &self,
        recipient: &str,
        token_uri: &str,
        value: U256,
    ) -> Result<String, LedgerClientError> {
        let recipient = Address::from_str(recipient)
            .map_err(|e| LedgerClientError::InvalidAddress(format!("{}: {}", recipient, e)))?;

        let pending = self
            .contract
            .mintCard(recipient, token_uri.to_string())
            .value(value)
            .send()
            .await?;
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(LedgerClientError::Reverted("mintCard".into()));
        }

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        debug!(%tx_hash, "Card minted");
        Ok(tx_hash)
    }

    #[instrument(skip(self))]
    async fn send_to_number(&self, number: &str, value: U256) -> Result<String, LedgerClientError> {
        let to = self.lookup(number).await?;
        if to == Address::ZERO {
            return Err(LedgerClientError::NumberNotBound(number.to_string()));
        }

        let tx = TransactionRequest::default().with_to(to).with_value(value);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerClientError::Transaction(e.to_string()))?;
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(LedgerClientError::Reverted("transfer".into()));
        }

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        debug!(%tx_hash, "Funds sent to bound wallet");
        Ok(tx_hash)
    }

    async fn address_for_number(
        &self,
        number: &str,
    ) -> Result<Option<String>, LedgerClientError> {
        let owner = self.lookup(number).await?;
        if owner == Address::ZERO {
            Ok(None)
        } else {
            Ok(Some(format!("{:#x}", owner)))
        }
    }

    #[instrument(skip(self))]
    async fn unbind_number(&self, number: &str) -> Result<String, LedgerClientError> {
        let hash = number_hash(number);

        let pending = self.contract.unbindNumber(hash).send().await?;
        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            return Err(LedgerClientError::Reverted("unbindNumber".into()));
        }

        let tx_hash = format!("{:#x}", receipt.transaction_hash);
        debug!(%tx_hash, "Number unbound");
        Ok(tx_hash)
    }
}

#[async_trait]
impl BindingLedger for GiftCardClient {
    async fn bind_number(
        &self,
        account: &AccountId,
        number: &PhoneNumber,
    ) -> Result<(), LedgerError> {
        self.bind(account.as_str(), number.as_e164())
            .await
            .map(|_| ())
            .map_err(|e| LedgerError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_hash_is_deterministic() {
        let a = number_hash("+15551234567");
        let b = number_hash("+15551234567");
        let c = number_hash("+15551234568");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_number_hash_matches_sha256() {
        let hash = number_hash("+15551234567");
        let expected = Sha256::digest(b"+15551234567");
        assert_eq!(hash.as_slice(), expected.as_slice());
    }

    #[test]
    fn test_client_rejects_bad_key() {
        let err = GiftCardClient::new(
            "http://localhost:8545",
            "0x0000000000000000000000000000000000000001",
            &SecretString::new("not-a-key".into()),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerClientError::Config(_)));
    }

    #[test]
    fn test_client_rejects_bad_contract_address() {
        // A valid 32-byte hex key, not a live one.
        let key = SecretString::new(
            "0x0000000000000000000000000000000000000000000000000000000000000001".into(),
        );
        let err = GiftCardClient::new("http://localhost:8545", "not-an-address", &key).unwrap_err();
        assert!(matches!(err, LedgerClientError::InvalidAddress(_)));
    }
}
