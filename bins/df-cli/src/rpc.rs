//! Exact-mode decay oracle backed by `eth_call` on the vesting wallet.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::ClientError;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde_json::json;
use tracing::debug;

use df_core::error::CollaboratorError;
use df_core::traits::DecayOracle;
use df_core::types::Address;

/// `getAmount(uint256,uint256,uint256)`.
const GET_AMOUNT_SELECTOR: &str = "29c45cb6";

pub struct RpcDecayOracle {
    client: HttpClient,
    contract: Address,
}

impl RpcDecayOracle {
    pub fn new(url: &str, contract: Address, timeout: Duration) -> anyhow::Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(timeout)
            .build(url)?;
        Ok(Self { client, contract })
    }

    /// Fail unless the endpoint reports `expected` from `eth_chainId`.
    pub async fn verify_chain(&self, expected: u64) -> anyhow::Result<()> {
        let raw: String = self.client.request("eth_chainId", ArrayParams::new()).await?;
        let actual = parse_quantity(&raw)?;
        if actual != expected {
            anyhow::bail!("endpoint reports chain {actual}, configured chain is {expected}");
        }
        debug!(chain_id = actual, "rpc chain confirmed");
        Ok(())
    }
}

#[async_trait]
impl DecayOracle for RpcDecayOracle {
    async fn authoritative_decay(
        &self,
        value: u128,
        t: u64,
        h: u64,
    ) -> Result<u128, CollaboratorError> {
        let call = json!({
            "to": self.contract.as_str(),
            "data": encode_get_amount(value, t, h),
        });
        let bad_params = |e: serde_json::Error| CollaboratorError::InvalidResponse(e.to_string());
        let mut params = ArrayParams::new();
        params.insert(call).map_err(bad_params)?;
        params.insert("latest").map_err(bad_params)?;

        let raw: String = self
            .client
            .request("eth_call", params)
            .await
            .map_err(map_client_error)?;
        let amount = decode_uint128(&raw)?;
        debug!(value = %value, t, h, amount = %amount, "vesting wallet getAmount");
        Ok(amount)
    }
}

fn map_client_error(err: ClientError) -> CollaboratorError {
    match err {
        // The node answered; the call itself failed (e.g. reverted).
        ClientError::Call(e) => CollaboratorError::InvalidResponse(e.to_string()),
        other => CollaboratorError::Unavailable(other.to_string()),
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x89"`.
pub fn parse_quantity(raw: &str) -> Result<u64, CollaboratorError> {
    raw.strip_prefix("0x")
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| u64::from_str_radix(digits, 16).ok())
        .ok_or_else(|| CollaboratorError::InvalidResponse(format!("bad quantity {raw:?}")))
}

/// ABI call data for `getAmount(value, t, h)`.
pub fn encode_get_amount(value: u128, t: u64, h: u64) -> String {
    format!("0x{GET_AMOUNT_SELECTOR}{value:064x}{t:064x}{h:064x}")
}

/// Decode a single ABI `uint256` return word that must fit in u128.
pub fn decode_uint128(raw: &str) -> Result<u128, CollaboratorError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(digits)
        .map_err(|e| CollaboratorError::InvalidResponse(format!("eth_call result: {e}")))?;
    if bytes.len() != 32 {
        return Err(CollaboratorError::InvalidResponse(format!(
            "eth_call result is {} bytes, expected 32",
            bytes.len()
        )));
    }
    let (high, low) = bytes.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return Err(CollaboratorError::InvalidResponse(
            "getAmount result exceeds u128".into(),
        ));
    }
    let mut word = [0u8; 16];
    word.copy_from_slice(low);
    Ok(u128::from_be_bytes(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_data_layout() {
        let data = encode_get_amount(1, 2, 3);
        assert_eq!(data.len(), 2 + 8 + 3 * 64);
        assert!(data.starts_with("0x29c45cb6"));
        assert!(data.ends_with(&format!("{:064x}", 3)));
        assert_eq!(&data[10..74], &format!("{:064x}", 1));
    }

    #[test]
    fn call_data_for_full_width_value() {
        let data = encode_get_amount(u128::MAX, 0, 0);
        assert_eq!(&data[10..42], "0".repeat(32));
        assert_eq!(&data[42..74], "f".repeat(32));
    }

    #[test]
    fn decodes_word() {
        let raw = format!("0x{:064x}", 1_206_708_904_109_589_009_151_668u128);
        assert_eq!(decode_uint128(&raw).unwrap(), 1_206_708_904_109_589_009_151_668);
    }

    #[test]
    fn rejects_short_or_garbled_result() {
        assert!(decode_uint128("0x").is_err());
        assert!(decode_uint128("0x1234").is_err());
        assert!(decode_uint128(&format!("0x{}", "zz".repeat(32))).is_err());
    }

    #[test]
    fn rejects_result_above_u128() {
        let raw = format!("0x01{}", "0".repeat(62));
        assert_eq!(
            decode_uint128(&raw),
            Err(CollaboratorError::InvalidResponse("getAmount result exceeds u128".into()))
        );
    }

    #[test]
    fn parses_chain_quantities() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0x5a2").unwrap(), 1442);
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("137").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn transport_errors_are_retryable() {
        assert!(map_client_error(ClientError::RequestTimeout).is_retryable());
    }
}
