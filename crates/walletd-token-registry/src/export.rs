//! Portable export document

use crate::address::ChainAddress;
use crate::record::TokenRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use walletd_error::ValidationError;

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// The JSON envelope produced by an export and accepted by an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Owner the records were exported from
    pub user_address: ChainAddress,
    /// The owner's records, without metadata
    pub tokens: Vec<TokenRecord>,
    /// Export time, RFC 3339
    pub exported_at: DateTime<Utc>,
    /// Format version
    pub version: String,
}

impl ExportDocument {
    /// Pulls the raw `tokens` array out of an import payload without
    /// validating the entries. Envelope fields other than `tokens` are
    /// ignored, so documents exported by another owner import cleanly.
    pub fn token_values(payload: &str) -> Result<Vec<Value>, ValidationError> {
        let mut document: Value = serde_json::from_str(payload)?;
        match document.get_mut("tokens").map(Value::take) {
            Some(Value::Array(tokens)) => Ok(tokens),
            Some(_) => Err(ValidationError::InvalidDocument(
                "`tokens` is not an array".to_string(),
            )),
            None => Err(ValidationError::InvalidDocument(
                "missing `tokens` array".to_string(),
            )),
        }
    }

    /// Decodes and validates a single entry of the `tokens` array.
    pub fn record_from_value(value: Value) -> Result<TokenRecord, ValidationError> {
        let record: TokenRecord = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> Value {
        json!({
            "address": "0x00000000000000000000000000000000000000bb",
            "name": "Test",
            "symbol": "TST",
            "initialSupply": "1000",
            "maxSupply": "10000",
            "decimals": 18,
            "creator": "0x00000000000000000000000000000000000000aa",
            "createdAt": 1700000000000u64,
            "transactionHash": "0x01",
            "network": "Edgen Chain",
            "chainId": 4207
        })
    }

    #[test]
    fn test_token_values_requires_array() {
        assert!(ExportDocument::token_values("not json").is_err());
        assert!(ExportDocument::token_values("{}").is_err());
        assert!(ExportDocument::token_values(r#"{"tokens": {}}"#).is_err());
        assert!(ExportDocument::token_values(r#"{"tokens": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_record_from_value() {
        let record = ExportDocument::record_from_value(entry()).unwrap();
        assert_eq!(record.symbol, "TST");
        assert_eq!(record.chain_id, 4207);
    }

    #[test]
    fn test_record_missing_tx_hash_defaults_empty() {
        let mut value = entry();
        value.as_object_mut().unwrap().remove("transactionHash");
        let record = ExportDocument::record_from_value(value).unwrap();
        assert!(record.transaction_hash.is_empty());
    }

    #[test]
    fn test_record_rejects_bad_entries() {
        let mut no_address = entry();
        no_address.as_object_mut().unwrap().remove("address");
        assert!(ExportDocument::record_from_value(no_address).is_err());

        let mut bad_decimals = entry();
        bad_decimals["decimals"] = json!(30);
        assert_eq!(
            ExportDocument::record_from_value(bad_decimals).unwrap_err(),
            ValidationError::DecimalsOutOfRange(30)
        );

        let mut bad_address = entry();
        bad_address["address"] = json!("0x1234");
        assert!(ExportDocument::record_from_value(bad_address).is_err());
    }
}
