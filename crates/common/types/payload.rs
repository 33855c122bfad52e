use bytes::Bytes;
use ethereum_types::{Address, Bloom, H256, U256};
use serde::{Deserialize, Serialize};

/// Execution-layer payload as exchanged with a consensus-layer client.
///
/// Consensus clients spell field names in snake_case and quantities as
/// decimal strings; the execution layer wants camelCase and minimal 0x-hex.
/// Every field accepts both spellings on input and is always emitted in the
/// execution-layer form. Absent optional sections stay absent in the output,
/// they are never null-filled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayload {
    #[serde(alias = "parent_hash")]
    pub parent_hash: H256,
    #[serde(alias = "fee_recipient")]
    pub fee_recipient: Address,
    #[serde(alias = "state_root")]
    pub state_root: H256,
    #[serde(alias = "receipts_root")]
    pub receipts_root: H256,
    #[serde(alias = "logs_bloom")]
    pub logs_bloom: Bloom,
    #[serde(alias = "prev_randao")]
    pub prev_randao: H256,
    #[serde(alias = "block_number", with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub block_number: u64,
    #[serde(alias = "gas_limit", with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub gas_limit: u64,
    #[serde(alias = "gas_used", with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub gas_used: u64,
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub timestamp: u64,
    #[serde(alias = "extra_data", with = "crate::serde_utils::bytes")]
    pub extra_data: Bytes,
    #[serde(
        alias = "base_fee_per_gas",
        with = "crate::serde_utils::u256::hex_or_dec_str"
    )]
    pub base_fee_per_gas: U256,
    #[serde(alias = "block_hash")]
    pub block_hash: H256,
    #[serde(with = "crate::serde_utils::bytes::vec")]
    pub transactions: Vec<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<PayloadWithdrawal>>,
    #[serde(
        alias = "blob_gas_used",
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u64::hex_or_dec_str_opt"
    )]
    pub blob_gas_used: Option<u64>,
    #[serde(
        alias = "excess_blob_gas",
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u64::hex_or_dec_str_opt"
    )]
    pub excess_blob_gas: Option<u64>,
    #[serde(
        alias = "deposit_requests",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub deposit_requests: Option<Vec<DepositRequest>>,
    #[serde(
        alias = "withdrawal_requests",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub withdrawal_requests: Option<Vec<WithdrawalRequest>>,
    #[serde(
        alias = "consolidation_requests",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub consolidation_requests: Option<Vec<ConsolidationRequest>>,
    #[serde(
        alias = "execution_witness",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_witness: Option<ExecutionWitness>,
}

impl ExecutionPayload {
    /// Maps a consensus-layer block payload into the execution-layer form.
    /// Pure field mapping; nothing is validated beyond what parsing needs.
    pub fn from_beacon_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadWithdrawal {
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub index: u64,
    #[serde(
        alias = "validator_index",
        with = "crate::serde_utils::u64::hex_or_dec_str"
    )]
    pub validator_index: u64,
    pub address: Address,
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    #[serde(with = "crate::serde_utils::bytes")]
    pub pubkey: Bytes,
    #[serde(alias = "withdrawal_credentials")]
    pub withdrawal_credentials: H256,
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub amount: u64,
    #[serde(with = "crate::serde_utils::bytes")]
    pub signature: Bytes,
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub index: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[serde(alias = "source_address")]
    pub source_address: Address,
    #[serde(alias = "validator_pubkey", with = "crate::serde_utils::bytes")]
    pub validator_pubkey: Bytes,
    #[serde(with = "crate::serde_utils::u64::hex_or_dec_str")]
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationRequest {
    #[serde(alias = "source_address")]
    pub source_address: Address,
    #[serde(alias = "source_pubkey", with = "crate::serde_utils::bytes")]
    pub source_pubkey: Bytes,
    #[serde(alias = "target_pubkey", with = "crate::serde_utils::bytes")]
    pub target_pubkey: Bytes,
}

/// Stateless-execution witness some consensus clients attach to payloads.
/// Nested keys may arrive in either spelling and are re-emitted camelCase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionWitness {
    #[serde(
        alias = "parent_state_root",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_state_root: Option<H256>,
    #[serde(alias = "state_diff")]
    pub state_diff: Vec<StateDiff>,
    #[serde(
        alias = "verkle_proof",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub verkle_proof: Option<VerkleProof>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDiff {
    #[serde(with = "crate::serde_utils::bytes")]
    pub stem: Bytes,
    #[serde(alias = "suffix_diffs")]
    pub suffix_diffs: Vec<SuffixDiff>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixDiff {
    pub suffix: u64,
    // `null` is a meaningful value here (no state at that suffix), so these
    // are emitted even when absent.
    #[serde(alias = "current_value", default)]
    pub current_value: Option<H256>,
    #[serde(alias = "new_value", default)]
    pub new_value: Option<H256>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerkleProof {
    #[serde(
        alias = "commitments_by_path",
        with = "crate::serde_utils::bytes::vec"
    )]
    pub commitments_by_path: Vec<Bytes>,
    #[serde(with = "crate::serde_utils::bytes")]
    pub d: Bytes,
    #[serde(alias = "depth_extension_present", with = "crate::serde_utils::bytes")]
    pub depth_extension_present: Bytes,
    #[serde(alias = "ipa_proof")]
    pub ipa_proof: IpaProof,
    #[serde(alias = "other_stems", with = "crate::serde_utils::bytes::vec")]
    pub other_stems: Vec<Bytes>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpaProof {
    #[serde(with = "crate::serde_utils::bytes::vec")]
    pub cl: Vec<Bytes>,
    #[serde(with = "crate::serde_utils::bytes::vec")]
    pub cr: Vec<Bytes>,
    #[serde(alias = "final_evaluation", with = "crate::serde_utils::bytes")]
    pub final_evaluation: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn beacon_payload_json() -> serde_json::Value {
        json!({
            "parent_hash": "0x48e29e7357408113a4166e04e9f1aeff0680daa2b97ba93df6512a73ddf7a154",
            "fee_recipient": "0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba",
            "state_root": "0x9de6f95cb4ff4ef22a73705d6ba38c4b927c7bca9887ef5d24a734bb863218d9",
            "receipts_root": "0x035d56bac3f47246c5eed0e6642ca40dc262f9144b582f058bc23ded72aa72fa",
            "logs_bloom": format!("0x{}", "00".repeat(256)),
            "prev_randao": "0x0000000000000000000000000000000000000000000000000000000000000000",
            "block_number": "123",
            "gas_limit": "30000000",
            "gas_used": "21000",
            "timestamp": "1000",
            "extra_data": "0x",
            "base_fee_per_gas": "7",
            "block_hash": "0x94fb81ef7259ad4cef032745a2a5254babe26037f2850d320b872692f7c60178",
            "transactions": ["0x7e01"]
        })
    }

    #[test]
    fn numbers_are_normalized_to_minimal_hex() {
        let payload = ExecutionPayload::from_beacon_json(beacon_payload_json()).unwrap();
        assert_eq!(payload.block_number, 123);

        let output = serde_json::to_value(&payload).unwrap();
        assert_eq!(output["blockNumber"], "0x7b");
        assert_eq!(output["gasUsed"], "0x5208");
        assert_eq!(output["baseFeePerGas"], "0x7");
        assert_eq!(output["extraData"], "0x");
        // Input spelling is gone.
        assert!(output.get("block_number").is_none());
    }

    #[test]
    fn absent_optional_sections_stay_absent() {
        let payload = ExecutionPayload::from_beacon_json(beacon_payload_json()).unwrap();
        let output = serde_json::to_value(&payload).unwrap();
        assert!(output.get("withdrawals").is_none());
        assert!(output.get("blobGasUsed").is_none());
        assert!(output.get("executionWitness").is_none());
        assert!(output.get("depositRequests").is_none());
    }

    #[test]
    fn withdrawals_and_blob_fields_map_to_camel_case() {
        let mut input = beacon_payload_json();
        input["withdrawals"] = json!([{
            "index": "5",
            "validator_index": "42",
            "address": "0x6177843db3138ae69679a54b95cf345ed759450d",
            "amount": "1000000000"
        }]);
        input["blob_gas_used"] = json!("131072");

        let payload = ExecutionPayload::from_beacon_json(input).unwrap();
        assert_eq!(payload.blob_gas_used, Some(131072));

        let output = serde_json::to_value(&payload).unwrap();
        assert_eq!(output["blobGasUsed"], "0x20000");
        let withdrawal = &output["withdrawals"][0];
        assert_eq!(withdrawal["validatorIndex"], "0x2a");
        assert_eq!(withdrawal["amount"], "0x3b9aca00");
        assert!(withdrawal.get("validator_index").is_none());
    }

    #[test]
    fn execution_witness_accepts_both_spellings() {
        let witness = json!({
            "parent_state_root": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "state_diff": [{
                "stem": "0xab",
                "suffix_diffs": [{
                    "suffix": 64,
                    "current_value": null,
                    "new_value": "0x2222222222222222222222222222222222222222222222222222222222222222"
                }]
            }]
        });
        let mut input = beacon_payload_json();
        input["execution_witness"] = witness;

        let payload = ExecutionPayload::from_beacon_json(input.clone()).unwrap();
        let output = serde_json::to_value(&payload).unwrap();
        let witness_out = &output["executionWitness"];
        assert!(witness_out.get("stateDiff").is_some());
        assert!(witness_out.get("state_diff").is_none());
        assert_eq!(witness_out["stateDiff"][0]["suffixDiffs"][0]["suffix"], 64);
        assert!(witness_out["stateDiff"][0]["suffixDiffs"][0]["currentValue"].is_null());

        // The witness may already be camelCased; the mapping is the same.
        let mut camel_input = beacon_payload_json();
        camel_input["execution_witness"] = output["executionWitness"].clone();
        let reparsed = ExecutionPayload::from_beacon_json(camel_input).unwrap();
        assert_eq!(reparsed.execution_witness, payload.execution_witness);
    }
}
