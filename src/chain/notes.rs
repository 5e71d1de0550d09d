//! Notes contract binding
//!
//! The interface description is loaded at runtime, so calls are encoded with
//! the dynamic ABI coder rather than generated bindings.

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi};
use alloy_primitives::{Address, Bytes};
use serde_json::json;

use crate::chain::provider::{ProviderError, RpcTransport, ETH_CALL};
use crate::chain::tx::{send_and_confirm, Receipt, ReceiptPolicy, TransactionInput, TransactionRequest, TxError};
use crate::constants::{NOTES_APPEND_FN, NOTES_LIST_FN};
use crate::models::Note;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("Notes contract address is not configured (set NOTES_CONTRACT_ADDRESS)")]
    NotConfigured,
    #[error("contract interface has no `{0}` function with the expected signature")]
    MissingFunction(&'static str),
    #[error("ABI error: {0}")]
    Abi(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Tx(#[from] TxError),
}

/// Address plus interface of the deployed notes contract
#[derive(Clone, Debug)]
pub struct NotesContract {
    address: Address,
    list_fn: Function,
    append_fn: Function,
}

impl NotesContract {
    pub fn new(address: Address, abi: &JsonAbi) -> Result<Self, ContractError> {
        let list_fn = find_function(abi, NOTES_LIST_FN, |f| f.inputs.is_empty())?;
        let append_fn = find_function(abi, NOTES_APPEND_FN, |f| {
            f.inputs.len() == 1 && f.inputs[0].ty == "string"
        })?;
        Ok(NotesContract { address, list_fn, append_fn })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn encode_list_call(&self) -> Result<Bytes, ContractError> {
        let data = self.list_fn.abi_encode_input(&[]).map_err(|e| ContractError::Abi(e.to_string()))?;
        Ok(data.into())
    }

    pub fn encode_append_call(&self, text: &str) -> Result<Bytes, ContractError> {
        let data = self
            .append_fn
            .abi_encode_input(&[DynSolValue::String(text.to_string())])
            .map_err(|e| ContractError::Abi(e.to_string()))?;
        Ok(data.into())
    }

    /// Decode the listing call's return data, keeping contract order
    pub fn decode_notes(&self, data: &[u8]) -> Result<Vec<Note>, ContractError> {
        let outputs = self
            .list_fn
            .abi_decode_output(data, false)
            .map_err(|e| ContractError::Abi(e.to_string()))?;

        match outputs.into_iter().next() {
            Some(DynSolValue::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    DynSolValue::String(text) => Ok(Note::new(text)),
                    other => Err(ContractError::Abi(format!("expected string note, got {:?}", other))),
                })
                .collect(),
            other => Err(ContractError::Abi(format!("expected string[] output, got {:?}", other))),
        }
    }

    /// Read every stored note
    pub async fn fetch_notes<P>(&self, provider: &P) -> Result<Vec<Note>, ContractError>
    where
        P: RpcTransport + ?Sized,
    {
        let call = json!([{ "to": self.address, "data": self.encode_list_call()? }, "latest"]);
        let value = provider.request(ETH_CALL, call).await?;
        let data: Bytes = serde_json::from_value(value)
            .map_err(|e| ProviderError::InvalidResponse(format!("eth_call result: {}", e)))?;
        let notes = self.decode_notes(&data)?;
        tracing::info!(count = notes.len(), contract = %self.address, "Fetched notes");
        Ok(notes)
    }

    /// Append a note from `from` and wait until the transaction is mined
    pub async fn add_note<P>(&self, provider: &P, from: Address, text: &str, policy: ReceiptPolicy) -> Result<Receipt, ContractError>
    where
        P: RpcTransport + ?Sized,
    {
        let tx = TransactionRequest::default()
            .from(from)
            .to(self.address)
            .input(TransactionInput::both(self.encode_append_call(text)?));
        let receipt = send_and_confirm(provider, &tx, policy).await?;
        tracing::info!(hash = %receipt.transaction_hash, "Note added");
        Ok(receipt)
    }
}

fn find_function(
    abi: &JsonAbi,
    name: &'static str,
    matches: impl Fn(&Function) -> bool,
) -> Result<Function, ContractError> {
    abi.function(name)
        .and_then(|overloads| overloads.iter().find(|f| matches(f)))
        .cloned()
        .ok_or(ContractError::MissingFunction(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use alloy_primitives::address;

    use crate::chain::provider::{ETH_GET_TRANSACTION_RECEIPT, ETH_SEND_TRANSACTION};
    use crate::chain::testing::{receipt_json, FakeProvider, TX_HASH};
    use crate::constants::DEFAULT_NOTES_ABI;

    const CONTRACT: Address = address!("00000000000000000000000000000000000c0ffe");
    const FROM: Address = address!("00000000000000000000000000000000000000a1");

    fn contract() -> NotesContract {
        let abi: JsonAbi = serde_json::from_str(DEFAULT_NOTES_ABI).unwrap();
        NotesContract::new(CONTRACT, &abi).unwrap()
    }

    /// Return data of `getNotes()` for the given notes
    fn encoded_notes(notes: &[&str]) -> Bytes {
        let list = DynSolValue::Array(notes.iter().map(|n| DynSolValue::String(n.to_string())).collect());
        DynSolValue::Tuple(vec![list]).abi_encode_params().into()
    }

    #[test]
    fn test_selectors() {
        let contract = contract();
        assert_eq!(&contract.encode_list_call().unwrap()[..], &contract.list_fn.selector()[..]);
        let append = contract.encode_append_call("hi").unwrap();
        assert_eq!(&append[..4], &contract.append_fn.selector()[..]);
        assert!(append.len() > 4);
    }

    #[test]
    fn test_decode_keeps_contract_order() {
        let notes = contract().decode_notes(&encoded_notes(&["b", "a", "c"])).unwrap();
        let texts: Vec<&str> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_missing_function() {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{"type":"function","name":"getNotes","inputs":[],"outputs":[{"name":"","type":"string[]"}],"stateMutability":"view"}]"#,
        )
        .unwrap();
        assert_eq!(
            NotesContract::new(CONTRACT, &abi).unwrap_err(),
            ContractError::MissingFunction("addNote")
        );
    }

    #[tokio::test]
    async fn test_fetch_notes_uses_eth_call() {
        let provider = FakeProvider::new().with_response(ETH_CALL, Ok(json!(encoded_notes(&["first", "second"]))));

        let notes = contract().fetch_notes(&provider).await.unwrap();
        assert_eq!(notes, vec![Note::new("first"), Note::new("second")]);

        let calls = provider.calls();
        let (_, params) = &calls[0];
        assert_eq!(params[0]["to"].as_str().unwrap().to_lowercase(), "0x00000000000000000000000000000000000c0ffe");
        assert_eq!(params[1], "latest");
    }

    #[tokio::test]
    async fn test_add_then_fetch_reconciles() {
        let provider = FakeProvider::new()
            .with_response(ETH_SEND_TRANSACTION, Ok(json!(TX_HASH)))
            .with_response(ETH_GET_TRANSACTION_RECEIPT, Ok(receipt_json("0x1")))
            .with_response(ETH_CALL, Ok(json!(encoded_notes(&["hello"]))));
        let contract = contract();
        let policy = ReceiptPolicy { interval: Duration::from_millis(1), max_attempts: 2 };

        contract.add_note(&provider, FROM, "hello", policy).await.unwrap();
        let notes = contract.fetch_notes(&provider).await.unwrap();
        assert_eq!(notes, vec![Note::new("hello")]);

        let calls = provider.calls();
        let (_, params) = &calls[0];
        let encoded = contract.encode_append_call("hello").unwrap().to_string();
        assert_eq!(params[0]["data"].as_str().unwrap(), encoded);
        assert_eq!(params[0]["input"].as_str().unwrap(), encoded);
    }

    #[tokio::test]
    async fn test_fetch_error_surfaces() {
        let provider = FakeProvider::new()
            .with_response(ETH_CALL, Err(ProviderError::Rpc { code: -32000, message: "execution reverted".into() }));
        let err = contract().fetch_notes(&provider).await.unwrap_err();
        assert!(matches!(err, ContractError::Provider(_)));
    }
}
