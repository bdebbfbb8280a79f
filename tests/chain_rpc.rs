//! Chain client and transaction builder tests against a mock JSON-RPC node.

use alloy::primitives::{address, hex, keccak256, Address, Bytes, TxHash, U256};
use serde_json::{json, Value};
use std::sync::Arc;

use token_swap::blockchain::{
    BlockchainClient, BlockchainError, ConfirmationStatus, GasHints, TokenRef, TxBuilder, Wallet,
};
use token_swap::config::BlockchainConfig;

mod common;

// Anvil's first account
const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const TAKER: Address = address!("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
const TOKEN: Address = address!("0x6b175474e89094c44da98b954eedeac495271d0f");
const SPENDER: Address = address!("0xdef1c0ded9bec7f1a1670819833240f027b25eff");

const MINED: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const REVERTED: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

type Handler = dyn Fn(&str, &Value) -> Result<Value, String> + Send + Sync;

/// Serve JSON-RPC through `handler`; `Err` becomes a JSON-RPC error object.
async fn start_node<F>(handler: F) -> (String, common::RequestLog)
where
    F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
{
    let handler: Arc<Handler> = Arc::new(handler);
    let (addr, log) = common::start_programmable_backend(move |req| {
        let handler = handler.clone();
        async move {
            let body = req.json();
            let id = body["id"].clone();
            let method = body["method"].as_str().unwrap_or_default().to_string();
            let reply = match handler(&method, &body["params"]) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                Err(message) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": -32000, "message": message}
                }),
            };
            (200, reply.to_string())
        }
    })
    .await;
    (format!("http://{}", addr), log)
}

fn methods(log: &common::RequestLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|r| r.json()["method"].as_str().map(str::to_string))
        .collect()
}

fn word(value: u64) -> String {
    format!("0x{:064x}", value)
}

fn receipt(hash: &str, status: &str) -> Value {
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "cc".repeat(32)),
        "blockNumber": "0x64",
        "from": TAKER,
        "to": TOKEN,
        "cumulativeGasUsed": "0xc350",
        "gasUsed": "0xc350",
        "effectiveGasPrice": "0x3b9aca00",
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "status": status,
        "type": "0x0"
    })
}

/// Chain 31337 at block 101, gas price 1 gwei, nonce 7.
fn standard_node(method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "eth_chainId" => Ok(json!("0x7a69")),
        "eth_blockNumber" => Ok(json!("0x65")),
        "eth_getTransactionCount" => Ok(json!("0x7")),
        "eth_gasPrice" => Ok(json!("0x3b9aca00")),
        "eth_estimateGas" => Ok(json!("0xc350")),
        "eth_getBalance" => Ok(json!("0xde0b6b3a7640000")),
        "eth_call" => {
            let input = params[0]["input"]
                .as_str()
                .or_else(|| params[0]["data"].as_str())
                .unwrap_or_default();
            if input.starts_with("0x70a08231") {
                Ok(json!(word(1_000)))
            } else if input.starts_with("0xdd62ed3e") {
                Ok(json!(word(42)))
            } else {
                Err("execution reverted".to_string())
            }
        }
        "eth_getTransactionReceipt" => match params[0].as_str() {
            Some(MINED) => Ok(receipt(MINED, "0x1")),
            Some(REVERTED) => Ok(receipt(REVERTED, "0x0")),
            _ => Ok(Value::Null),
        },
        "eth_sendRawTransaction" => {
            let raw = hex::decode(params[0].as_str().unwrap_or_default())
                .map_err(|e| e.to_string())?;
            Ok(json!(keccak256(raw)))
        }
        other => Err(format!("method {} not supported", other)),
    }
}

fn chain_config(rpc_url: String) -> BlockchainConfig {
    BlockchainConfig {
        rpc_url,
        chain_id: 31337,
        rpc_timeout_secs: 5,
        confirmation_blocks: 2,
        confirmation_timeout_secs: 10,
        gas_price_multiplier: 1.5,
        max_gas_price_gwei: 100,
        ..Default::default()
    }
}

async fn builder(config: BlockchainConfig) -> TxBuilder {
    let client = BlockchainClient::new(config).await.unwrap();
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
    TxBuilder::new(client, wallet)
}

#[tokio::test]
async fn test_build_uses_node_gas_price_with_multiplier() {
    let (url, log) = start_node(standard_node).await;
    let builder = builder(chain_config(url)).await;

    let tx = builder
        .build(SPENDER, U256::from(5u64), Bytes::from_static(&[0x01]), GasHints::default())
        .await
        .unwrap();

    assert_eq!(tx.nonce, Some(7));
    assert_eq!(tx.gas_price, Some(1_500_000_000));
    assert_eq!(tx.gas, Some(50_000));
    assert_eq!(tx.chain_id, Some(31337));
    assert_eq!(tx.from, Some(TAKER));

    let called = methods(&log);
    assert!(called.contains(&"eth_gasPrice".to_string()));
    assert!(called.contains(&"eth_estimateGas".to_string()));
}

#[tokio::test]
async fn test_build_prefers_gas_hints() {
    let (url, log) = start_node(standard_node).await;
    let builder = builder(chain_config(url)).await;

    let hints = GasHints {
        gas_limit: Some(210_000),
        gas_price: Some(2_000_000_000),
    };
    let tx = builder
        .build(SPENDER, U256::ZERO, Bytes::new(), hints)
        .await
        .unwrap();

    assert_eq!(tx.gas_price, Some(2_000_000_000));
    assert_eq!(tx.gas, Some(210_000));
    assert_eq!(tx.nonce, Some(7));

    let called = methods(&log);
    assert!(!called.contains(&"eth_gasPrice".to_string()));
    assert!(!called.contains(&"eth_estimateGas".to_string()));
}

#[tokio::test]
async fn test_build_rejects_gas_price_above_ceiling() {
    let (url, log) = start_node(|method, params| match method {
        "eth_gasPrice" => Ok(json!("0x2540be400")), // 10 gwei
        _ => standard_node(method, params),
    })
    .await;
    let mut config = chain_config(url);
    config.max_gas_price_gwei = 12;
    let builder = builder(config).await;

    let err = builder
        .build(SPENDER, U256::ZERO, Bytes::new(), GasHints::default())
        .await
        .unwrap_err();

    match err {
        BlockchainError::GasPriceTooHigh {
            current_gwei,
            max_gwei,
        } => {
            assert_eq!(current_gwei, 15);
            assert_eq!(max_gwei, 12);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!methods(&log).contains(&"eth_estimateGas".to_string()));
}

#[tokio::test]
async fn test_token_balance_and_allowance() {
    let (url, log) = start_node(standard_node).await;
    let client = BlockchainClient::new(chain_config(url)).await.unwrap();

    let balance = client.token_balance(TokenRef::Erc20(TOKEN), TAKER).await.unwrap();
    assert_eq!(balance, U256::from(1_000u64));

    let native = client.token_balance(TokenRef::Native, TAKER).await.unwrap();
    assert_eq!(native, U256::from(1_000_000_000_000_000_000u64));

    let allowance = client.token_allowance(TOKEN, TAKER, SPENDER).await.unwrap();
    assert_eq!(allowance, U256::from(42u64));

    let calls: Vec<Value> = log
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.json())
        .filter(|body| body["method"] == "eth_call")
        .collect();
    assert_eq!(calls.len(), 2);
    let owner = hex::encode(TAKER);
    for call in &calls {
        let params = &call["params"][0];
        let input = params["input"]
            .as_str()
            .or_else(|| params["data"].as_str())
            .unwrap();
        assert!(input.contains(&owner));
        assert_eq!(
            params["to"].as_str().unwrap().to_lowercase(),
            TOKEN.to_string().to_lowercase()
        );
    }
}

#[tokio::test]
async fn test_eth_call_revert_is_rpc_error() {
    let (url, _log) = start_node(|method, params| match method {
        "eth_call" => Err("execution reverted".to_string()),
        _ => standard_node(method, params),
    })
    .await;
    let client = BlockchainClient::new(chain_config(url)).await.unwrap();

    let err = client
        .token_allowance(TOKEN, TAKER, SPENDER)
        .await
        .unwrap_err();
    assert!(matches!(err, BlockchainError::Rpc(_)));
}

#[tokio::test]
async fn test_wait_for_confirmation_confirmed() {
    let (url, _log) = start_node(standard_node).await;
    let builder = builder(chain_config(url)).await;

    let status = builder
        .wait_for_confirmation(MINED.parse::<TxHash>().unwrap(), 10)
        .await
        .unwrap();
    assert_eq!(status, ConfirmationStatus::Confirmed { block_number: 100 });
}

#[tokio::test]
async fn test_wait_for_confirmation_reverted() {
    let (url, _log) = start_node(standard_node).await;
    let builder = builder(chain_config(url)).await;

    let status = builder
        .wait_for_confirmation(REVERTED.parse::<TxHash>().unwrap(), 10)
        .await
        .unwrap();
    assert!(matches!(status, ConfirmationStatus::Failed(_)));
}

#[tokio::test]
async fn test_wait_for_confirmation_depth_not_reached() {
    let (url, _log) = start_node(standard_node).await;
    let mut config = chain_config(url);
    // Receipt is in block 100 and the head is 101: two confirmations
    config.confirmation_blocks = 3;
    let builder = builder(config).await;

    let hash = MINED.parse::<TxHash>().unwrap();
    let err = builder.wait_for_confirmation(hash, 1).await.unwrap_err();
    assert!(matches!(
        err,
        BlockchainError::ConfirmationTimeout { tx_hash, secs: 1 } if tx_hash == hash
    ));
}

#[tokio::test]
async fn test_approve_signs_and_broadcasts() {
    let (url, log) = start_node(standard_node).await;
    let builder = builder(chain_config(url)).await;

    let hash = builder
        .approve(TOKEN, SPENDER, U256::from(100u64))
        .await
        .unwrap();

    let sent: Vec<Value> = log
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.json())
        .filter(|body| body["method"] == "eth_sendRawTransaction")
        .collect();
    assert_eq!(sent.len(), 1);
    let raw = hex::decode(sent[0]["params"][0].as_str().unwrap()).unwrap();
    assert_eq!(hash, keccak256(&raw));
}

#[tokio::test]
async fn test_already_known_on_failover_counts_as_sent() {
    let (url, _log) = start_node(|method, params| match method {
        "eth_sendRawTransaction" => Err("already known".to_string()),
        _ => standard_node(method, params),
    })
    .await;
    // The primary accepts nothing; the failover already holds the transaction
    let mut config = chain_config("http://127.0.0.1:1".to_string());
    config.rpc_timeout_secs = 2;
    config.failover_urls = vec![url];
    let builder = builder(config).await;

    let hints = GasHints {
        gas_limit: Some(21_000),
        gas_price: Some(1_000_000_000),
    };
    let tx = builder
        .build(SPENDER, U256::from(1u64), Bytes::new(), hints)
        .await
        .unwrap();
    let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, 31337).unwrap();
    let envelope = wallet.sign_transaction(tx).await.unwrap();
    let expected = *envelope.tx_hash();

    let hash = builder.client().send_signed(envelope).await.unwrap();
    assert_eq!(hash, expected);
}

#[tokio::test]
async fn test_other_broadcast_errors_still_fail() {
    let (url, _log) = start_node(|method, params| match method {
        "eth_sendRawTransaction" => Err("nonce too low".to_string()),
        _ => standard_node(method, params),
    })
    .await;
    let builder = builder(chain_config(url)).await;

    let hints = GasHints {
        gas_limit: Some(21_000),
        gas_price: Some(1_000_000_000),
    };
    let tx = builder
        .build(SPENDER, U256::from(1u64), Bytes::new(), hints)
        .await
        .unwrap();
    let err = builder.send(tx).await.unwrap_err();
    assert!(err.to_string().contains("eth_sendRawTransaction"));
}
