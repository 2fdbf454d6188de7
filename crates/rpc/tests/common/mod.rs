// rpc/tests/common/mod.rs
#![allow(dead_code)]

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use rpc::{RpcConfig, RpcRequest};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = Arc<dyn Fn(&RpcRequest) -> String + Send + Sync>;

/// Scripted JSON-RPC node served over real HTTP
pub struct MockNode {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RpcRequest>>>,
}

impl MockNode {
    pub async fn spawn<F>(handler: F) -> Self
    where
        F: Fn(&RpcRequest) -> String + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let make_svc = {
            let handler = handler.clone();
            let requests = requests.clone();
            make_service_fn(move |_| {
                let handler = handler.clone();
                let requests = requests.clone();
                async move {
                    Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                        let handler = handler.clone();
                        let requests = requests.clone();
                        async move {
                            let bytes = hyper::body::to_bytes(req.into_body()).await?;
                            let rpc_request: RpcRequest = serde_json::from_slice(&bytes)
                                .expect("client sent a malformed envelope");
                            let body = handler(&rpc_request);
                            requests.lock().unwrap().push(rpc_request);
                            Ok::<_, hyper::Error>(
                                Response::builder()
                                    .header("Content-Type", "application/json")
                                    .body(Body::from(body))
                                    .unwrap(),
                            )
                        }
                    }))
                }
            })
        };

        let bind_addr: SocketAddr = ([127, 0, 0, 1], 0).into();
        let server = Server::bind(&bind_addr).serve(make_svc);
        let addr = server.local_addr();
        tokio::spawn(server);

        Self { addr, requests }
    }

    pub fn config(&self) -> RpcConfig {
        config_for(self.addr)
    }

    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }
}

pub fn config_for(addr: SocketAddr) -> RpcConfig {
    RpcConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        chain_id: None,
        request_timeout: Duration::from_secs(5),
    }
}

pub fn ok(request: &RpcRequest, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": request.id, "result": result }).to_string()
}

pub fn error(request: &RpcRequest, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": request.id,
        "error": { "code": code, "message": message }
    })
    .to_string()
}

pub fn block_json(number: u64, full: bool, tx_count: usize) -> Value {
    let transactions: Vec<Value> = (0..tx_count)
        .map(|i| {
            let hash = format!("0x{:064x}", number * 1000 + i as u64);
            if full {
                json!({
                    "blockHash": format!("0x{:064x}", number),
                    "blockNumber": format!("0x{:x}", number),
                    "from": "0x1111111111111111111111111111111111111111",
                    "gas": "0x5208",
                    "gasPrice": "0x0",
                    "hash": hash,
                    "input": "0x",
                    "nonce": format!("0x{:x}", i),
                    "to": "0x2222222222222222222222222222222222222222",
                    "transactionIndex": format!("0x{:x}", i),
                    "value": "0x1",
                    "v": "0x1c",
                    "r": "0x1",
                    "s": "0x2"
                })
            } else {
                json!(hash)
            }
        })
        .collect();

    json!({
        "hash": format!("0x{:064x}", number),
        "parentHash": format!("0x{:064x}", number.saturating_sub(1)),
        "number": format!("0x{:x}", number),
        "miner": "0x0000000000000000000000000000000000000000",
        "gasLimit": "0xe0000000",
        "gasUsed": "0x0",
        "timestamp": "0x5f5e100",
        "transactions": transactions,
        "uncles": []
    })
}

/// Parse the hex block-number parameter of a block request
pub fn requested_number(request: &RpcRequest) -> u64 {
    let hex = request.params[0].as_str().unwrap();
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).unwrap()
}
