//! Thin `eth_call` + ABI decode helper shared by every strategy that
//! reads a view function off a token or pool contract.

use crate::RouterError;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;
use oracle_rpc_client::RpcClient;

/// Call the view function `call` on contract `to` at `block`, decoding
/// its return value.
pub async fn call_view<C: SolCall + Send + Sync>(
    rpc: &dyn RpcClient,
    to: Address,
    call: C,
    block: u64,
) -> Result<C::Return, RouterError> {
    let mut tx = TransactionRequest::default();
    tx.to = Some(to.into());
    tx.input = TransactionInput::new(Bytes::from(call.abi_encode()));
    let data = rpc.call(&tx, Some(block)).await?;
    C::abi_decode_returns(&data).map_err(|e| RouterError::Rpc(oracle_rpc_client::RpcError::Decode(e.to_string())))
}
