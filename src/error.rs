use ethers::abi::AbiDecode;
use ethers::contract::ContractError;
use ethers::providers::{Middleware, MiddlewareError};
use ethers::types::Bytes;
use thiserror::Error;

/// Recognized shapes of a failed submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCode {
    InsufficientGasFunds,
    ExecutionReverted,
    Other,
}

/// Failure taxonomy for every client operation. Validation never reaches the
/// network; query failures degrade a snapshot; simulation and submission
/// failures abort a mutation.
#[derive(Debug, Clone, Error)]
pub enum SwapClientError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("simulation rejected: {0}")]
    Simulation(String),
    #[error("submission failed: {message}")]
    Submission { code: FailureCode, message: String },
    #[error("unknown failure: {0}")]
    Unknown(String),
}

/// Selector of the solidity `Error(string)` revert.
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

fn decode_revert_string(data: &Bytes) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    String::decode(&data[4..]).ok()
}

/// Extracts the most specific failure reason available from a contract error.
/// Preference order: decoded revert string, then the JSON-RPC error the
/// provider attached, then the error's own rendering.
pub fn revert_reason<M: Middleware>(err: &ContractError<M>) -> String {
    if let Some(data) = err.as_revert() {
        if let Some(reason) = decode_revert_string(data) {
            return reason;
        }
    }
    if let Some(rpc_err) = err.as_middleware_error().and_then(MiddlewareError::as_error_response) {
        return rpc_err.message.clone();
    }
    err.to_string()
}

/// Buckets a submission failure message into the small set of shapes the user
/// gets a tailored notice for.
pub fn classify_failure(message: &str) -> FailureCode {
    let msg = message.to_lowercase();
    if msg.contains("insufficient funds") {
        FailureCode::InsufficientGasFunds
    } else if msg.contains("execution reverted")
        || msg.contains("gas required exceeds")
        || msg.contains("cannot estimate gas")
    {
        FailureCode::ExecutionReverted
    } else {
        FailureCode::Other
    }
}
