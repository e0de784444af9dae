//! Plain data types persisted by `Database` that don't belong in `moksha-core` because they are
//! mint-internal bookkeeping, not part of the wallet/mint wire protocol.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingInvoice {
    pub payment_hash: String,
    pub amount: u64,
    pub payment_request: String,
}

impl PendingInvoice {
    pub const fn new(payment_hash: String, amount: u64, payment_request: String) -> Self {
        Self {
            payment_hash,
            amount,
            payment_request,
        }
    }
}
