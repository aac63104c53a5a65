//! Structured log helpers.
//!
//! Every pipeline log line carries the same field names so that log
//! aggregation can join them: `tx_id`, `phase`, `peer`.

/// Log a transaction-scoped event with the standard fields.
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $phase:expr, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            phase = %$phase,
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-scoped event with the standard fields.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $msg:expr, $peer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_without_subscriber() {
        let tx_id = "abc";
        crate::log_tx_event!(info, "proposal", "proposal sent", tx_id, peers = 2);
        crate::log_peer_event!(warn, "peer unreachable", "peer0", error = "refused");
    }
}
