//! Idempotency key derivation.
//!
//! The caller supplies one stable key per logical attempt; every row the
//! ledger writes derives its own key from it. Derivation must be stable
//! across retries: a replayed operation regenerates the exact same keys and
//! collapses into the already-logged rows.

/// Key for the chat-pool leg of a reservation.
#[must_use]
pub fn chat_leg(key: &str) -> String {
    format!("{key}:chat")
}

/// Key for the user-pool leg of a reservation.
#[must_use]
pub fn user_leg(key: &str) -> String {
    format!("{key}:user")
}

/// Key for the compensating credit that releases a reservation leg.
#[must_use]
pub fn release(leg_key: &str) -> String {
    format!("{leg_key}:release")
}

/// Key for a credit purchase, derived from the payment provider's charge id.
#[must_use]
pub fn purchase(charge_id: &str) -> String {
    format!("purchase:{charge_id}")
}

/// Key for the refund of a purchase.
#[must_use]
pub fn refund_of(purchase_key: &str) -> String {
    format!("refund:{purchase_key}")
}

/// Key for the writeoff row recording a refund shortfall.
#[must_use]
pub fn writeoff_of(purchase_key: &str) -> String {
    format!("writeoff:{purchase_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_keys_are_distinct() {
        let key = "attempt-42";
        assert_ne!(chat_leg(key), user_leg(key));
        assert_ne!(release(&chat_leg(key)), release(&user_leg(key)));
    }

    #[test]
    fn test_derivation_is_stable() {
        assert_eq!(chat_leg("k"), chat_leg("k"));
        assert_eq!(purchase("ch_1"), "purchase:ch_1");
        assert_eq!(release("k:chat"), "k:chat:release");
    }

    #[test]
    fn test_refund_and_writeoff_keys_differ() {
        let key = purchase("ch_1");
        assert_ne!(refund_of(&key), writeoff_of(&key));
        assert_eq!(refund_of(&key), "refund:purchase:ch_1");
        assert_eq!(writeoff_of(&key), "writeoff:purchase:ch_1");
    }
}
