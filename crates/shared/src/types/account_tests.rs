use rstest::rstest;

use super::account::{AccountKind, AccountRef};

#[test]
fn test_chat_sorts_before_user() {
    assert!(AccountKind::Chat < AccountKind::User);
    assert!(AccountRef::chat(999) < AccountRef::user(1));
}

#[test]
fn test_lock_order_is_deterministic() {
    let mut refs = vec![
        AccountRef::user(7),
        AccountRef::chat(42),
        AccountRef::user(3),
    ];
    refs.sort();
    assert_eq!(
        refs,
        vec![
            AccountRef::chat(42),
            AccountRef::user(3),
            AccountRef::user(7),
        ]
    );
}

#[rstest]
#[case(AccountRef::chat(42), "chat:42")]
#[case(AccountRef::user(-5), "user:-5")]
fn test_display(#[case] account: AccountRef, #[case] expected: &str) {
    assert_eq!(account.to_string(), expected);
}

#[test]
fn test_same_kind_orders_by_external_id() {
    assert!(AccountRef::chat(1) < AccountRef::chat(2));
    assert!(AccountRef::user(-1) < AccountRef::user(0));
}
