use concord_types::Timestamp;

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_holds_value() {
    assert_eq!(Timestamp::new(42).value(), 42);
    assert_eq!(Timestamp::from(-3).value(), -3);
}

#[test]
fn default_is_zero() {
    assert_eq!(Timestamp::default(), Timestamp::ZERO);
}

#[test]
fn now_is_after_epoch() {
    assert!(Timestamp::now() > Timestamp::ZERO);
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn ordering_by_value() {
    let a = Timestamp::new(100);
    let b = Timestamp::new(200);
    assert!(a < b);
    assert!(a.is_before(&b));
    assert!(b.is_after(&a));
}

#[test]
fn equal_timestamps_are_neither_before_nor_after() {
    let a = Timestamp::new(7);
    let b = Timestamp::new(7);
    assert_eq!(a, b);
    assert!(!a.is_before(&b));
    assert!(!a.is_after(&b));
}

// ── Ticking ──────────────────────────────────────────────────────

#[test]
fn next_is_strictly_greater() {
    let ts = Timestamp::new(9);
    assert_eq!(ts.next(), Timestamp::new(10));
}

#[test]
fn next_saturates() {
    let ts = Timestamp::new(i64::MAX);
    assert_eq!(ts.next(), ts);
}

#[test]
fn receive_exceeds_both() {
    let local = Timestamp::new(5);
    let remote = Timestamp::new(12);
    assert_eq!(local.receive(&remote), Timestamp::new(13));
    assert_eq!(remote.receive(&local), Timestamp::new(13));
}

#[test]
fn serializes_as_bare_number() {
    let ts = Timestamp::new(1234);
    assert_eq!(serde_json::to_string(&ts).unwrap(), "1234");
    let parsed: Timestamp = serde_json::from_str("1234").unwrap();
    assert_eq!(parsed, ts);
}

#[test]
fn display_is_raw_value() {
    assert_eq!(Timestamp::new(-8).to_string(), "-8");
}

// ── Properties ───────────────────────────────────────────────────

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn receive_is_after_both(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let (a, b) = (Timestamp::new(a), Timestamp::new(b));
            let r = a.receive(&b);
            prop_assert!(r.is_after(&a));
            prop_assert!(r.is_after(&b));
            prop_assert_eq!(r, b.receive(&a));
        }

        #[test]
        fn next_is_monotonic(v in i64::MIN..i64::MAX) {
            let t = Timestamp::new(v);
            prop_assert!(t.next().is_after(&t));
        }
    }
}
