use crate::manager::LinkSetting;
use crate::manager::ledger::LinkLedger;

use models::MacAddress;

fn sta(n: u8) -> MacAddress {
    MacAddress::new([0x02, 0, 0, 0, n, 0])
}

/// **VALUE**: Verifies links are keyed by direction and the last acknowledged value wins.
///
/// **WHY THIS MATTERS**: wmediumd links are asymmetric. Reporting the `b -> a` value for a
/// query on `a -> b` would mislead a harness checking its topology.
///
/// **BUG THIS CATCHES**: Would catch an unordered key or a ledger that keeps the first value.
#[test]
fn given_recorded_links_when_queried_then_returns_latest_value_per_direction() {
    // GIVEN: Two updates on a -> b and one on b -> a
    let mut ledger = LinkLedger::default();
    ledger.record(sta(0), sta(1), LinkSetting::Snr(10));
    ledger.record(sta(0), sta(1), LinkSetting::Snr(20));
    ledger.record(sta(1), sta(0), LinkSetting::ErrorProb(0.1));

    // WHEN / THEN
    assert_eq!(ledger.get(sta(0), sta(1)), Some(&LinkSetting::Snr(20)));
    assert_eq!(ledger.get(sta(1), sta(0)), Some(&LinkSetting::ErrorProb(0.1)));
    assert_eq!(ledger.get(sta(0), sta(2)), None);
    assert_eq!(ledger.len(), 2);
}

/// **VALUE**: Verifies removing an interface forgets every link touching it.
#[test]
fn given_interface_removed_when_forget_interface_called_then_links_on_both_sides_dropped() {
    // GIVEN: Links around sta 1 and one unrelated link
    let mut ledger = LinkLedger::default();
    ledger.record(sta(0), sta(1), LinkSetting::Snr(10));
    ledger.record(sta(1), sta(2), LinkSetting::Snr(10));
    ledger.record(sta(0), sta(2), LinkSetting::Snr(15));

    // WHEN
    ledger.forget_interface(sta(1));

    // THEN
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.get(sta(0), sta(2)), Some(&LinkSetting::Snr(15)));
}
