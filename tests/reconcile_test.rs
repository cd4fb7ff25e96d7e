use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use haraj_digest::{reconcile, AdRecord, Options, Store, StoreEntry};
use proptest::prelude::*;

fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 2, hour, min, sec)
        .single()
        .expect("valid timestamp")
}

fn ad(id: &str, description: &str, replies: u32) -> AdRecord {
    AdRecord {
        id: id.to_string(),
        description: description.to_string(),
        city: "الرياض".to_string(),
        relative_time: "الآن".to_string(),
        reply_count: replies,
        link: format!("https://haraj.com.sa/{id}"),
    }
}

#[test]
fn new_ad_gets_both_timestamps_and_its_reply_count() {
    let now = at(12, 0, 0);
    let (store, digest) = reconcile(Store::new(), &[ad("1234567", "سيارة", 4)], now, &Options::default());

    let entry = store.get("1234567").expect("entry");
    assert_eq!(entry.first_seen_at, Some(now));
    assert_eq!(entry.last_seen_at, Some(now));
    assert_eq!(entry.latest_reply_count, 4);
    assert_eq!(digest.count, 1);
    assert_eq!(digest.updated_at, now);
}

#[test]
fn merging_the_same_ad_twice_is_idempotent() {
    let options = Options::default();
    let t0 = at(10, 0, 0);
    let t1 = at(11, 0, 0);
    let record = ad("1234567", "سيارة للبيع", 5);

    let (once, _) = reconcile(Store::new(), &[record.clone()], t0, &options);
    let (twice, _) = reconcile(once.clone(), &[record.clone()], t1, &options);

    let a = once.get("1234567").expect("once");
    let b = twice.get("1234567").expect("twice");
    assert_eq!(a.record, b.record);
    assert_eq!(a.latest_reply_count, b.latest_reply_count);
    assert_eq!(a.first_seen_at, b.first_seen_at);
    assert_eq!(b.last_seen_at, Some(t1));
}

#[test]
fn fields_are_overwritten_but_reply_maximum_is_kept() {
    let options = Options::default();
    let (store, _) = reconcile(Store::new(), &[ad("1234567", "سيارة", 9)], at(10, 0, 0), &options);

    let mut update = ad("1234567", "سيارة مستعملة", 2);
    update.city = "جدة".to_string();
    let (store, _) = reconcile(store, &[update], at(11, 0, 0), &options);

    let entry = store.get("1234567").expect("entry");
    assert_eq!(entry.record.description, "سيارة مستعملة");
    assert_eq!(entry.record.city, "جدة");
    assert_eq!(entry.record.reply_count, 2);
    assert_eq!(entry.latest_reply_count, 9);
}

#[test]
fn first_seen_never_changes() {
    let options = Options::default();
    let first = at(1, 0, 0);
    let mut store = Store::new();
    for hour in 1..10 {
        let (next, _) = reconcile(store, &[ad("1234567", "سيارة", hour)], at(hour, 0, 0), &options);
        store = next;
    }
    let entry = store.get("1234567").expect("entry");
    assert_eq!(entry.first_seen_at, Some(first));
    assert_eq!(entry.last_seen_at, Some(at(9, 0, 0)));
}

#[test]
fn ttl_boundary_is_one_second_either_side() {
    let options = Options::default();
    let now = at(12, 0, 0);
    let ttl = options.ttl_delta();
    let one = TimeDelta::seconds(1);

    let mut store = Store::new();
    let seen = |ts| {
        let mut entry = StoreEntry::first_observation(ad("0", "x", 0), ts);
        entry.last_seen_at = Some(ts);
        entry
    };
    store.insert("expired", seen(now - ttl - one));
    store.insert("exact", seen(now - ttl));
    store.insert("fresh", seen(now - ttl + one));

    let (store, digest) = reconcile(store, &[], now, &options);
    assert!(store.get("expired").is_none());
    assert!(store.get("exact").is_some());
    assert!(store.get("fresh").is_some());
    assert_eq!(digest.count, 2);
}

#[test]
fn entries_with_unusable_timestamps_are_dropped() {
    let json = r#"{
        "1111111": {"id": "1111111", "description": "سيارة", "lastSeenAt": "garbage", "firstSeenAt": null},
        "2222222": {"id": "2222222", "description": "شقة", "lastSeenAt": "garbage", "firstSeenAt": "2024-05-02T11:00:00.000Z"},
        "3333333": {"id": "3333333", "description": "أرض", "lastSeenAt": 42}
    }"#;
    let store: Store = serde_json::from_str(json).expect("lenient store");
    assert_eq!(store.len(), 3);

    let (store, _) = reconcile(store, &[], at(12, 0, 0), &Options::default());
    assert!(store.get("1111111").is_none());
    assert!(store.get("2222222").is_some(), "falls back to firstSeenAt");
    assert!(store.get("3333333").is_none());
}

#[test]
fn ranking_orders_by_replies_then_arabic_collation() {
    let now = at(12, 0, 0);
    let ads = [
        ad("1000001", "سيارة", 3),
        ad("1000002", "باص", 3),
        ad("1000003", "أرض", 3),
        ad("1000004", "شقة", 10),
    ];
    let (_, digest) = reconcile(Store::new(), &ads, now, &Options::default());

    let order: Vec<_> = digest.items.iter().map(|e| e.record.description.as_str()).collect();
    assert_eq!(order, ["شقة", "أرض", "باص", "سيارة"]);
}

#[test]
fn tied_titles_with_alef_madda_rank_first() {
    let ads = [ad("1000001", "أرض للبيع", 3), ad("1000002", "آيفون 13 برو", 3)];
    let (_, digest) = reconcile(Store::new(), &ads, at(12, 0, 0), &Options::default());

    let order: Vec<_> = digest.items.iter().map(|e| e.record.description.as_str()).collect();
    assert_eq!(order, ["آيفون 13 برو", "أرض للبيع"]);
}

#[test]
fn digest_is_capped_at_three_hundred() {
    let now = at(12, 0, 0);
    let ads: Vec<_> = (0..1000u32)
        .map(|i| ad(&(1_000_000 + i).to_string(), &format!("إعلان {i}"), i))
        .collect();
    let options = Options {
        max_reply_count: 1000,
        top_n: 1000,
        ..Options::default()
    };

    let (store, digest) = reconcile(Store::new(), &ads, now, &options);
    assert_eq!(store.len(), 1000);
    assert_eq!(digest.count, 300);
    assert_eq!(digest.items.len(), 300);
    assert_eq!(digest.items[0].latest_reply_count, 999);
    assert_eq!(digest.items[299].latest_reply_count, 700);
}

#[test]
fn digest_respects_smaller_top_n() {
    let ads: Vec<_> = (0..10u32)
        .map(|i| ad(&(2_000_000 + i).to_string(), "إعلان", i))
        .collect();
    let options = Options {
        top_n: 3,
        ..Options::default()
    };
    let (_, digest) = reconcile(Store::new(), &ads, at(12, 0, 0), &options);
    assert_eq!(digest.count, 3);
}

#[test]
fn digest_json_has_the_consumer_shape() {
    let now = at(12, 0, 0);
    let (_, digest) = reconcile(Store::new(), &[ad("1234567", "سيارة", 1)], now, &Options::default());
    let json = serde_json::to_value(&digest).expect("serialize");

    assert_eq!(json["updatedAt"], "2024-05-02T12:00:00.000Z");
    assert_eq!(json["count"], 1);
    let item = &json["items"][0];
    for key in [
        "id",
        "description",
        "city",
        "relativeTime",
        "replyCount",
        "link",
        "firstSeenAt",
        "lastSeenAt",
        "latestReplyCount",
    ] {
        assert!(item.get(key).is_some(), "item is missing {key}");
    }
}

proptest! {
    #[test]
    fn latest_reply_count_is_the_maximum_observed(replies in proptest::collection::vec(0u32..=200, 1..20)) {
        let options = Options::default();
        let mut store = Store::new();
        for (i, r) in replies.iter().enumerate() {
            let now = at(12, 0, 0) + TimeDelta::seconds(i64::try_from(i).unwrap_or(0));
            let (next, _) = reconcile(store, &[ad("1234567", "سيارة", *r)], now, &options);
            store = next;
        }
        let max = replies.iter().copied().max().unwrap_or(0);
        prop_assert_eq!(store.get("1234567").map(|e| e.latest_reply_count), Some(max));
    }
}
