//! End-to-end export and import flows over the in-memory store.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use tempfile::NamedTempFile;

use keyferry::{Ferry, MemoryStore, Record, Store};

/// Build a ferry over a fresh manifest and data file. The temp files
/// are returned so they outlive the ferry.
fn ferry_with(
    store: MemoryStore,
    manifest_rows: &str,
) -> (Ferry<MemoryStore>, NamedTempFile, NamedTempFile) {
    let manifest = NamedTempFile::new().unwrap();
    std::fs::write(manifest.path(), manifest_rows).unwrap();
    let data = NamedTempFile::new().unwrap();
    let ferry = Ferry::new(store, manifest.path(), data.path());
    (ferry, manifest, data)
}

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(fut)
}

#[tokio::test]
async fn export_then_import_restores_every_kind() {
    let mut store = MemoryStore::new();
    store.set("s", "hello").await.unwrap();
    store.hset("h", "f1", "v1").await.unwrap();
    store.hset("h", "f2", "v2").await.unwrap();
    for e in ["a", "b", "c"] {
        store.rpush("l", e).await.unwrap();
    }
    store.sadd("members", "m1").await.unwrap();
    store.sadd("members", "m2").await.unwrap();
    store.zadd("z", 5, "p").await.unwrap();
    store.zadd("z", 9, "q").await.unwrap();

    let rows = "s,string,MRG,MRG\n\
                h,hash,RPL,MRG\n\
                l,list,MRG,MRG\n\
                members,set,MRG,MRG\n\
                z,zset,MRG,MRG\n";
    let (mut ferry, _manifest, _data) = ferry_with(store, rows);

    ferry.export().await.unwrap();
    for key in ["s", "h", "l", "members", "z"] {
        ferry.store_mut().del(key).await.unwrap();
    }
    let summary = ferry.import().await.unwrap();
    assert_eq!(summary.records_applied, 5);

    let store = ferry.store_mut();
    assert_eq!(store.get("s").await.unwrap(), Some("hello".to_string()));
    assert_eq!(
        store.hscan_all("h").await.unwrap(),
        vec![
            ("f1".to_string(), "v1".to_string()),
            ("f2".to_string(), "v2".to_string()),
        ]
    );
    assert_eq!(store.lrange("l", 0, -1).await.unwrap(), vec!["a", "b", "c"]);
    assert_eq!(store.sscan_all("members").await.unwrap(), vec!["m1", "m2"]);
    assert_eq!(
        store.zscan_all("z").await.unwrap(),
        vec![("p".to_string(), 5), ("q".to_string(), 9)]
    );
}

#[tokio::test]
async fn index_children_follow_their_parent() {
    let mut store = MemoryStore::new();
    store.zadd("I", 10, "a").await.unwrap();
    store.zadd("I", 20, "b").await.unwrap();
    store.hset("pas", "f", "1").await.unwrap();
    store.hset("pbs", "g", "2").await.unwrap();

    let (mut ferry, _manifest, data) = ferry_with(store, "I,zindex,MRG,MRG,p,s\n");
    ferry.export().await.unwrap();

    let written = std::fs::read_to_string(data.path()).unwrap();
    let keys: Vec<String> = written
        .lines()
        .map(|l| Record::parse(l).unwrap().key)
        .collect();
    assert_eq!(keys, vec!["I", "pas", "pbs"]);

    for key in ["I", "pas", "pbs"] {
        ferry.store_mut().del(key).await.unwrap();
    }
    ferry.import().await.unwrap();

    let store = ferry.store_mut();
    assert_eq!(
        store.zscan_all("I").await.unwrap(),
        vec![("a".to_string(), 10), ("b".to_string(), 20)]
    );
    assert_eq!(
        store.hscan_all("pas").await.unwrap(),
        vec![("f".to_string(), "1".to_string())]
    );
    assert_eq!(
        store.hscan_all("pbs").await.unwrap(),
        vec![("g".to_string(), "2".to_string())]
    );
}

#[tokio::test]
async fn merge_import_is_idempotent_for_keyed_kinds() {
    let mut store = MemoryStore::new();
    store.set("s", "v").await.unwrap();
    store.hset("h", "f", "1").await.unwrap();
    store.sadd("members", "m").await.unwrap();
    store.zadd("z", 3, "p").await.unwrap();

    let rows = "s,string,MRG,MRG\n\
                h,hash,MRG,MRG\n\
                members,set,MRG,MRG\n\
                z,zset,MRG,MRG\n";
    let (mut ferry, _manifest, _data) = ferry_with(store, rows);

    ferry.export().await.unwrap();
    ferry.import().await.unwrap();
    ferry.import().await.unwrap();

    let store = ferry.store_mut();
    assert_eq!(store.get("s").await.unwrap(), Some("v".to_string()));
    assert_eq!(store.hscan_all("h").await.unwrap().len(), 1);
    assert_eq!(store.sscan_all("members").await.unwrap().len(), 1);
    assert_eq!(store.zscan_all("z").await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_merge_import_appends_on_each_replay() {
    let mut store = MemoryStore::new();
    store.rpush("l", "a").await.unwrap();
    store.rpush("l", "b").await.unwrap();

    let (mut ferry, _manifest, _data) = ferry_with(store, "l,list,MRG,MRG\n");
    ferry.export().await.unwrap();
    ferry.import().await.unwrap();

    assert_eq!(
        ferry.store_mut().lrange("l", 0, -1).await.unwrap(),
        vec!["a", "b", "a", "b"]
    );
}

#[tokio::test]
async fn delete_records_replay_cleanly() {
    let mut store = MemoryStore::new();
    store.set("k", "v").await.unwrap();

    let (mut ferry, _manifest, _data) = ferry_with(store, "k,string,DEL,MRG\n");
    ferry.export().await.unwrap();

    let first = ferry.import().await.unwrap();
    let second = ferry.import().await.unwrap();

    assert_eq!(first.records_applied, 1);
    assert_eq!(second.records_applied, 1);
    assert!(!ferry.store_mut().exists("k").await.unwrap());
}

#[tokio::test]
async fn sync_replays_into_another_database() {
    let mut store = MemoryStore::new();
    store.hset("h", "f", "v").await.unwrap();
    store.zadd("z", 7, "m").await.unwrap();

    let rows = "h,hash,MRG,MRG\nz,zset,MRG,MRG\n";
    let (mut ferry, _manifest, _data) = ferry_with(store, rows);

    ferry.sync(3).await.unwrap();

    let store = ferry.store_mut();
    assert_eq!(
        store.hscan_all("h").await.unwrap(),
        vec![("f".to_string(), "v".to_string())]
    );
    store.select(0).await.unwrap();
    assert_eq!(
        store.zscan_all("z").await.unwrap(),
        vec![("m".to_string(), 7)]
    );
}

#[tokio::test]
async fn data_file_carries_between_stores() {
    let manifest = NamedTempFile::new().unwrap();
    std::fs::write(manifest.path(), "h,hash,MRG,MRG\n").unwrap();
    let data = NamedTempFile::new().unwrap();

    let mut source = MemoryStore::new();
    source.hset("h", "f", "v").await.unwrap();
    let mut exporter = Ferry::new(source, manifest.path(), data.path());
    exporter.export().await.unwrap();

    let mut importer = Ferry::new(MemoryStore::new(), manifest.path(), data.path());
    importer.import().await.unwrap();

    assert_eq!(
        importer.store_mut().hscan_all("h").await.unwrap(),
        vec![("f".to_string(), "v".to_string())]
    );
}

// The member alphabet stays clear of the payload separators and the
// quote character, which the format does not escape.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn string_payloads_are_opaque(value in "[ -~]{0,32}") {
        let restored = block_on(async {
            let mut store = MemoryStore::new();
            store.set("s", &value).await.unwrap();
            let (mut ferry, _manifest, _data) = ferry_with(store, "s,string,MRG,MRG\n");
            ferry.export().await.unwrap();
            ferry.store_mut().del("s").await.unwrap();
            ferry.import().await.unwrap();
            ferry.store_mut().get("s").await.unwrap()
        });
        prop_assert_eq!(restored, Some(value));
    }

    #[test]
    fn hash_contents_survive_a_round_trip(
        fields in proptest::collection::btree_map(
            "[a-zA-Z0-9_.]{1,16}",
            "[a-zA-Z0-9_.]{0,16}",
            1..8,
        )
    ) {
        let restored = block_on(async {
            let mut store = MemoryStore::new();
            for (f, v) in &fields {
                store.hset("h", f, v).await.unwrap();
            }
            let (mut ferry, _manifest, _data) = ferry_with(store, "h,hash,MRG,MRG\n");
            ferry.export().await.unwrap();
            ferry.store_mut().del("h").await.unwrap();
            ferry.import().await.unwrap();
            ferry.store_mut().hscan_all("h").await.unwrap()
        });
        let expected: Vec<(String, String)> = fields.into_iter().collect();
        prop_assert_eq!(restored, expected);
    }

    #[test]
    fn set_members_survive_a_round_trip(
        members in proptest::collection::btree_set("[a-zA-Z0-9_.]{1,16}", 1..8)
    ) {
        let restored = block_on(async {
            let mut store = MemoryStore::new();
            for m in &members {
                store.sadd("members", m).await.unwrap();
            }
            let (mut ferry, _manifest, _data) = ferry_with(store, "members,set,MRG,MRG\n");
            ferry.export().await.unwrap();
            ferry.store_mut().del("members").await.unwrap();
            ferry.import().await.unwrap();
            ferry.store_mut().sscan_all("members").await.unwrap()
        });
        let expected: Vec<String> = members.into_iter().collect();
        prop_assert_eq!(restored, expected);
    }

    #[test]
    fn zset_pairs_survive_a_round_trip(
        pairs in proptest::collection::btree_map("[a-zA-Z0-9_.]{1,16}", any::<u64>(), 1..8)
    ) {
        let restored = block_on(async {
            let mut store = MemoryStore::new();
            for (m, score) in &pairs {
                store.zadd("z", *score, m).await.unwrap();
            }
            let (mut ferry, _manifest, _data) = ferry_with(store, "z,zset,MRG,MRG\n");
            ferry.export().await.unwrap();
            ferry.store_mut().del("z").await.unwrap();
            ferry.import().await.unwrap();
            ferry.store_mut().zscan_all("z").await.unwrap()
        });
        let mut expected: Vec<(String, u64)> = pairs.into_iter().collect();
        expected.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        prop_assert_eq!(restored, expected);
    }

    #[test]
    fn list_elements_survive_in_order(
        elements in proptest::collection::vec("[a-zA-Z0-9_.]{1,16}", 1..12)
    ) {
        let restored = block_on(async {
            let mut store = MemoryStore::new();
            for e in &elements {
                store.rpush("l", e).await.unwrap();
            }
            let (mut ferry, _manifest, _data) = ferry_with(store, "l,list,MRG,MRG\n");
            ferry.export().await.unwrap();
            ferry.store_mut().del("l").await.unwrap();
            ferry.import().await.unwrap();
            ferry.store_mut().lrange("l", 0, -1).await.unwrap()
        });
        prop_assert_eq!(restored, elements);
    }
}
