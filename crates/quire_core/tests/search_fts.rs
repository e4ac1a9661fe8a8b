mod support;

use quire_core::db::open_db_in_memory;
use quire_core::{
    search_records, RecordStore, SearchError, SearchQuery, SqliteRecordStore, KIND_ARTICLE,
    KIND_HIGHLIGHT,
};
use support::{address_of, article, hex_id, highlight, ALICE, BOB};

#[test]
fn search_returns_saved_record() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    store
        .save(&article(1, ALICE, "post", 1, "hello rust search"))
        .unwrap();

    let hits = search_records(&conn, &SearchQuery::new("rust")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, hex_id(1));
    assert_eq!(hits[0].kind, KIND_ARTICLE);
    assert!(hits[0].snippet.contains("[rust]"));
}

#[test]
fn duplicate_save_is_indexed_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    let record = article(1, ALICE, "post", 1, "indexed exactly once");
    store.save(&record).unwrap();
    store.save(&record).unwrap();

    let hits = search_records(&conn, &SearchQuery::new("indexed")).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn search_can_filter_by_kind_and_author() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    store
        .save(&article(1, ALICE, "plan", 1, "plan the garden"))
        .unwrap();
    store
        .save(&article(2, BOB, "plans", 2, "plan a trip"))
        .unwrap();
    store
        .save(&highlight(3, BOB, &address_of(ALICE, "plan"), 3, "plan"))
        .unwrap();

    let articles = store
        .search(&SearchQuery::new("plan").kind(KIND_ARTICLE))
        .unwrap();
    let mut ids: Vec<String> = articles.into_iter().map(|hit| hit.record_id).collect();
    ids.sort();
    assert_eq!(ids, vec![hex_id(1), hex_id(2)]);

    let highlights = store
        .search(&SearchQuery::new("plan").kind(KIND_HIGHLIGHT))
        .unwrap();
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].record_id, hex_id(3));

    let bob = store.search(&SearchQuery::new("plan").author(BOB)).unwrap();
    assert_eq!(bob.len(), 2);
}

#[test]
fn search_terms_are_and_combined() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    store
        .save(&article(1, ALICE, "a", 1, "alpha beta"))
        .unwrap();
    store.save(&article(2, ALICE, "b", 2, "alpha gamma")).unwrap();

    let hits = search_records(&conn, &SearchQuery::new("alpha gamma")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].record_id, hex_id(2));
}

#[test]
fn search_limit_is_applied() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    for id in 1..=3 {
        store
            .save(&article(id, ALICE, &format!("post-{id}"), i64::from(id), "token common"))
            .unwrap();
    }

    let mut query = SearchQuery::new("token");
    query.limit = 2;
    assert_eq!(search_records(&conn, &query).unwrap().len(), 2);

    query.limit = 0;
    assert!(search_records(&conn, &query).unwrap().is_empty());
}

#[test]
fn quoted_terms_tolerate_fts_operators() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::try_new(&conn).unwrap();
    store
        .save(&article(1, ALICE, "ops", 1, "wild NEAR cards"))
        .unwrap();

    let hits = search_records(&conn, &SearchQuery::new("NEAR")).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn raw_syntax_errors_are_reported() {
    let conn = open_db_in_memory().unwrap();

    let mut query = SearchQuery::new("\"unterminated");
    query.raw_fts_syntax = true;
    let err = search_records(&conn, &query).unwrap_err();
    assert!(matches!(err, SearchError::InvalidQuery { .. }));
}
