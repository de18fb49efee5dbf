//! End-to-end flow over the public API: decode, join, transform, export.

use sheetjoin::{
    decode_bytes, logs, to_csv_string, to_json_records, CleanupOp, DecodeOptions, EngineError,
    FilterCondition, FilterSpec, JoinSpec, JoinTemplate, JoinType, Session, Settings, SharedSession,
    SortDirection, SortSpec, SourceFormat, Store, Table,
};
use tempfile::tempdir;

const CUSTOMERS: &str = "id,name\n1,Alice\n2,Bob\n3,Carol\n";
const AGES: &str = "id;age\n1;30\n2;25\n4;40\n";

fn csv(content: &str) -> Table {
    decode_bytes(content.as_bytes(), SourceFormat::Csv, &DecodeOptions::default())
        .unwrap()
        .into_table(None)
        .unwrap()
}

fn column(table: &Table, name: &str) -> Vec<String> {
    let index = table.column_index(name).unwrap();
    table.rows().iter().map(|r| r[index].as_string()).collect()
}

#[test]
fn test_inner_join_export() {
    logs::set_echo(false);
    let mut session = Session::default();
    let stats = session
        .run_join(&csv(CUSTOMERS), &csv(AGES), &JoinSpec::on(&["id"], JoinType::Inner))
        .unwrap();

    assert_eq!(stats.matched_count, 2);
    assert_eq!(stats.total_count, 2);

    let table = session.current().unwrap();
    assert_eq!(
        to_csv_string(table, b',').unwrap(),
        "id,name,age\n1,Alice,30\n2,Bob,25\n"
    );
    assert_eq!(
        to_json_records(table, false).unwrap(),
        r#"[{"id":"1","name":"Alice","age":"30"},{"id":"2","name":"Bob","age":"25"}]"#
    );
}

#[test]
fn test_full_join_then_transforms() {
    logs::set_echo(false);
    let mut session = Session::default();
    let stats = session
        .run_join(&csv(CUSTOMERS), &csv(AGES), &JoinSpec::on(&["id"], JoinType::Full))
        .unwrap();
    assert_eq!(
        (stats.matched_count, stats.only_left_count, stats.only_right_count, stats.total_count),
        (2, 1, 1, 4)
    );
    let joined = session.current().unwrap().clone();
    assert_eq!(column(&joined, "id"), vec!["1", "2", "3", "4"]);
    assert_eq!(column(&joined, "name"), vec!["Alice", "Bob", "Carol", ""]);

    let outcome = session
        .apply_filter(&FilterSpec::new("age", FilterCondition::GreaterThan, "26"))
        .unwrap();
    assert_eq!((outcome.kept, outcome.baseline_rows), (2, 4));

    // A second filter runs on the unfiltered table, not on the two kept rows.
    let outcome = session
        .apply_filter(&FilterSpec::new("name", FilterCondition::NotEmpty, ""))
        .unwrap();
    assert_eq!((outcome.kept, outcome.baseline_rows), (3, 4));
    session.clear_filter().unwrap();
    assert_eq!(session.current().unwrap(), &joined);

    session
        .apply_filter(&FilterSpec::new("age", FilterCondition::GreaterThan, "26"))
        .unwrap();
    session
        .apply_sort(&SortSpec::new("age", SortDirection::Desc))
        .unwrap();
    assert_eq!(column(session.current().unwrap(), "id"), vec!["4", "1"]);

    let removed = session
        .apply_cleanup(&CleanupOp::FillEmpty { value: "n/a".into() })
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(column(session.current().unwrap(), "name"), vec!["n/a", "Alice"]);

    session.undo().unwrap();
    session.undo().unwrap();
    assert_eq!(column(session.current().unwrap(), "id"), vec!["1", "4"]);
    session.redo().unwrap();
    assert_eq!(column(session.current().unwrap(), "id"), vec!["4", "1"]);

    while session.history().can_undo() {
        session.undo().unwrap();
    }
    assert_eq!(session.current().unwrap(), &joined);
    assert!(matches!(session.undo(), Err(EngineError::NothingToUndo)));
}

#[test]
fn test_filter_chain_survives_undo_redo() {
    logs::set_echo(false);
    let mut session = Session::default();
    session
        .run_join(&csv(CUSTOMERS), &csv(AGES), &JoinSpec::on(&["id"], JoinType::Full))
        .unwrap();

    session
        .apply_filter(&FilterSpec::new("age", FilterCondition::GreaterThan, "26"))
        .unwrap();
    session.undo().unwrap();
    session.redo().unwrap();

    let outcome = session
        .apply_filter(&FilterSpec::new("name", FilterCondition::StartsWith, "c"))
        .unwrap();
    assert_eq!((outcome.kept, outcome.baseline_rows), (1, 4));
    assert_eq!(column(session.current().unwrap(), "name"), vec!["Carol"]);
}

#[test]
fn test_failed_join_keeps_dataset() {
    logs::set_echo(false);
    let mut session = Session::default();
    session
        .run_join(&csv(CUSTOMERS), &csv(AGES), &JoinSpec::on(&["id"], JoinType::Left))
        .unwrap();
    let before = session.current().unwrap().clone();

    let err = session
        .run_join(&csv(CUSTOMERS), &csv(AGES), &JoinSpec::on(&["email"], JoinType::Left))
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(session.current().unwrap(), &before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shared_session_join() {
    logs::set_echo(false);
    let shared = SharedSession::new(Session::default());
    let stats = shared
        .run_join(csv(CUSTOMERS), csv(AGES), JoinSpec::on(&["id"], JoinType::Right))
        .await
        .unwrap();
    assert_eq!(stats.total_count, 3);

    let snapshot = shared.snapshot().await.unwrap();
    assert_eq!(column(&snapshot, "id"), vec!["1", "2", "4"]);
}

#[test]
fn test_template_and_settings_roundtrip() {
    logs::set_echo(false);
    let dir = tempdir().unwrap();
    let store = Store::new(dir.path());

    let left = csv(CUSTOMERS);
    let right = csv(AGES);
    let spec = JoinSpec::on(&["id"], JoinType::Left).with_fill("-");

    let saved = store
        .templates(10)
        .save(JoinTemplate::new("customers-ages", spec.clone(), true))
        .unwrap();
    let loaded = store.templates(10).get("customers-ages").unwrap();
    assert_eq!(loaded.id, saved.id);

    let applied = loaded.apply(left.header(), right.header()).unwrap();
    assert_eq!(applied, spec);

    let mut session = Session::default();
    session.run_join(&left, &right, &applied).unwrap();
    assert_eq!(column(session.current().unwrap(), "age"), vec!["30", "25", "-"]);

    Settings {
        join: spec.clone(),
        has_header: true,
    }
    .save(&store)
    .unwrap();
    let mut settings = Settings::load(&store);
    assert_eq!(settings.join, spec);

    assert!(settings.retain_known_keys(&["code".to_string()], right.header()));
    assert!(settings.join.keys_left.is_empty());
}
