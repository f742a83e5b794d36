//! Loading, pruning and saving table files end to end.

use lazysheet_core::prune;
use lazysheet_core::storage::{load_table, save_table, to_table_string};

#[test]
fn sparse_rows_prune_to_present_fields() {
    let path = std::env::temp_dir().join("lazysheet_core_sparse_rows.csv");
    std::fs::write(&path, "a,\\0,b\n\\0,\\0\nc,d\\.e\n").unwrap();

    let rows = load_table(&path).unwrap();
    let pruned: Vec<Vec<String>> = rows.into_iter().map(prune::nulls).collect();
    assert_eq!(
        pruned,
        vec![
            vec!["a".to_string(), "b".to_string()],
            vec![],
            vec!["c".to_string(), "d,e".to_string()],
        ]
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn saved_file_matches_rendered_text() {
    let path = std::env::temp_dir().join("lazysheet_core_saved_text.csv");
    let rows = vec![
        vec![Some("key"), Some("value")],
        vec![Some("empty"), None],
    ];

    save_table(&path, &rows).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, to_table_string(&rows));
    assert_eq!(written, "key,value\nempty,\\0\n");

    let _ = std::fs::remove_file(&path);
}
