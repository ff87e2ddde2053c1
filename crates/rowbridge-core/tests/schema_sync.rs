//! Integration tests for schema drift detection.
//!
//! Entities and live tables are loaded from the same JSON shapes the CLI
//! reads, then compared through the driver facade.

use rowbridge_core::prelude::*;
use rowbridge_core::{ColumnAttribute, Normalizer, SchemaDiff};

const ENTITY: &str = r#"{
    "table_name": "posts",
    "columns": [
        {"name": "id", "type": "int", "is_primary": true, "is_nullable": false,
         "is_generated": true, "generation_strategy": "increment"},
        {"name": "title", "type": "String", "length": 200, "is_nullable": false},
        {"name": "slug", "type": "varchar", "is_nullable": false},
        {"name": "body", "type": "text", "comment": "markdown"},
        {"name": "price", "type": "dec", "precision": 10, "scale": 2, "default": 0},
        {"name": "status", "type": "simple-enum", "enum": ["draft", "published"],
         "default": "draft", "is_nullable": false},
        {"name": "tags", "type": "simple-array"},
        {"name": "createdAt", "database_name": "created_at", "type": "datetime",
         "precision": 6, "default": {"sql": "now(6)"}, "on_update": "current_timestamp(6)"},
        {"name": "visible", "type": "Boolean", "default": true, "is_nullable": false}
    ],
    "indices": [
        {"name": "uq_posts_slug", "columns": ["slug"], "is_unique": true}
    ]
}"#;

const LIVE: &str = r#"[
    {"name": "id", "type": "int", "is_primary": true, "is_nullable": false, "is_generated": true},
    {"name": "title", "type": "varchar", "length": "200", "is_nullable": false},
    {"name": "slug", "type": "varchar", "length": "255", "is_nullable": false, "is_unique": true},
    {"name": "body", "type": "text", "is_nullable": true, "comment": "markdown"},
    {"name": "price", "type": "decimal", "precision": 10, "scale": 2, "is_nullable": true,
     "default": "0.00"},
    {"name": "status", "type": "enum", "enum": ["published", "draft"], "default": "'draft'",
     "is_nullable": false},
    {"name": "tags", "type": "text", "is_nullable": true},
    {"name": "created_at", "type": "datetime", "precision": 6, "is_nullable": true,
     "default": "CURRENT_TIMESTAMP(6)", "on_update": "CURRENT_TIMESTAMP(6)"},
    {"name": "visible", "type": "tinyint", "width": 1, "is_nullable": false, "default": "1"},
    {"name": "legacy_flag", "type": "tinyint", "is_nullable": true}
]"#;

fn load() -> (EntityModel, Vec<LiveColumn>) {
    let entity = EntityModel::from_json(ENTITY).unwrap();
    let live: Vec<LiveColumn> = serde_json::from_str(LIVE).unwrap();
    (entity, live)
}

fn changed_names(driver: &MysqlDriver, live: &[LiveColumn], entity: &EntityModel) -> Vec<String> {
    driver
        .find_changed_columns(live, entity)
        .into_iter()
        .map(|c| c.database_name.clone())
        .collect()
}

#[test]
fn synchronized_table_has_no_drift() {
    let (entity, live) = load();
    let driver = MysqlDriver::default();
    assert_eq!(changed_names(&driver, &live, &entity), Vec::<String>::new());
}

#[test]
fn changed_length_reports_the_desired_column() {
    let (mut entity, live) = load();
    entity.columns[1].length = Some(255);
    let driver = MysqlDriver::default();
    let changed = driver.find_changed_columns(&live, &entity);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].name, "title");
    assert_eq!(changed[0].length, Some(255));
}

fn assert_drift(name: &str, mutate: impl FnOnce(&mut LiveColumn), expected: ColumnAttribute) {
    let (entity, live) = load();
    let mut live_column = live.into_iter().find(|c| c.name == name).unwrap();
    mutate(&mut live_column);
    let column = entity.column_by_database_name(name).unwrap();
    assert_eq!(
        SchemaDiff::new(Normalizer::default()).drift(&live_column, column, &entity),
        Some(expected),
        "mutating {name} should flag {expected}"
    );
}

#[test]
fn each_attribute_is_detected() {
    assert_drift("body", |c| c.column_type = "mediumtext".into(), ColumnAttribute::Type);
    assert_drift("id", |c| c.width = Some(11), ColumnAttribute::Width);
    assert_drift("id", |c| c.unsigned = true, ColumnAttribute::Unsigned);
    assert_drift("id", |c| c.zerofill = true, ColumnAttribute::Zerofill);
    assert_drift("price", |c| c.scale = Some(4), ColumnAttribute::Scale);
    assert_drift("body", |c| c.comment = None, ColumnAttribute::Comment);
    assert_drift("visible", |c| c.default = Some("0".into()), ColumnAttribute::Default);
    assert_drift("created_at", |c| c.on_update = None, ColumnAttribute::OnUpdate);
    assert_drift("tags", |c| c.is_primary = true, ColumnAttribute::Primary);
    assert_drift("tags", |c| c.is_nullable = false, ColumnAttribute::Nullable);
    assert_drift("slug", |c| c.is_unique = false, ColumnAttribute::Unique);
    assert_drift("id", |c| c.is_generated = false, ColumnAttribute::Generated);
    assert_drift(
        "body",
        |c| c.as_expression = Some("upper(title)".into()),
        ColumnAttribute::AsExpression,
    );
}

#[test]
fn unique_derivation_follows_the_index_list() {
    let (mut entity, live) = load();
    let driver = MysqlDriver::default();
    assert!(changed_names(&driver, &live, &entity).is_empty());

    entity.indices[0].columns.push("title".to_string());
    assert_eq!(changed_names(&driver, &live, &entity), vec!["slug".to_string()]);
}

#[test]
fn mariadb_reports_json_as_longtext() {
    let entity = EntityModel::new("docs").column(ColumnModel::new("body", "json"));
    let live = vec![LiveColumn::new("body", "longtext")];

    let mariadb = MysqlDriver::new(DriverOptions::new().flavor(Flavor::Mariadb));
    assert!(mariadb.find_changed_columns(&live, &entity).is_empty());

    let mysql = MysqlDriver::default();
    assert_eq!(mysql.find_changed_columns(&live, &entity).len(), 1);
}
