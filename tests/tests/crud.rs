//! Saving, finding and updating single entities.

use tests::*;

use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata::{Model, SaveOptions, Value};

#[test]
fn insert_assigns_generated_key() {
    let (db, log) = setup();

    let user = User::create(&db).unwrap();
    user.set("name", "ann").unwrap();
    assert!(user.is_new());

    db.save(&user, &SaveOptions::new()).unwrap();

    assert!(!user.is_new());
    assert_eq!(log.count_kind(StatementKind::Insert), 1);

    let stmt = log.pop().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (name) VALUES (#{params.p0})");
    assert_eq!(stmt.params.get("p0"), Some(&Value::from("ann")));
}

#[test]
fn find_after_save() {
    let (db, _log) = setup();

    let user = create::<User>(&db, &[("name", "ann".into()), ("email", "ann@example.com".into())])
        .unwrap();

    let found = User::find_by_id(&db, user.id()).unwrap().unwrap();
    assert!(!found.same(&user));
    assert_eq!(found.id(), user.id());
    assert_eq!(found.get_as::<String>("name").unwrap(), "ann");
    assert_eq!(found.get_as::<String>("email").unwrap(), "ann@example.com");

    assert_none!(User::find_by_id(&db, 999).unwrap());
}

#[test]
fn get_by_id_reports_missing_rows() {
    let (db, _log) = setup();

    let err = assert_err!(User::query(&db).unwrap().get_by_id(42));
    assert!(err.is_record_not_found());
}

#[test]
fn update_round_trip() {
    let (db, log) = setup();

    let user = create::<User>(&db, &[("name", "ann".into()), ("email", "a@x.io".into())]).unwrap();
    log.clear();

    user.set("name", "anne").unwrap();
    user.set("email", Value::Null).unwrap();
    db.save(&user, &SaveOptions::new()).unwrap();

    assert_eq!(log.len(), 1);
    let stmt = log.pop().unwrap();
    assert_eq!(stmt.kind, StatementKind::Update);
    assert_eq!(
        stmt.sql,
        "UPDATE users SET name = #{params.p0}, email = #{params.p1} WHERE id = #{params.p2}"
    );

    let found = User::find_by_id(&db, user.id()).unwrap().unwrap();
    assert_eq!(found.get_as::<String>("name").unwrap(), "anne");
    assert!(found.get("email").unwrap().is_null());
}

#[test]
fn save_all_writes_every_entity() {
    let (db, _log) = setup();

    let users: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let user = User::create(&db).unwrap();
            user.set("name", name).unwrap();
            user
        })
        .collect();

    db.save_all(&users, &SaveOptions::new()).unwrap();

    assert!(users.iter().all(|user| !user.is_new()));
    assert_eq!(User::query(&db).unwrap().count().unwrap(), 3);
}

#[test]
fn unknown_entity_is_a_configuration_error() {
    let (db, _log) = setup();

    let err = assert_err!(db.query("Invoice"));
    assert!(err.is_configuration());
}

#[test]
fn setting_a_mistyped_value_fails() {
    let (db, _log) = setup();

    let user = User::create(&db).unwrap();
    let err = assert_err!(user.set("id", "twelve"));
    assert!(err.is_mapping());
    assert!(err.is_type_conversion());

    // Numbers render into string fields
    user.set("name", 12).unwrap();
    assert_eq!(user.get("name").unwrap(), Value::from("12"));
}
