//! Finders parsed from method-style names.

use tests::*;

use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata::{Db, Derived, Model, SaveOptions, Value};

fn seed(db: &Db) {
    let ann = create::<User>(db, &[("name", "ann".into()), ("email", "ann@example.com".into())])
        .unwrap();
    create::<User>(db, &[("name", "bob".into())]).unwrap();
    create::<User>(db, &[("name", "cyd".into()), ("email", "cyd@example.com".into())]).unwrap();

    for title in ["rust", "sql"] {
        let post = Post::create(db).unwrap();
        post.set("title", title).unwrap();
        post.set_one("author", Some(&ann)).unwrap();
        db.save(&post, &SaveOptions::new()).unwrap();
    }
}

fn names(found: Derived) -> Vec<String> {
    match found {
        Derived::Many(users) => users
            .iter()
            .map(|user| user.get_as::<String>("name").unwrap())
            .collect(),
        other => panic!("expected a list; actual={other:?}"),
    }
}

#[test]
fn conditions_and_ordering() {
    let (db, log) = setup();
    seed(&db);
    log.clear();

    let found = db
        .derived(
            "User",
            "findAllByNameContainingOrEmailIsNullOrderByNameDesc",
            &["y".into()],
        )
        .unwrap();
    assert_eq!(names(found), ["cyd", "bob"]);

    assert_eq!(
        log.pop().unwrap().sql,
        "SELECT u.id AS u_id, u.name AS u_name, u.email AS u_email FROM users AS u \
         WHERE u.name LIKE #{params.p0} OR u.email IS NULL ORDER BY u.name DESC"
    );

    let found = db
        .derived(
            "User",
            "findAllByNameBetweenOrderByName",
            &["b".into(), "c".into()],
        )
        .unwrap();
    assert_eq!(names(found), ["bob"]);

    let found = db
        .derived(
            "User",
            "findAllByNameNotIn",
            &[Value::List(vec!["ann".into(), "bob".into()])],
        )
        .unwrap();
    assert_eq!(names(found), ["cyd"]);
}

#[test]
fn single_results_and_counts() {
    let (db, _log) = setup();
    seed(&db);

    let Derived::One(found) = db.derived("User", "findByName", &["bob".into()]).unwrap() else {
        panic!("expected one result");
    };
    let bob = assert_some!(found);
    assert!(bob.get("email").unwrap().is_null());

    let Derived::One(missing) = db.derived("User", "findFirstByName", &["eve".into()]).unwrap()
    else {
        panic!("expected one result");
    };
    assert_none!(missing);

    let err = assert_err!(db.derived("User", "getByName", &["eve".into()]));
    assert!(err.is_record_not_found());

    let Derived::Count(count) = db.derived("User", "countByEmailIsNotNull", &[]).unwrap() else {
        panic!("expected a count");
    };
    assert_eq!(count, 2);
}

#[test]
fn relation_join_columns() {
    let (db, _log) = setup();
    seed(&db);

    let ann = User::query(&db)
        .unwrap()
        .filter_eq("name", "ann")
        .first()
        .unwrap()
        .unwrap();

    let Derived::Count(count) = db
        .derived("Post", "countByAuthor", &[ann.id()])
        .unwrap()
    else {
        panic!("expected a count");
    };
    assert_eq!(count, 2);

    let Derived::Many(posts) = db
        .derived("Post", "findAllByAuthorIdAndTitleLikeOrderByTitleDesc", &[ann.id(), "%s%".into()])
        .unwrap()
    else {
        panic!("expected a list");
    };
    let titles: Vec<String> = posts
        .iter()
        .map(|post| post.get_as::<String>("title").unwrap())
        .collect();
    assert_eq!(titles, ["sql", "rust"]);
}

#[test]
fn argument_mismatches() {
    let (db, _log) = setup();

    let err = assert_err!(db.derived("User", "findByName", &[]));
    assert_eq!(
        err.to_string(),
        "invalid configuration: finder on `User` takes 1 arguments, got 0"
    );

    let err = assert_err!(db.derived("User", "findAllByNameIn", &["ann".into()]));
    assert!(err.is_configuration());

    let err = assert_err!(db.derived("User", "findByNickname", &["ann".into()]));
    assert_eq!(
        err.to_string(),
        "invalid configuration: `User` has no property `nickname`"
    );
}
