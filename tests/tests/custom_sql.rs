//! Entities mapped from hand-written SQL and from raw rows.

use tests::*;

use pretty_assertions::assert_eq;
use strata::{Model, SaveOptions};

#[test]
fn named_parameters_and_lazy_relations() {
    let (db, log) = setup();
    let ann = create::<User>(&db, &[("name", "ann".into())]).unwrap();
    create::<User>(&db, &[("name", "bob".into())]).unwrap();

    for title in ["first", "second"] {
        let post = Post::create(&db).unwrap();
        post.set("title", title).unwrap();
        post.set_one("author", Some(&ann)).unwrap();
        db.save(&post, &SaveOptions::new()).unwrap();
    }
    log.clear();

    let users = db
        .query_sql(
            "User",
            "SELECT u.id, u.name, u.email FROM users u \
             JOIN posts p ON p.author_id = u.id WHERE u.name = :name",
            [("name", "ann")],
        )
        .unwrap();

    assert_eq!(
        log.pop().unwrap().sql,
        "SELECT u.id, u.name, u.email FROM users u \
         JOIN posts p ON p.author_id = u.id WHERE u.name = #{params.name}"
    );

    // One entity per key, even though the join repeats the user
    assert_eq!(users.len(), 1);
    let found = &users[0];
    assert_eq!(found.id(), ann.id());
    assert!(!found.is_new());

    let posts = found.many("posts").unwrap();
    assert!(!posts.is_loaded());
    assert_eq!(posts.len().unwrap(), 2);
}

#[test]
fn unknown_parameter_is_an_error() {
    let (db, _log) = setup();

    let res = db.query_sql(
        "User",
        "SELECT id FROM users WHERE name = :name",
        Vec::<(String, strata::Value)>::new(),
    );
    assert!(res.is_err());
}

#[test]
fn map_row_reads_aliased_columns() {
    let (db, _log) = setup();
    let ann = create::<User>(&db, &[("name", "ann".into())]).unwrap();

    let rows = User::query(&db)
        .unwrap()
        .select(["u.id AS x_id", "u.name AS x_name", "u.email AS x_email"])
        .raw()
        .unwrap();
    assert_eq!(rows.len(), 1);

    let user = db.map_row("User", &rows[0], Some("x")).unwrap().unwrap();
    assert_eq!(user.id(), ann.id());
    assert_eq!(user.get_as::<String>("name").unwrap(), "ann");
    assert!(!user.many("posts").unwrap().is_loaded());

    // Without an alias only bare column names are read
    assert!(db.map_row("User", &rows[0], None).unwrap().is_none());
}
