use tests::*;

use pretty_assertions::assert_eq;
use strata::{Model, SaveOptions};

#[test]
fn inverse_side_assigns_the_foreign_key() {
    let (db, log) = setup();

    let user = User::create(&db).unwrap();
    user.set("name", "ann").unwrap();
    let profile = Profile::create(&db).unwrap();
    profile.set("bio", "hi").unwrap();
    user.set_one("profile", Some(&profile)).unwrap();

    db.save(&user, &SaveOptions::new().with("profile")).unwrap();

    assert_eq!(
        log.sql(),
        [
            "INSERT INTO users (name) VALUES (#{params.p0})",
            "INSERT INTO profiles (bio, user_id) VALUES (#{params.p0}, #{params.p1})",
        ]
    );
    assert_eq!(profile.attribute("user_id"), user.id());
    assert!(profile.one("user").unwrap().unwrap().same(&user));

    let stored = Profile::query(&db)
        .unwrap()
        .filter_eq("user_id", user.id())
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(stored.id(), profile.id());
}

#[test]
fn owning_side_saves_its_target_first() {
    let (db, log) = setup();

    let user = User::create(&db).unwrap();
    user.set("name", "bob").unwrap();
    let profile = Profile::create(&db).unwrap();
    profile.set_one("user", Some(&user)).unwrap();

    db.save(&profile, &SaveOptions::new()).unwrap();

    assert_eq!(log.count_kind(StatementKind::Insert), 2);
    assert!(log.pop().unwrap().sql.starts_with("INSERT INTO users"));
    assert_eq!(profile.attribute("user_id"), user.id());
}

#[test]
fn required_foreign_key_must_be_set() {
    let (db, log) = setup();

    let profile = Profile::create(&db).unwrap();
    profile.set("bio", "orphan").unwrap();

    let err = db.save(&profile, &SaveOptions::new()).unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(err.to_string(), "persistence failed: `Profile.user` requires a value");
    assert!(log.is_empty());
    assert!(profile.is_new());
}

#[test]
fn errors_name_the_cascaded_relation() {
    let (db, _log) = setup();

    // `comments.body` is NOT NULL
    let post = Post::create(&db).unwrap();
    post.set("title", "hello").unwrap();
    let comment = Comment::create(&db).unwrap();
    post.many("comments").unwrap().push(comment).unwrap();

    let err = db
        .save(&post, &SaveOptions::new().with("comments"))
        .unwrap_err();
    assert!(err.is_persistence());
    assert!(err
        .to_string()
        .starts_with("persistence failed: saving relation `Post.comments`: "));
}
