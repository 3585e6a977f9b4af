use tests::*;

use pretty_assertions::assert_eq;
use strata::{Db, Entity, Model, SaveOptions};

fn author_with_posts(db: &Db, titles: &[&str]) -> Entity {
    let user = User::create(db).unwrap();
    user.set("name", "ann").unwrap();
    for title in titles {
        let post = Post::create(db).unwrap();
        post.set("title", *title).unwrap();
        user.many("posts").unwrap().push(post).unwrap();
    }
    db.save(&user, &SaveOptions::new().with("posts")).unwrap();
    user
}

#[test]
fn members_get_the_owner_key() {
    let (db, _log) = setup();
    let user = author_with_posts(&db, &["one", "two"]);

    for post in user.many("posts").unwrap().iter().unwrap() {
        assert!(!post.is_new());
        assert_eq!(post.attribute("author_id"), user.id());
    }

    let stored = Post::query(&db)
        .unwrap()
        .filter_eq("author_id", user.id())
        .count()
        .unwrap();
    assert_eq!(stored, 2);
}

#[test]
fn detached_members_lose_their_key() {
    let (db, log) = setup();
    let user = author_with_posts(&db, &["keep", "drop"]);

    let user = User::find_by_id(&db, user.id()).unwrap().unwrap();
    let posts = user.many("posts").unwrap();
    let dropped = posts
        .iter()
        .unwrap()
        .find(|post| post.get_as::<String>("title").unwrap() == "drop")
        .unwrap();
    assert!(posts.remove(&dropped).unwrap());

    log.clear();
    db.save(&user, &SaveOptions::new().with("posts")).unwrap();

    assert_eq!(
        log.sql().last().unwrap(),
        "UPDATE posts SET author_id = #{params.p0} WHERE id IN (#{params.p1})"
    );
    assert_eq!(log.count_kind(StatementKind::Delete), 0);

    // The row survives without an author
    let reloaded = Post::query(&db).unwrap().get_by_id(dropped.id()).unwrap();
    assert!(reloaded.attribute("author_id").is_null());
    assert_none!(reloaded.one("author").unwrap());
    assert_eq!(Post::query(&db).unwrap().count().unwrap(), 2);
}

#[test]
fn orphans_are_deleted() {
    let (db, log) = setup();

    let post = create::<Post>(&db, &[("title", "hello".into())]).unwrap();
    for body in ["first", "second"] {
        let comment = Comment::create(&db).unwrap();
        comment.set("body", body).unwrap();
        post.many("comments").unwrap().push(comment).unwrap();
    }
    db.save(&post, &SaveOptions::new().with("comments")).unwrap();

    // The mapped field mirrors the foreign key
    let first = post.many("comments").unwrap().get(0).unwrap().unwrap();
    assert_eq!(first.get("post_id").unwrap(), post.id());

    post.many("comments").unwrap().remove(&first).unwrap();

    log.clear();
    db.save(&post, &SaveOptions::new().with("comments")).unwrap();

    assert_eq!(
        log.sql().last().unwrap(),
        "DELETE FROM comments WHERE id IN (#{params.p0})"
    );
    assert_eq!(Comment::query(&db).unwrap().count().unwrap(), 1);
}

#[test]
fn unloaded_collection_is_not_synchronized() {
    let (db, log) = setup();
    let user = author_with_posts(&db, &["one"]);

    let user = User::find_by_id(&db, user.id()).unwrap().unwrap();
    user.set("name", "anne").unwrap();

    log.clear();
    db.save(&user, &SaveOptions::new().with("posts")).unwrap();

    assert_eq!(
        log.sql(),
        ["UPDATE users SET name = #{params.p0}, email = #{params.p1} WHERE id = #{params.p2}"]
    );
    assert!(!user.many("posts").unwrap().is_loaded());
}

#[test]
fn relations_not_named_are_left_alone() {
    let (db, log) = setup();
    let user = author_with_posts(&db, &["one"]);

    user.many("posts").unwrap().clear();

    log.clear();
    db.save(&user, &SaveOptions::new()).unwrap();

    assert_eq!(log.len(), 1);
    assert_eq!(log.count_kind(StatementKind::Update), 1);
    assert_eq!(Post::query(&db).unwrap().filter_not_null("author_id").count().unwrap(), 1);
}

#[test]
fn new_members_join_a_loaded_collection() {
    let (db, _log) = setup();
    let user = author_with_posts(&db, &["one"]);

    let user = User::find_by_id(&db, user.id()).unwrap().unwrap();
    let post = Post::create(&db).unwrap();
    post.set("title", "two").unwrap();
    user.many("posts").unwrap().push(post.clone()).unwrap();

    db.save(&user, &SaveOptions::new().with("posts")).unwrap();

    assert!(!post.is_new());
    assert!(post.one("author").unwrap().unwrap().same(&user));
    assert_eq!(
        Post::query(&db)
            .unwrap()
            .filter_eq("author_id", user.id())
            .count()
            .unwrap(),
        2
    );
}
