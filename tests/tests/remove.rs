use tests::*;

use pretty_assertions::assert_eq;
use strata::{Db, Entity, Model, RemoveOptions, SaveOptions};

/// A user with a profile and two posts.
fn author(db: &Db) -> Entity {
    let user = User::create(db).unwrap();
    user.set("name", "ann").unwrap();

    let profile = Profile::create(db).unwrap();
    profile.set("bio", "hi").unwrap();
    user.set_one("profile", Some(&profile)).unwrap();

    for title in ["one", "two"] {
        let post = Post::create(db).unwrap();
        post.set("title", title).unwrap();
        user.many("posts").unwrap().push(post).unwrap();
    }

    db.save(&user, &SaveOptions::new().with("profile").with("posts"))
        .unwrap();
    user
}

#[test]
fn cascades_through_every_relation() {
    let (db, log) = setup();
    let user = author(&db);
    log.clear();

    db.remove(&user).unwrap();

    assert_eq!(
        log.sql(),
        [
            "DELETE FROM profiles WHERE user_id = #{params.p0}",
            "UPDATE posts SET author_id = #{params.p0} WHERE author_id = #{params.p1}",
            "DELETE FROM users WHERE id = #{params.p0}",
        ]
    );
    assert!(user.is_removed());

    assert_eq!(User::query(&db).unwrap().count().unwrap(), 0);
    assert_eq!(Profile::query(&db).unwrap().count().unwrap(), 0);
    assert_eq!(
        Post::query(&db)
            .unwrap()
            .filter_null("author_id")
            .count()
            .unwrap(),
        2
    );
}

#[test]
fn restricted_cascade() {
    let (db, log) = setup();
    let user = author(&db);
    log.clear();

    db.remove_with(&user, &RemoveOptions::only(["posts"])).unwrap();

    assert_eq!(log.len(), 2);
    assert!(!log.any(|stmt| stmt.sql.contains("profiles")));
    assert_eq!(Profile::query(&db).unwrap().count().unwrap(), 1);
}

#[test]
fn orphan_removal_deletes_children_and_links() {
    let (db, log) = setup();

    let post = create::<Post>(&db, &[("title", "hello".into())]).unwrap();
    let comment = Comment::create(&db).unwrap();
    comment.set("body", "nice").unwrap();
    post.many("comments").unwrap().push(comment).unwrap();
    post.many("tags")
        .unwrap()
        .push(create::<Tag>(&db, &[("name", "rust".into())]).unwrap())
        .unwrap();
    db.save(&post, &SaveOptions::new().with("comments").with("tags"))
        .unwrap();
    log.clear();

    db.remove(&post).unwrap();

    assert_eq!(
        log.sql(),
        [
            "DELETE FROM comments WHERE post_id = #{params.p0}",
            "DELETE FROM post_tags WHERE post_id = #{params.p0}",
            "DELETE FROM posts WHERE id = #{params.p0}",
        ]
    );
    assert_eq!(Comment::query(&db).unwrap().count().unwrap(), 0);
    assert_eq!(Tag::query(&db).unwrap().count().unwrap(), 1);
}

#[test]
fn inverse_many_to_many_clears_links() {
    let (db, log) = setup();

    let tag = create::<Tag>(&db, &[("name", "rust".into())]).unwrap();
    let post = create::<Post>(&db, &[("title", "hello".into())]).unwrap();
    post.many("tags").unwrap().push(tag.clone()).unwrap();
    db.save(&post, &SaveOptions::new().with("tags")).unwrap();
    log.clear();

    db.remove(&tag).unwrap();

    assert_eq!(
        log.sql(),
        [
            "DELETE FROM post_tags WHERE tag_id = #{params.p0}",
            "DELETE FROM tags WHERE id = #{params.p0}",
        ]
    );

    let post = Post::find_by_id(&db, post.id()).unwrap().unwrap();
    assert!(post.many("tags").unwrap().is_empty().unwrap());
}

#[test]
fn removed_entities_are_final() {
    let (db, log) = setup();
    let user = create::<User>(&db, &[("name", "ann".into())]).unwrap();
    db.remove_with(&user, &RemoveOptions::only(Vec::<String>::new()))
        .unwrap();
    log.clear();

    let err = db.remove(&user).unwrap_err();
    assert!(err.is_persistence());

    let err = db.save(&user, &SaveOptions::new()).unwrap_err();
    assert!(err.is_persistence());

    assert!(log.is_empty());
}

#[test]
fn unsaved_entities_cannot_be_removed() {
    let (db, log) = setup();
    let user = User::create(&db).unwrap();

    assert_err!(db.remove(&user));
    assert!(log.is_empty());
}
