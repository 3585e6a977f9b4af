//! Relations named with `with` are joined into the root query and
//! materialized from the same rows.

use tests::*;

use pretty_assertions::assert_eq;
use strata::{Db, Direction, Entity, Model, SaveOptions};

fn seed(db: &Db) -> (Entity, Entity) {
    let ann = User::create(db).unwrap();
    ann.set("name", "ann").unwrap();
    for title in ["first", "second"] {
        let post = Post::create(db).unwrap();
        post.set("title", title).unwrap();
        ann.many("posts").unwrap().push(post).unwrap();
    }

    let bob = User::create(db).unwrap();
    bob.set("name", "bob").unwrap();

    db.save_all([&ann, &bob], &SaveOptions::new().with("posts"))
        .unwrap();
    (ann, bob)
}

#[test]
fn one_to_many_in_a_single_query() {
    let (db, log) = setup();
    seed(&db);
    log.clear();

    let users = User::query(&db)
        .unwrap()
        .with("posts")
        .order_by("id", Direction::Asc)
        .get()
        .unwrap();

    assert_eq!(log.len(), 1);
    assert_eq!(
        log.pop().unwrap().sql,
        "SELECT u.id AS u_id, u.name AS u_name, u.email AS u_email, \
         posts.id AS posts_id, posts.title AS posts_title, posts.author_id AS posts_author_id \
         FROM users AS u LEFT JOIN posts AS posts ON u.id = posts.author_id \
         ORDER BY u.id ASC"
    );

    // Repeated root rows collapse into one instance
    assert_eq!(users.len(), 2);

    let ann = &users[0];
    let posts = ann.many("posts").unwrap();
    assert!(posts.is_loaded());
    assert_eq!(posts.len().unwrap(), 2);

    // Back-references point at the same instance
    for post in posts.iter().unwrap() {
        assert!(post.one("author").unwrap().unwrap().same(ann));
    }

    // Outer join rows without a match produce no members
    let bob = &users[1];
    assert!(bob.many("posts").unwrap().is_loaded());
    assert_eq!(bob.many("posts").unwrap().len().unwrap(), 0);

    assert!(log.is_empty());
}

#[test]
fn many_to_one_shares_instances() {
    let (db, log) = setup();
    seed(&db);
    log.clear();

    let posts = Post::query(&db).unwrap().with("author").get().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(log.len(), 1);

    let first = posts[0].one("author").unwrap().unwrap();
    let second = posts[1].one("author").unwrap().unwrap();
    assert!(first.same(&second));
    assert_eq!(first.get_as::<String>("name").unwrap(), "ann");

    // The author's collection was not joined, so it stays lazy
    assert!(!first.many("posts").unwrap().is_loaded());
    assert_eq!(log.len(), 1);
}

#[test]
fn many_to_many_joins_the_link_table() {
    let (db, log) = setup();

    let post = create::<Post>(&db, &[("title", "tagged".into())]).unwrap();
    for name in ["rust", "sql"] {
        let tag = create::<Tag>(&db, &[("name", name.into())]).unwrap();
        post.many("tags").unwrap().push(tag).unwrap();
    }
    db.save(&post, &SaveOptions::new().with("tags")).unwrap();
    log.clear();

    let found = Post::query(&db)
        .unwrap()
        .with("tags")
        .filter_eq("id", post.id())
        .get()
        .unwrap();

    assert_eq!(
        log.pop().unwrap().sql,
        "SELECT p.id AS p_id, p.title AS p_title, p.author_id AS p_author_id, \
         tags.id AS tags_id, tags.name AS tags_name \
         FROM posts AS p \
         LEFT JOIN post_tags AS tags_pivot ON p.id = tags_pivot.post_id \
         LEFT JOIN tags AS tags ON tags_pivot.tag_id = tags.id \
         WHERE p.id = #{params.p0}"
    );

    let tags = found[0].many("tags").unwrap();
    let mut names: Vec<String> = tags
        .iter()
        .unwrap()
        .map(|tag| tag.get_as::<String>("name").unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["rust", "sql"]);
    assert!(log.is_empty());
}

#[test]
fn inverse_one_to_one_is_joined_by_foreign_key() {
    let (db, log) = setup();

    let user = create::<User>(&db, &[("name", "ann".into())]).unwrap();
    let profile = Profile::create(&db).unwrap();
    profile.set("bio", "hello").unwrap();
    user.set_one("profile", Some(&profile)).unwrap();
    db.save(&user, &SaveOptions::new().with("profile")).unwrap();
    log.clear();

    let found = User::query(&db)
        .unwrap()
        .with("profile")
        .first()
        .unwrap()
        .unwrap();

    assert!(log
        .pop()
        .unwrap()
        .sql
        .contains("LEFT JOIN profiles AS profile ON u.id = profile.user_id"));

    let loaded = found.one("profile").unwrap().unwrap();
    assert_eq!(loaded.get_as::<String>("bio").unwrap(), "hello");
    assert!(loaded.one("user").unwrap().unwrap().same(&found));
    assert!(log.is_empty());
}

#[test]
fn find_by_id_keeps_every_member() {
    let (db, log) = setup();
    let (ann, _bob) = seed(&db);
    log.clear();

    let found = User::query(&db)
        .unwrap()
        .with("posts")
        .get_by_id(ann.id())
        .unwrap();

    // The limit applies to a key query, not to the joined rows
    assert_eq!(
        log.sql(),
        [
            "SELECT u.id FROM users AS u LEFT JOIN posts AS posts ON u.id = posts.author_id \
             WHERE u.id = #{params.p0} GROUP BY u.id LIMIT 1",
            "SELECT u.id AS u_id, u.name AS u_name, u.email AS u_email, \
             posts.id AS posts_id, posts.title AS posts_title, posts.author_id AS posts_author_id \
             FROM users AS u LEFT JOIN posts AS posts ON u.id = posts.author_id \
             WHERE u.id IN (#{params.p0})",
        ]
    );

    let posts = found.many("posts").unwrap();
    assert!(posts.is_loaded());
    assert_eq!(posts.len().unwrap(), 2);

    // Saving the loaded graph back leaves every post attached
    db.save(&found, &SaveOptions::new().with("posts")).unwrap();
    let attached = Post::query(&db)
        .unwrap()
        .filter_eq("author_id", ann.id())
        .count()
        .unwrap();
    assert_eq!(attached, 2);
}

#[test]
fn paginate_counts_root_entities() {
    let (db, _log) = setup();
    seed(&db);

    let query = User::query(&db)
        .unwrap()
        .with("posts")
        .order_by("id", Direction::Asc);

    let first = query.paginate(1, 1).unwrap();
    assert_eq!(first.total, 2);
    assert_eq!(first.last_page, 2);
    assert_eq!(first.items.len(), 1);
    assert_eq!(first[0].get_as::<String>("name").unwrap(), "ann");
    assert_eq!(first[0].many("posts").unwrap().len().unwrap(), 2);

    let second = query.paginate(2, 1).unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second[0].get_as::<String>("name").unwrap(), "bob");
    assert!(second[0].many("posts").unwrap().is_loaded());
    assert_eq!(second[0].many("posts").unwrap().len().unwrap(), 0);
}
