//! Filtering, counting, paging and raw rows.

use tests::*;

use pretty_assertions::assert_eq;
use std_util::prelude::*;
use strata::{Db, Direction, Model, Operator, SaveOptions, TransferObject, Value};

fn users(db: &Db, count: usize) {
    for i in 1..=count {
        create::<User>(db, &[("name", format!("user{i:02}").into())]).unwrap();
    }
}

#[test]
fn empty_in_list_matches_nothing() {
    let (db, log) = setup();
    users(&db, 3);
    log.clear();

    let found = User::query(&db)
        .unwrap()
        .filter_in("id", Vec::<i64>::new())
        .get()
        .unwrap();

    assert_empty!(found);
    assert!(log.pop().unwrap().sql.ends_with("WHERE 1 = 0"));

    let all = User::query(&db)
        .unwrap()
        .filter_not_in("id", Vec::<i64>::new())
        .get()
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn operators_and_disjunctions() {
    let (db, _log) = setup();
    users(&db, 5);

    let found = User::query(&db)
        .unwrap()
        .filter("name", Operator::Like, "user0%")
        .filter("id", Operator::Gt, 3)
        .or_filter("name", Operator::Eq, "user01")
        .order_by("id", Direction::Desc)
        .get()
        .unwrap();

    let names: Vec<String> = found
        .iter()
        .map(|user| user.get_as::<String>("name").unwrap())
        .collect();
    assert_eq!(names, ["user05", "user04", "user01"]);

    let parsed: Operator = "not in".parse().unwrap();
    let rest = User::query(&db)
        .unwrap()
        .filter("id", parsed, vec![Value::from(1), Value::from(2)])
        .count()
        .unwrap();
    assert_eq!(rest, 3);
}

#[test]
fn count_and_exists() {
    let (db, log) = setup();
    users(&db, 4);
    log.clear();

    assert_eq!(User::query(&db).unwrap().count().unwrap(), 4);
    assert_eq!(
        log.pop().unwrap().sql,
        "SELECT COUNT(DISTINCT u.id) AS count FROM users AS u"
    );

    assert!(User::query(&db)
        .unwrap()
        .filter_eq("name", "user02")
        .exists()
        .unwrap());
    assert!(!User::query(&db)
        .unwrap()
        .filter_eq("name", "nobody")
        .exists()
        .unwrap());
}

#[test]
fn grouped_count_counts_groups() {
    let (db, _log) = setup();

    let ann = create::<User>(&db, &[("name", "ann".into())]).unwrap();
    let bob = create::<User>(&db, &[("name", "bob".into())]).unwrap();
    for (author, title) in [(&ann, "a1"), (&ann, "a2"), (&bob, "b1")] {
        let post = Post::create(&db).unwrap();
        post.set("title", title).unwrap();
        post.set_one("author", Some(author)).unwrap();
        db.save(&post, &SaveOptions::new()).unwrap();
    }

    let groups = Post::query(&db)
        .unwrap()
        .group_by("author_id")
        .count()
        .unwrap();
    assert_eq!(groups, 2);
}

#[test]
fn paginate() {
    let (db, _log) = setup();
    users(&db, 12);

    let page = User::query(&db)
        .unwrap()
        .order_by("id", Direction::Asc)
        .paginate(2, 5)
        .unwrap();

    assert_eq!(page.total, 12);
    assert_eq!(page.last_page, 3);
    assert_eq!((page.from, page.to), (6, 10));
    assert!(page.has_next());
    assert!(page.has_prev());

    let names: Vec<String> = page
        .iter()
        .map(|user| user.get_as::<String>("name").unwrap())
        .collect();
    assert_eq!(names, ["user06", "user07", "user08", "user09", "user10"]);

    let last = User::query(&db).unwrap().paginate(3, 5).unwrap();
    assert_eq!(last.items.len(), 2);
    assert_eq!((last.from, last.to), (11, 12));
    assert!(!last.has_next());
}

#[test]
fn raw_rows_and_explicit_columns() {
    let (db, _log) = setup();
    users(&db, 2);

    let rows = User::query(&db)
        .unwrap()
        .select(["u.name"])
        .order_by("id", Direction::Asc)
        .raw()
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("name"), Some(&Value::from("user01")));

    // Unprefixed labels still materialize the root entity
    let found = User::query(&db)
        .unwrap()
        .select(["u.id", "u.name"])
        .filter_eq("name", "user02")
        .first()
        .unwrap()
        .unwrap();
    assert_eq!(found.get_as::<String>("name").unwrap(), "user02");
    assert!(found.get("email").unwrap().is_null());
}

#[derive(Debug, PartialEq)]
struct UserDto {
    id: Option<i64>,
    name: String,
}

impl TransferObject for UserDto {
    fn to_entity(&self, db: &Db) -> strata::Result<strata::Entity> {
        let user = User::create(db)?;
        if let Some(id) = self.id {
            user.set("id", id)?;
        }
        user.set("name", self.name.as_str())?;
        Ok(user)
    }

    fn from_entity(entity: &strata::Entity) -> strata::Result<Self> {
        Ok(UserDto {
            id: Some(entity.get_as("id")?),
            name: entity.get_as("name")?,
        })
    }
}

#[test]
fn transfer_objects() {
    let (db, _log) = setup();

    let saved = db
        .save_all_dtos(
            &[
                UserDto {
                    id: None,
                    name: "ann".into(),
                },
                UserDto {
                    id: None,
                    name: "bob".into(),
                },
            ],
            &SaveOptions::new(),
        )
        .unwrap();
    assert_eq!(saved.len(), 2);

    let dtos: Vec<UserDto> = User::query(&db)
        .unwrap()
        .order_by("name", Direction::Asc)
        .get_dtos()
        .unwrap();

    assert_eq!(
        dtos,
        [
            UserDto {
                id: Some(saved[0].id().as_i64().unwrap()),
                name: "ann".into()
            },
            UserDto {
                id: Some(saved[1].id().as_i64().unwrap()),
                name: "bob".into()
            },
        ]
    );

    let renamed = db
        .save_dto(
            &UserDto {
                id: dtos[0].id,
                name: "anne".into(),
            },
            &SaveOptions::new(),
        )
        .unwrap();
    assert_eq!(renamed.id(), saved[0].id());
    assert_eq!(User::query(&db).unwrap().count().unwrap(), 2);
}

#[test]
fn paginate_past_the_last_page() {
    let (db, log) = setup();
    users(&db, 3);
    log.clear();

    let page = User::query(&db).unwrap().paginate(5, 2).unwrap();
    assert_empty!(page.items);
    assert_eq!(page.total, 3);
    assert_eq!(page.last_page, 2);
    assert_eq!((page.from, page.to), (0, 0));

    // Only the count ran
    assert_eq!(log.len(), 1);
    assert!(log.pop().unwrap().sql.starts_with("SELECT COUNT("));

    let page = User::query(&db).unwrap().paginate(u64::MAX, 10).unwrap();
    assert_empty!(page.items);
    assert_eq!(page.current_page, u64::MAX);
    assert_eq!((page.from, page.to), (0, 0));
}

#[test]
fn between_is_inclusive() {
    let (db, _log) = setup();
    users(&db, 5);

    let names: Vec<String> = User::query(&db)
        .unwrap()
        .filter_between("name", "user02", "user04")
        .order_by("name", Direction::Asc)
        .get()
        .unwrap()
        .iter()
        .map(|user| user.get_as::<String>("name").unwrap())
        .collect();

    assert_eq!(names, ["user02", "user03", "user04"]);
}

#[test]
fn transfer_object_terminals() {
    let (db, _log) = setup();
    users(&db, 3);

    let first: UserDto = User::query(&db)
        .unwrap()
        .order_by("name", Direction::Desc)
        .get_dto()
        .unwrap();
    assert_eq!(first.name, "user03");

    let missing: Option<UserDto> = User::query(&db)
        .unwrap()
        .filter_eq("name", "nobody")
        .find_dto()
        .unwrap();
    assert_none!(missing);

    let err = assert_err!(User::query(&db)
        .unwrap()
        .filter_eq("name", "nobody")
        .get_dto::<UserDto>());
    assert!(err.is_record_not_found());

    let id = first.id.unwrap();
    let found: UserDto = assert_some!(User::query(&db)
        .unwrap()
        .find_dto_by_id(id)
        .unwrap());
    assert_eq!(found, first);

    let page = User::query(&db)
        .unwrap()
        .order_by("name", Direction::Asc)
        .paginate_dtos::<UserDto>(2, 2)
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!((page.from, page.to), (3, 3));
    assert_eq!(page.items[0].name, "user03");
}
