//! A small blog schema exercising every relation kind.

use strata::{EntityDescriptor, FieldDescriptor, JoinTable, Model, RelationDescriptor, Type};

pub const SCHEMA: &str = "
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT
    );

    CREATE TABLE profiles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        bio TEXT,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users (id)
    );

    CREATE TABLE posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author_id INTEGER REFERENCES users (id)
    );

    CREATE TABLE comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        body TEXT NOT NULL,
        post_id INTEGER REFERENCES posts (id)
    );

    CREATE TABLE tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );

    CREATE TABLE post_tags (
        post_id INTEGER NOT NULL REFERENCES posts (id),
        tag_id INTEGER NOT NULL REFERENCES tags (id),
        PRIMARY KEY (post_id, tag_id)
    );

    CREATE TABLE categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        parent_id INTEGER REFERENCES categories (id)
    );
";

pub struct User;

impl Model for User {
    const NAME: &'static str = "User";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("User")
            .table("users")
            .primary_key("id", Type::I64)
            .field("name", Type::String)
            .field("email", Type::String)
            .relation(RelationDescriptor::one_to_one("profile", "Profile").mapped_by("user"))
            .relation(RelationDescriptor::one_to_many("posts", "Post").mapped_by("author"))
    }
}

pub struct Profile;

impl Model for Profile {
    const NAME: &'static str = "Profile";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Profile")
            .table("profiles")
            .primary_key("id", Type::I64)
            .field("bio", Type::String)
            .relation(
                RelationDescriptor::one_to_one("user", "User")
                    .join_column("user_id")
                    .not_null(),
            )
    }
}

pub struct Post;

impl Model for Post {
    const NAME: &'static str = "Post";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Post")
            .table("posts")
            .primary_key("id", Type::I64)
            .field("title", Type::String)
            .relation(RelationDescriptor::many_to_one("author", "User").join_column("author_id"))
            .relation(
                RelationDescriptor::one_to_many("comments", "Comment")
                    .mapped_by("post")
                    .orphan_removal(),
            )
            .relation(
                RelationDescriptor::many_to_many("tags", "Tag")
                    .join_table(JoinTable::new("post_tags", "post_id", "tag_id"))
                    .set(),
            )
    }
}

pub struct Comment;

impl Model for Comment {
    const NAME: &'static str = "Comment";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Comment")
            .table("comments")
            .primary_key("id", Type::I64)
            .field("body", Type::String)
            .mapped_field(FieldDescriptor::new("post_id", Type::I64))
            .relation(RelationDescriptor::many_to_one("post", "Post").join_column("post_id"))
    }
}

pub struct Tag;

impl Model for Tag {
    const NAME: &'static str = "Tag";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Tag")
            .table("tags")
            .primary_key("id", Type::I64)
            .field("name", Type::String)
            .relation(
                RelationDescriptor::many_to_many("posts", "Post")
                    .mapped_by("tags")
                    .set(),
            )
    }
}

pub struct Category;

impl Model for Category {
    const NAME: &'static str = "Category";

    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Category")
            .table("categories")
            .primary_key("id", Type::I64)
            .field("name", Type::String)
            .relation(RelationDescriptor::many_to_one("parent", "Category").join_column("parent_id"))
            .relation(RelationDescriptor::one_to_many("children", "Category").mapped_by("parent"))
    }
}
