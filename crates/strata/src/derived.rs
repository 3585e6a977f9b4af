//! Finders described by a method-style name, such as
//! `findAllByNameLikeAndEmailIsNotNullOrderByNameDesc`.

use crate::{Db, Entity, Query, Result};

use strata_core::{schema::EntityMetadata, stmt::Value, Error};
use strata_sql::{Conjunction, Direction, Operator};

/// A parsed finder name.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuery {
    pub action: Action,

    /// The name asked for transfer objects (`findDtoBy...`)
    pub dto: bool,

    pub quantifier: Quantifier,
    pub criteria: Vec<Criterion>,

    /// Sort keys by property name
    pub order_by: Vec<(String, Direction)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Find,

    /// Like `Find`, but a single result that is missing is an error
    Get,

    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// Every match
    All,

    /// The first match
    First,
}

/// One condition of a finder: a property, a comparison and how it joins the
/// conditions before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub conjunction: Conjunction,
    pub property: String,
    pub keyword: Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Eq,
    Like,
    NotLike,

    /// `LIKE %value%`
    Containing,

    In,
    NotIn,
    Between,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    IsNull,
    IsNotNull,
    True,
    False,
}

/// Result of running a finder.
#[derive(Debug)]
pub enum Derived<T = Entity> {
    One(Option<T>),
    Many(Vec<T>),
    Count(u64),
}

/// Keyword suffixes, longest first so `GreaterThanEqual` wins over
/// `GreaterThan` and `IsNotNull` over `IsNull`.
const KEYWORDS: &[(&[&str], Keyword)] = &[
    (&["Greater", "Than", "Equal"], Keyword::GreaterThanEqual),
    (&["Less", "Than", "Equal"], Keyword::LessThanEqual),
    (&["Is", "Not", "Null"], Keyword::IsNotNull),
    (&["Greater", "Than"], Keyword::GreaterThan),
    (&["Less", "Than"], Keyword::LessThan),
    (&["Not", "Like"], Keyword::NotLike),
    (&["Not", "In"], Keyword::NotIn),
    (&["Is", "Null"], Keyword::IsNull),
    (&["Containing"], Keyword::Containing),
    (&["Between"], Keyword::Between),
    (&["Like"], Keyword::Like),
    (&["True"], Keyword::True),
    (&["False"], Keyword::False),
    (&["In"], Keyword::In),
];

impl DerivedQuery {
    pub fn parse(name: &str) -> Result<DerivedQuery> {
        let invalid = |reason: &str| {
            Error::configuration(format!("invalid finder `{name}`: {reason}"))
        };

        let words = camel_words(name);
        let mut words = words.iter().map(String::as_str).peekable();

        let action = match words.next() {
            Some("find") => Action::Find,
            Some("get") => Action::Get,
            Some("count") => Action::Count,
            _ => return Err(invalid("expected `find`, `get` or `count`")),
        };

        let dto = words.next_if_eq(&"Dto").is_some();
        let quantifier = if words.next_if_eq(&"All").is_some() {
            Quantifier::All
        } else {
            words.next_if_eq(&"First");
            Quantifier::First
        };

        if words.next() != Some("By") {
            return Err(invalid("expected `By`"));
        }

        let rest: Vec<&str> = words.collect();
        let (criteria, order) = match rest.windows(2).position(|pair| pair == ["Order", "By"]) {
            Some(at) => (&rest[..at], Some(&rest[at + 2..])),
            None => (&rest[..], None),
        };

        let criteria = parse_criteria(criteria).map_err(|reason| invalid(&reason))?;
        let order_by = match order {
            Some(order) => parse_order(order).map_err(|reason| invalid(&reason))?,
            None => vec![],
        };

        Ok(DerivedQuery {
            action,
            dto,
            quantifier,
            criteria,
            order_by,
        })
    }

    /// Number of arguments the conditions consume.
    pub fn arity(&self) -> usize {
        self.criteria
            .iter()
            .map(|criterion| criterion.keyword.arity())
            .sum()
    }
}

impl Keyword {
    pub fn arity(self) -> usize {
        match self {
            Keyword::IsNull | Keyword::IsNotNull | Keyword::True | Keyword::False => 0,
            Keyword::Between => 2,
            _ => 1,
        }
    }
}

impl<T> Derived<T> {
    /// Converts every entity, as for transfer objects.
    pub fn try_map<U>(self, f: impl FnMut(T) -> Result<U>) -> Result<Derived<U>> {
        Ok(match self {
            Derived::One(item) => Derived::One(item.map(f).transpose()?),
            Derived::Many(items) => Derived::Many(items.into_iter().map(f).collect::<Result<_>>()?),
            Derived::Count(count) => Derived::Count(count),
        })
    }
}

impl Query {
    /// Adds the conditions and sort keys of `derived`, binding `args` in
    /// order.
    pub fn apply_derived(mut self, derived: &DerivedQuery, args: &[Value]) -> Result<Query> {
        let metadata = self.metadata().clone();

        if args.len() != derived.arity() {
            return Err(Error::configuration(format!(
                "finder on `{}` takes {} arguments, got {}",
                metadata.name,
                derived.arity(),
                args.len()
            )));
        }

        let mut args = args.iter().cloned();
        let mut next = || args.next().unwrap_or_default();

        for criterion in &derived.criteria {
            let column = property_column(&metadata, &criterion.property)?;

            let (operator, value) = match criterion.keyword {
                Keyword::Eq => (Operator::Eq, next()),
                Keyword::Like => (Operator::Like, next()),
                Keyword::NotLike => (Operator::NotLike, next()),
                Keyword::Containing => match next() {
                    Value::String(text) => (Operator::Like, Value::String(format!("%{text}%"))),
                    other => {
                        return Err(Error::configuration(format!(
                            "`{}` needs a string to search for, got {other}",
                            criterion.property
                        )))
                    }
                },
                Keyword::In | Keyword::NotIn => {
                    let value = next();
                    if !value.is_list() {
                        return Err(Error::configuration(format!(
                            "`{}` needs a list, got {value}",
                            criterion.property
                        )));
                    }
                    let operator = if criterion.keyword == Keyword::In {
                        Operator::In
                    } else {
                        Operator::NotIn
                    };
                    (operator, value)
                }
                Keyword::Between => (Operator::Between, Value::List(vec![next(), next()])),
                Keyword::GreaterThan => (Operator::Gt, next()),
                Keyword::GreaterThanEqual => (Operator::Ge, next()),
                Keyword::LessThan => (Operator::Lt, next()),
                Keyword::LessThanEqual => (Operator::Le, next()),
                Keyword::IsNull => (Operator::IsNull, Value::Null),
                Keyword::IsNotNull => (Operator::IsNotNull, Value::Null),
                Keyword::True => (Operator::Eq, Value::Bool(true)),
                Keyword::False => (Operator::Eq, Value::Bool(false)),
            };

            self = match criterion.conjunction {
                Conjunction::And => self.filter(column, operator, value),
                Conjunction::Or => self.or_filter(column, operator, value),
            };
        }

        for (property, direction) in &derived.order_by {
            let column = property_column(&metadata, property)?;
            self = self.order_by(column, *direction);
        }

        Ok(self)
    }
}

impl Db {
    /// Runs the finder `name` over `entity`.
    ///
    /// `count...` returns [`Derived::Count`], `...All...` returns
    /// [`Derived::Many`] and anything else the first match.
    pub fn derived(&self, entity: &str, name: &str, args: &[Value]) -> Result<Derived> {
        let derived = DerivedQuery::parse(name)?;
        let query = self.query(entity)?.apply_derived(&derived, args)?;

        tracing::debug!(entity, finder = name, "running derived query");

        Ok(match (derived.action, derived.quantifier) {
            (Action::Count, _) => Derived::Count(query.count()?),
            (_, Quantifier::All) => Derived::Many(query.get()?),
            (Action::Get, Quantifier::First) => {
                let found = query.first()?.ok_or_else(|| {
                    Error::record_not_found(format!("no `{entity}` matched `{name}`"))
                })?;
                Derived::One(Some(found))
            }
            (Action::Find, Quantifier::First) => Derived::One(query.first()?),
        })
    }
}

fn parse_criteria(words: &[&str]) -> std::result::Result<Vec<Criterion>, String> {
    let mut criteria = vec![];
    let mut conjunction = Conjunction::And;
    let mut segment = vec![];

    for word in words.iter().copied().chain([""]) {
        let next = match word {
            "And" => Conjunction::And,
            "Or" => Conjunction::Or,
            "" => Conjunction::And,
            _ => {
                segment.push(word);
                continue;
            }
        };

        if segment.is_empty() {
            if word.is_empty() && criteria.is_empty() {
                break;
            }
            return Err("empty condition".to_string());
        }

        let (property, keyword) = split_keyword(&segment);
        if property.is_empty() {
            return Err(format!("condition `{}` names no property", segment.concat()));
        }

        criteria.push(Criterion {
            conjunction,
            property: property_name(property),
            keyword,
        });

        conjunction = next;
        segment.clear();
    }

    Ok(criteria)
}

fn split_keyword<'a, 'b>(segment: &'b [&'a str]) -> (&'b [&'a str], Keyword) {
    for (suffix, keyword) in KEYWORDS {
        if segment.ends_with(suffix) {
            return (&segment[..segment.len() - suffix.len()], *keyword);
        }
    }
    (segment, Keyword::Eq)
}

fn parse_order(words: &[&str]) -> std::result::Result<Vec<(String, Direction)>, String> {
    if words.is_empty() {
        return Err("nothing to order by".to_string());
    }

    let mut keys = vec![];
    let mut property = vec![];

    for word in words {
        let direction = match *word {
            "Asc" => Direction::Asc,
            "Desc" => Direction::Desc,
            _ => {
                property.push(*word);
                continue;
            }
        };

        if property.is_empty() {
            return Err(format!("`{word}` follows no property"));
        }
        keys.push((property_name(&property), direction));
        property.clear();
    }

    if !property.is_empty() {
        keys.push((property_name(&property), Direction::Asc));
    }

    Ok(keys)
}

/// Splits a camel case name into words. A run of capitals is one word.
fn camel_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words: Vec<String> = vec![];

    for (i, c) in chars.iter().enumerate() {
        let starts_word = c.is_uppercase()
            && i > 0
            && (!chars[i - 1].is_uppercase()
                || chars.get(i + 1).is_some_and(|next| next.is_lowercase()));

        match words.last_mut() {
            Some(word) if !starts_word => word.push(*c),
            _ => words.push(c.to_string()),
        }
    }

    words
}

/// `["Author", "Id"]` becomes `authorId`.
fn property_name(words: &[&str]) -> String {
    let mut name = words.concat();
    if let Some(first) = name.get(..1) {
        let lower = first.to_lowercase();
        name.replace_range(..1, &lower);
    }
    name
}

/// `authorId` becomes `author_id`.
fn snake_case(property: &str) -> String {
    camel_words(property)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Column for a finder property: a field by name, a column, or the join
/// column of an owning relation.
fn property_column(metadata: &EntityMetadata, property: &str) -> Result<String> {
    let snake = snake_case(property);

    if let Some(field) = metadata.field(property).or_else(|| metadata.field(&snake)) {
        return Ok(field.column.clone());
    }
    if let Some(join_column) = metadata
        .relation(property)
        .and_then(|relation| relation.join_column.clone())
    {
        return Ok(join_column);
    }
    if metadata.columns().contains(&snake.as_str()) {
        return Ok(snake);
    }

    Err(Error::configuration(format!(
        "`{}` has no property `{property}`",
        metadata.name
    )))
}
