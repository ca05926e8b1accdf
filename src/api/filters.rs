//! Query-string driven filtering, searching and ordering for list endpoints.
//!
//! Each list handler declares its own whitelists; anything outside them is ignored,
//! except a filter value that cannot be parsed, which is reported on that field.

use crate::api::error::FieldErrors;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, QueryOrder, Select,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::Deserialize;

pub const SEARCH_PARAM: &str = "search";
pub const ORDERING_PARAM: &str = "ordering";

/// Message for a choice filter whose value names no row.
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Query string pairs in request order. Keys may repeat (`?genres=1&genres=2`).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Last value given for `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }

    /// Every value given for `field`, in request order.
    pub fn get_all<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == field)
            .map(|(_, value)| value.as_str())
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Raw value of an exact-match text filter. Empty values are treated as absent.
pub fn exact_str<'a>(params: &'a Params, field: &str) -> Option<&'a str> {
    params.get(field).filter(|v| !v.is_empty())
}

/// Integer filter value; records a field error when present but malformed.
pub fn exact_int(params: &Params, field: &str, errors: &mut FieldErrors) -> Option<i32> {
    let raw = exact_str(params, field)?;
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            None
        }
    }
}

/// Single-choice id filter (a foreign key). Anything but an integer is an
/// invalid choice; whether the id exists is checked by the caller.
pub fn choice_id(params: &Params, field: &str, errors: &mut FieldErrors) -> Option<i32> {
    let raw = exact_str(params, field)?;
    match raw.trim().parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Multiple-choice id filter: every non-empty value of a repeated key, without
/// duplicates. Rows matching any of the ids are kept.
pub fn choice_ids(params: &Params, field: &str, errors: &mut FieldErrors) -> Vec<i32> {
    let mut ids = Vec::new();
    for raw in params.get_all(field).filter(|v| !v.is_empty()) {
        match raw.trim().parse::<i32>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(_) => errors.add(field, format!("\u{201c}{}\u{201d} is not a valid value.", raw)),
        }
    }
    ids
}

/// Whitespace or comma separated search terms, lowercased.
pub fn search_terms(params: &Params) -> Vec<String> {
    params
        .get(SEARCH_PARAM)
        .map(|raw| {
            raw.split(|c: char| c.is_whitespace() || c == ',')
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

/// Every term must occur, case-insensitively, in at least one of `columns`.
pub fn search_condition<C>(params: &Params, columns: &[C]) -> Option<Condition>
where
    C: ColumnTrait,
{
    let terms = search_terms(params);
    if terms.is_empty() || columns.is_empty() {
        return None;
    }

    let condition = terms.iter().fold(Condition::all(), |all, term| {
        let pattern = format!("%{}%", escape_like(term));
        let any = columns.iter().fold(Condition::any(), |any, col| {
            any.add(
                Expr::expr(Func::lower(Expr::col(col.as_column_ref())))
                    .like(LikeExpr::new(pattern.clone()).escape('\\')),
            )
        });
        all.add(any)
    });

    Some(condition)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Parses `ordering=a,-b` against a whitelist of `(name, column)` pairs.
pub fn ordering_fields<C: Copy>(params: &Params, allowed: &[(&str, C)]) -> Vec<(C, Order)> {
    let Some(raw) = params.get(ORDERING_PARAM) else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter_map(|field| {
            let (name, order) = match field.strip_prefix('-') {
                Some(name) => (name, Order::Desc),
                None => (field, Order::Asc),
            };
            allowed
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, col)| (*col, order))
        })
        .collect()
}

/// Applies the requested ordering, falling back to `default` ascending.
pub fn order<E>(
    select: Select<E>,
    params: &Params,
    allowed: &[(&str, E::Column)],
    default: E::Column,
) -> Select<E>
where
    E: EntityTrait,
{
    let fields = ordering_fields(params, allowed);
    if fields.is_empty() {
        return select.order_by_asc(default);
    }

    fields
        .into_iter()
        .fold(select, |select, (col, order)| select.order_by(col, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::genres;
    use sea_orm::{DbBackend, QueryFilter, QueryTrait};

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_malformed_integer_filter_is_a_field_error() {
        let mut errors = FieldErrors::new();
        let p = params(&[("year", "abc"), ("duration", "120")]);

        assert_eq!(exact_int(&p, "year", &mut errors), None);
        assert_eq!(exact_int(&p, "duration", &mut errors), Some(120));
        assert_eq!(exact_int(&p, "missing", &mut errors), None);
        assert_eq!(errors.get("year"), Some(&["Enter a whole number.".to_string()][..]));
        assert!(errors.get("duration").is_none());
    }

    #[test]
    fn test_empty_filter_value_is_ignored() {
        let mut errors = FieldErrors::new();
        let p = params(&[("year", "")]);
        assert_eq!(exact_int(&p, "year", &mut errors), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_repeated_keys_keep_every_value() {
        let p = params(&[("genres", "1"), ("year", "1970"), ("genres", "2"), ("year", "1972")]);
        assert_eq!(p.get("year"), Some("1972"));
        assert_eq!(p.get_all("genres").collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_choice_ids_dedup_and_report_malformed() {
        let mut errors = FieldErrors::new();
        let p = params(&[("genres", "3"), ("genres", "x"), ("genres", "3"), ("genres", "")]);

        assert_eq!(choice_ids(&p, "genres", &mut errors), vec![3]);
        assert_eq!(
            errors.get("genres"),
            Some(&["\u{201c}x\u{201d} is not a valid value.".to_string()][..])
        );
    }

    #[test]
    fn test_malformed_choice_id_is_an_invalid_choice() {
        let mut errors = FieldErrors::new();
        let p = params(&[("country", "france"), ("other", "7")]);

        assert_eq!(choice_id(&p, "country", &mut errors), None);
        assert_eq!(choice_id(&p, "other", &mut errors), Some(7));
        assert_eq!(errors.get("country"), Some(&[INVALID_CHOICE.to_string()][..]));
    }

    #[test]
    fn test_search_terms_split_and_lowercase() {
        let p = params(&[("search", "  Dark   KNIGHT,rises ")]);
        assert_eq!(search_terms(&p), vec!["dark", "knight", "rises"]);
        assert!(search_terms(&params(&[])).is_empty());
    }

    #[test]
    fn test_ordering_respects_whitelist() {
        let allowed = [("id", 1), ("name", 2)];
        let p = params(&[("ordering", "-name, bogus ,id")]);
        let fields = ordering_fields(&p, &allowed);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, 2);
        assert!(matches!(fields[0].1, Order::Desc));
        assert_eq!(fields[1].0, 1);
        assert!(matches!(fields[1].1, Order::Asc));
    }

    #[test]
    fn test_order_falls_back_to_default() {
        let allowed = [("name", genres::Column::Name)];
        let sql = order(
            genres::Entity::find(),
            &params(&[("ordering", "description")]),
            &allowed,
            genres::Column::Id,
        )
        .build(DbBackend::Sqlite)
        .to_string();

        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("\"id\" ASC"));
    }

    #[test]
    fn test_search_condition_requires_every_term() {
        let p = params(&[("search", "Noir thriller")]);
        let condition =
            search_condition(&p, &[genres::Column::Name, genres::Column::Description]);
        let sql = genres::Entity::find()
            .filter(condition.unwrap())
            .build(DbBackend::Sqlite)
            .to_string();

        assert!(sql.contains("'%noir%'"));
        assert!(sql.contains("'%thriller%'"));
        assert!(sql.contains(" AND "));
        assert!(sql.contains(" OR "));
    }
}
