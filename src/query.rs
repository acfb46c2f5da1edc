//! Pure derivations over a slice of users: search filter, sort, page slicing.
//!
//! Nothing here is cached; the store calls these on every read so views
//! always reflect the current records.

use serde_json::Value;
use std::cmp::Ordering;

use crate::store::{SortField, SortOrder, User};

/// Whether `user` matches an already lowercased query.
///
/// An empty query matches everything.
pub fn matches_query(user: &User, query_lower: &str) -> bool {
    query_lower.is_empty()
        || user.first_name.to_lowercase().contains(query_lower)
        || user.last_name.to_lowercase().contains(query_lower)
        || user.email.to_lowercase().contains(query_lower)
}

/// Records whose first name, last name or email contain `query`, ignoring case.
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let q = query.to_lowercase();
    users.iter().filter(|u| matches_query(u, &q)).collect()
}

/// Stable sort by `field`; equal values fall back to id ascending.
pub fn sort_users(users: &mut [&User], field: &SortField, order: SortOrder) {
    users.sort_by(|a, b| {
        let by_field = compare_field(a, b, field);
        let by_field = match order {
            SortOrder::Asc => by_field,
            SortOrder::Desc => by_field.reverse(),
        };
        by_field.then_with(|| a.id.cmp(&b.id))
    });
}

/// Natural (ascending) order of two records on one field.
pub fn compare_field(a: &User, b: &User, field: &SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::FirstName => a.first_name.cmp(&b.first_name),
        SortField::LastName => a.last_name.cmp(&b.last_name),
        SortField::Email => a.email.cmp(&b.email),
        SortField::Extra(name) => compare_values(a.extra.get(name), b.extra.get(name)),
    }
}

// missing/null < bool < number < string < anything else
fn value_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = value_rank(a).cmp(&value_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

/// Items on 1-based `page` of size `per_page`, clamped to the slice.
///
/// Out-of-range pages (and a zero page size) yield an empty slice.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let Some(start) = page.saturating_sub(1).checked_mul(per_page) else {
        return &[];
    };
    if per_page == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// `ceil(count / per_page)`; zero matches (or a zero page size) is zero pages.
pub fn total_pages(count: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    count.div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserDraft;
    use serde_json::json;

    fn mk_user(id: i64, first: &str, last: &str, email: &str) -> User {
        UserDraft::new(first, last, email).into_user(id)
    }

    #[test]
    fn filter_matches_any_of_three_fields_case_insensitively() {
        let users = vec![
            mk_user(1, "Ann", "Smith", "ann@example.com"),
            mk_user(2, "Bob", "Hannon", "bob@example.com"),
            mk_user(3, "Cid", "Ng", "cid@ANNEX.io"),
            mk_user(4, "Dee", "Ray", "dee@example.com"),
        ];
        let ids: Vec<i64> = filter_users(&users, "AnN").iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn empty_query_passes_everything_in_order() {
        let users = vec![mk_user(2, "B", "", ""), mk_user(1, "A", "", "")];
        let ids: Vec<i64> = filter_users(&users, "").iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn sort_descending_keeps_ties_in_id_order() {
        let users = vec![
            mk_user(3, "Ann", "", ""),
            mk_user(1, "Bob", "", ""),
            mk_user(2, "Ann", "", ""),
        ];
        let mut view: Vec<&User> = users.iter().collect();
        sort_users(&mut view, &SortField::FirstName, SortOrder::Desc);
        let ids: Vec<i64> = view.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        sort_users(&mut view, &SortField::FirstName, SortOrder::Asc);
        let ids: Vec<i64> = view.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn sort_on_extra_field_puts_missing_values_first() {
        let mut a = mk_user(1, "", "", "");
        a.extra.insert("age".into(), json!(40));
        let b = mk_user(2, "", "", "");
        let mut c = mk_user(3, "", "", "");
        c.extra.insert("age".into(), json!(9));
        let users = vec![a, b, c];
        let mut view: Vec<&User> = users.iter().collect();
        sort_users(&mut view, &SortField::Extra("age".into()), SortOrder::Asc);
        let ids: Vec<i64> = view.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn paginate_clamps_to_bounds() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(&items, 1, 10), &items[0..10]);
        assert_eq!(paginate(&items, 3, 10), &items[20..25]);
        assert!(paginate(&items, 4, 10).is_empty());
        assert!(paginate(&items, 1, 0).is_empty());
        assert!(paginate(&items, usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(total_pages(25, 10), 3);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 0), 0);
    }
}
