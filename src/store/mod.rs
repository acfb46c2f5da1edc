//! The user collection and its view state.
//!
//! `UserStore` owns the records plus the search/sort/page settings. Derived
//! views (filtered, sorted, paginated) are computed on every call through
//! [`crate::query`]; nothing derived is stored.
//!
pub mod model;

pub use model::{SortField, SortOrder, User, UserDraft, UserPatch, parse_sort_spec};

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

use crate::error::LoadError;
use crate::loader::UserSource;
use crate::query;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Proof that a load was started on a store with no other load in flight.
///
/// Only [`UserStore::begin_load`] hands these out; passing it back to
/// [`UserStore::finish_load`] of the same store applies the fetched records.
#[derive(Debug)]
pub struct LoadTicket {
    store_id: u64,
    seq: u64,
}

/// Result of a load attempt, as seen by whoever started it.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Records were replaced. `dropped` counts entries skipped for reusing an id.
    Loaded { count: usize, dropped: usize },
    /// The fetch failed; existing records were left untouched.
    Failed(LoadError),
    /// Another load was still in flight, so this one never started.
    AlreadyLoading,
    /// The ticket was not issued for this store's current load; nothing changed.
    Stale,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

#[derive(Debug)]
pub struct UserStore {
    store_id: u64,
    load_seq: u64,
    records: Vec<User>,
    loading: bool,
    search_query: String,
    sort_field: SortField,
    sort_order: SortOrder,
    current_page: usize,
    items_per_page: usize,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            store_id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            load_seq: 0,
            records: Vec::new(),
            loading: false,
            search_query: String::new(),
            sort_field: SortField::Id,
            sort_order: SortOrder::Asc,
            current_page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }

    // ---- readers ----

    pub fn records(&self) -> &[User] {
        &self.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn sort_field(&self) -> &SortField {
        &self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn get(&self, id: i64) -> Option<&User> {
        self.records.iter().find(|u| u.id == id)
    }

    /// Records matching the search query, in sort order.
    pub fn filtered_users(&self) -> Vec<&User> {
        let mut view = query::filter_users(&self.records, &self.search_query);
        query::sort_users(&mut view, &self.sort_field, self.sort_order);
        view
    }

    pub fn filtered_count(&self) -> usize {
        let q = self.search_query.to_lowercase();
        self.records
            .iter()
            .filter(|u| query::matches_query(u, &q))
            .count()
    }

    /// The current page of [`filtered_users`](Self::filtered_users).
    pub fn paginated_users(&self) -> Vec<&User> {
        let view = self.filtered_users();
        query::paginate(&view, self.current_page, self.items_per_page).to_vec()
    }

    pub fn total_pages(&self) -> usize {
        query::total_pages(self.filtered_count(), self.items_per_page)
    }

    // ---- mutations ----

    /// Append a new record with id `max(existing ids, 0) + 1` and return that id.
    ///
    /// Returns `None`, leaving the records untouched, when the largest id is
    /// already `i64::MAX`.
    pub fn add(&mut self, draft: UserDraft) -> Option<i64> {
        let max = self.records.iter().map(|u| u.id).max().unwrap_or(0).max(0);
        let Some(id) = max.checked_add(1) else {
            warn!(max, "no id left to assign; user not added");
            return None;
        };
        self.records.push(draft.into_user(id));
        debug!(id, "added user");
        Some(id)
    }

    /// Merge `patch` into the record with `id`. Returns `false` when no such record exists.
    pub fn update(&mut self, id: i64, patch: &UserPatch) -> bool {
        match self.records.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                patch.apply_to(user);
                debug!(id, "updated user");
                true
            }
            None => {
                debug!(id, "update ignored, no such user");
                false
            }
        }
    }

    /// Remove the record with `id`, if present.
    pub fn delete(&mut self, id: i64) -> Option<User> {
        let idx = self.records.iter().position(|u| u.id == id);
        match idx {
            Some(i) => {
                debug!(id, "deleted user");
                Some(self.records.remove(i))
            }
            None => {
                debug!(id, "delete ignored, no such user");
                None
            }
        }
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
        self.current_page = 1;
    }

    pub fn set_sorting(&mut self, field: SortField, order: SortOrder) {
        self.sort_field = field;
        self.sort_order = order;
    }

    /// Jump to `page`. Not clamped to `total_pages`; 0 is lifted to 1.
    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Change the page size (0 is lifted to 1) and go back to the first page.
    pub fn set_items_per_page(&mut self, n: usize) {
        self.items_per_page = n.max(1);
        self.current_page = 1;
    }

    // ---- loading ----

    /// Mark a load as in flight. Returns `None` if one already is.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.loading {
            warn!("load requested while another is in flight; ignoring");
            return None;
        }
        self.loading = true;
        self.load_seq += 1;
        Some(LoadTicket {
            store_id: self.store_id,
            seq: self.load_seq,
        })
    }

    /// Apply the result of a fetch started with [`begin_load`](Self::begin_load).
    ///
    /// On success the records are replaced wholesale (`None` means an empty
    /// list). On failure the records stay as they were. Either way the
    /// loading flag is cleared. A ticket from another store, or from an
    /// earlier load, is ignored and yields [`LoadOutcome::Stale`].
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Option<Vec<User>>, LoadError>,
    ) -> LoadOutcome {
        if !self.loading || ticket.store_id != self.store_id || ticket.seq != self.load_seq {
            warn!(
                ticket_store = ticket.store_id,
                ticket_seq = ticket.seq,
                "ignoring load result for a ticket this store did not issue"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(fetched) => {
                let (records, dropped) = dedup_ids(fetched.unwrap_or_default());
                if dropped > 0 {
                    warn!(dropped, "skipped records with duplicate ids");
                }
                self.records = records;
                info!(count = self.records.len(), "loaded users");
                LoadOutcome::Loaded {
                    count: self.records.len(),
                    dropped,
                }
            }
            Err(e) => {
                error!(error = %e, "failed to load users");
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Fetch from `source` and apply the result in one go.
    pub async fn load<S: UserSource + ?Sized>(&mut self, source: &S) -> LoadOutcome {
        let Some(ticket) = self.begin_load() else {
            return LoadOutcome::AlreadyLoading;
        };
        debug!(source = %source.describe(), "loading users");
        let result = source.fetch().await;
        self.finish_load(ticket, result)
    }
}

// First occurrence of an id wins.
fn dedup_ids(records: Vec<User>) -> (Vec<User>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let total = records.len();
    let kept: Vec<User> = records.into_iter().filter(|u| seen.insert(u.id)).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticSource;

    fn draft(first: &str) -> UserDraft {
        UserDraft::new(first, "Doe", format!("{}@example.com", first.to_lowercase()))
    }

    fn seeded() -> UserStore {
        let mut store = UserStore::new();
        for name in ["Ann", "Bob", "Cid"] {
            store.add(draft(name));
        }
        store
    }

    #[test]
    fn add_on_empty_store_assigns_id_one() {
        let mut store = UserStore::new();
        assert_eq!(store.add(draft("X")), Some(1));
        assert_eq!(store.records()[0].id, 1);
    }

    #[test]
    fn add_uses_max_id_not_length() {
        let mut store = seeded();
        store.delete(1);
        store.delete(2);
        assert_eq!(store.add(draft("Dee")), Some(4));
        let ids: Vec<i64> = store.records().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn update_missing_id_is_a_noop() {
        let mut store = seeded();
        let before = store.records().to_vec();
        assert!(!store.update(42, &UserPatch::default().first_name("Zed")));
        assert_eq!(store.records(), &before[..]);
    }

    #[test]
    fn update_changes_only_named_fields_of_one_record() {
        let mut store = seeded();
        let before = store.records().to_vec();
        assert!(store.update(2, &UserPatch::default().last_name("Stone")));
        let after = store.records();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].last_name, "Stone");
        assert_eq!(after[1].first_name, before[1].first_name);
        assert_eq!(after[1].email, before[1].email);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut store = seeded();
        assert_eq!(store.delete(2).map(|u| u.first_name), Some("Bob".to_string()));
        assert!(store.delete(2).is_none());
        let ids: Vec<i64> = store.records().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn search_resets_page_and_filters() {
        let mut store = seeded();
        store.set_items_per_page(1);
        store.set_page(3);
        store.set_search_query("an");
        assert_eq!(store.current_page(), 1);
        let ids: Vec<i64> = store.filtered_users().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn pagination_follows_sort() {
        let mut store = seeded();
        store.set_items_per_page(2);
        store.set_sorting(SortField::FirstName, SortOrder::Desc);
        let page1: Vec<i64> = store.paginated_users().iter().map(|u| u.id).collect();
        assert_eq!(page1, vec![3, 2]);
        store.set_page(2);
        let page2: Vec<i64> = store.paginated_users().iter().map(|u| u.id).collect();
        assert_eq!(page2, vec![1]);
        assert_eq!(store.total_pages(), 2);
        store.set_page(5);
        assert!(store.paginated_users().is_empty());
    }

    #[test]
    fn second_begin_load_is_rejected_until_finished() {
        let mut store = UserStore::new();
        let ticket = store.begin_load().expect("first load starts");
        assert!(store.is_loading());
        assert!(store.begin_load().is_none());
        let outcome = store.finish_load(ticket, Ok(None));
        assert!(matches!(outcome, LoadOutcome::Loaded { count: 0, dropped: 0 }));
        assert!(!store.is_loading());
        assert!(store.begin_load().is_some());
    }

    #[test]
    fn failed_load_keeps_records_and_clears_flag() {
        let mut store = seeded();
        let ticket = store.begin_load().unwrap();
        let err = serde_json::from_str::<Vec<User>>("{").unwrap_err();
        let outcome = store.finish_load(ticket, Err(err.into()));
        assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Parse { .. })));
        assert!(!store.is_loading());
        assert_eq!(store.records().len(), 3);
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let mut store = UserStore::new();
        let ticket = store.begin_load().unwrap();
        let a = draft("Ann").into_user(1);
        let b = draft("Bob").into_user(1);
        let outcome = store.finish_load(ticket, Ok(Some(vec![a, b])));
        assert!(matches!(outcome, LoadOutcome::Loaded { count: 1, dropped: 1 }));
        assert_eq!(store.records()[0].first_name, "Ann");
    }

    #[tokio::test]
    async fn load_replaces_records_from_source() {
        let mut store = seeded();
        let source = StaticSource::new(vec![draft("Eve").into_user(10)]);
        let outcome = store.load(&source).await;
        assert!(outcome.is_loaded());
        assert_eq!(store.records().len(), 1);
        assert_eq!(store.add(draft("Fay")), Some(11));
    }

    #[test]
    fn add_after_negative_ids_starts_at_one() {
        let mut store = UserStore::new();
        let ticket = store.begin_load().unwrap();
        let seed = vec![draft("Ann").into_user(-4), draft("Bob").into_user(-1)];
        assert!(store.finish_load(ticket, Ok(Some(seed))).is_loaded());
        assert_eq!(store.add(draft("Cid")), Some(1));
        assert_eq!(store.get(-4).map(|u| u.first_name.as_str()), Some("Ann"));
    }

    #[test]
    fn add_refuses_when_ids_are_exhausted() {
        let mut store = UserStore::new();
        let ticket = store.begin_load().unwrap();
        let seed = vec![draft("Max").into_user(i64::MAX)];
        assert!(store.finish_load(ticket, Ok(Some(seed))).is_loaded());
        assert_eq!(store.add(draft("Over")), None);
        assert_eq!(store.records().len(), 1);
    }

    #[test]
    fn ticket_from_another_store_is_stale() {
        let mut a = UserStore::new();
        let mut b = seeded();
        let ticket_a = a.begin_load().unwrap();
        let ticket_b = b.begin_load().unwrap();

        let outcome = b.finish_load(ticket_a, Ok(None));
        assert!(matches!(outcome, LoadOutcome::Stale));
        assert!(b.is_loading());
        assert_eq!(b.records().len(), 3);

        assert!(b.finish_load(ticket_b, Ok(None)).is_loaded());
        assert!(!b.is_loading());
        assert!(a.is_loading());
    }
}
