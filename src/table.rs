use tracing::trace;

use crate::domain::PAGE_SIZE;
use crate::record::{Record, Role, SortDirection, SortKey};

/// Canonical table state. Everything shown on screen is derived from it by
/// [`TableState::page`].
#[derive(Debug, Clone)]
pub struct TableState {
    original: Vec<Record>, // As loaded, only used to undo sorting
    working: Vec<Record>,
    search: String,
    role_filter: Option<Role>,
    sort_key: Option<SortKey>,
    sort_direction: SortDirection,
    current_page: usize,
    page_size: usize,
}

/// The rows of the current page and the state of the pagination controls.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub rows: Vec<Record>,
    pub filtered: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub can_prev: bool,
    pub can_next: bool,
}

impl TableState {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            working: records.clone(),
            original: records,
            search: String::new(),
            role_filter: None,
            sort_key: None,
            sort_direction: SortDirection::Ascending,
            current_page: 1,
            page_size: PAGE_SIZE,
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn role_filter(&self) -> Option<Role> {
        self.role_filter
    }

    pub fn sort(&self) -> Option<(SortKey, SortDirection)> {
        self.sort_key.map(|key| (key, self.sort_direction))
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    #[cfg(test)]
    pub fn records(&self) -> &[Record] {
        &self.working
    }

    pub fn set_search(&mut self, text: &str) {
        trace!("Search \"{}\" -> \"{}\"", self.search, text);
        self.search = text.to_string();
        self.current_page = 1;
    }

    pub fn set_role_filter(&mut self, role: Option<Role>) {
        trace!("Role filter {:?} -> {:?}", self.role_filter, role);
        self.role_filter = role;
        self.current_page = 1;
    }

    /// Header click: a new column sorts ascending, the same column flips to
    /// descending and a third click restores the loaded order.
    pub fn toggle_sort(&mut self, key: SortKey) {
        let direction = match (self.sort_key, self.sort_direction) {
            (Some(current), SortDirection::Ascending) if current == key => {
                SortDirection::Descending
            }
            (Some(current), SortDirection::Descending) if current == key => {
                self.reset_sort();
                return;
            }
            _ => SortDirection::Ascending,
        };
        self.apply_sort(key, direction);
    }

    pub fn apply_sort(&mut self, key: SortKey, direction: SortDirection) {
        trace!("Sort by {:?} {:?}", key, direction);
        self.sort_key = Some(key);
        self.sort_direction = direction;
        sort_records(&mut self.working, key, direction);
    }

    pub fn reset_sort(&mut self) {
        trace!("Reset sort");
        self.sort_key = None;
        self.sort_direction = SortDirection::Ascending;
        self.working = self.original.clone();
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered().len(), self.page_size)
    }

    pub fn can_prev(&self) -> bool {
        self.current_page > 1 && self.total_pages() > 0
    }

    pub fn can_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn next_page(&mut self) {
        if self.can_next() {
            self.current_page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        if self.can_prev() {
            self.current_page -= 1;
        }
    }

    pub fn first_page(&mut self) {
        if self.can_prev() {
            self.current_page = 1;
        }
    }

    pub fn last_page(&mut self) {
        if self.can_next() {
            self.current_page = self.total_pages();
        }
    }

    /// Working records passing both the role filter and the search.
    pub fn filtered(&self) -> Vec<&Record> {
        filter_records(&self.working, &self.search, self.role_filter)
    }

    pub fn page(&self) -> PageView {
        let filtered = self.filtered();
        let total_pages = total_pages(filtered.len(), self.page_size);
        let rows = page_slice(&filtered, self.current_page, self.page_size)
            .iter()
            .map(|&r| r.clone())
            .collect();
        PageView {
            rows,
            filtered: filtered.len(),
            current_page: self.current_page(),
            total_pages,
            can_prev: self.can_prev(),
            can_next: self.can_next(),
        }
    }
}

pub fn matches(record: &Record, search: &str, role: Option<Role>) -> bool {
    if role.is_some_and(|role| record.role != role) {
        return false;
    }
    let needle = search.to_lowercase();
    record
        .fields()
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

pub fn filter_records<'a>(
    records: &'a [Record],
    search: &str,
    role: Option<Role>,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| matches(r, search, role))
        .collect()
}

pub fn sort_records(records: &mut [Record], key: SortKey, direction: SortDirection) {
    match direction {
        SortDirection::Ascending => records.sort_by(|a, b| a.compare(b, key)),
        SortDirection::Descending => records.sort_by(|a, b| b.compare(a, key)),
    }
}

/// Zero when nothing matches.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size)
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let begin = std::cmp::min(page.saturating_sub(1) * page_size, items.len());
    let end = std::cmp::min(begin + page_size, items.len());
    &items[begin..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RecordSource, SampleRecords};

    fn sample_state() -> TableState {
        TableState::new(SampleRecords.load().unwrap())
    }

    fn ids(rows: &[Record]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn search_jane_finds_one_record() {
        let mut state = sample_state();
        state.set_search("jane");
        let page = state.page();
        assert_eq!(ids(&page.rows), vec![2]);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut state = sample_state();
        state.set_search("SUPER");
        assert_eq!(ids(&state.page().rows), vec![3, 6]);

        // Ids and ages are searched as text
        state.set_search("2");
        let found: Vec<i64> = state.filtered().iter().map(|r| r.id).collect();
        assert_eq!(found, vec![1, 2, 3, 5, 6, 7]);
    }

    #[test]
    fn admin_filter() {
        let mut state = sample_state();
        state.set_role_filter(Some(Role::Admin));
        let page = state.page();
        assert_eq!(ids(&page.rows), vec![1, 5]);
        assert_eq!(page.total_pages, 1);
        assert!(!page.can_prev);
        assert!(!page.can_next);
    }

    #[test]
    fn search_and_role_must_both_match() {
        let mut state = sample_state();
        state.set_role_filter(Some(Role::User));
        state.set_search("e");
        // "Eve" contains e but is an Admin
        assert_eq!(ids(&state.page().rows), vec![2, 4, 7]);
        state.set_search("eve");
        assert!(state.page().rows.is_empty());
    }

    #[test]
    fn every_visible_row_matches_the_filters() {
        let searches = ["", "a", "J", "2", "user", "zz"];
        for search in searches {
            for role in std::iter::once(None).chain(Role::ALL.map(Some)) {
                let mut state = sample_state();
                state.set_role_filter(role);
                state.set_search(search);
                loop {
                    let page = state.page();
                    for r in page.rows.iter() {
                        assert!(role.is_none_or(|role| r.role == role));
                        assert!(
                            r.fields()
                                .iter()
                                .any(|f| f.to_lowercase().contains(&search.to_lowercase()))
                        );
                    }
                    if !page.can_next {
                        break;
                    }
                    state.next_page();
                }
            }
        }
    }

    #[test]
    fn paging_through_all_records() {
        let mut state = sample_state();
        let page = state.page();
        assert_eq!(page.total_pages, 3);
        assert_eq!(ids(&page.rows), vec![1, 2, 3]);
        assert!(!page.can_prev);

        state.next_page();
        assert_eq!(ids(&state.page().rows), vec![4, 5, 6]);

        state.next_page();
        let page = state.page();
        assert_eq!(ids(&page.rows), vec![7]);
        assert!(!page.can_next);

        state.next_page();
        assert_eq!(state.current_page(), 3);

        state.prev_page();
        state.prev_page();
        state.prev_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn first_and_last_page() {
        let mut state = sample_state();
        state.last_page();
        assert_eq!(state.current_page(), 3);
        state.first_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn filter_changes_reset_page() {
        let mut state = sample_state();
        state.next_page();
        state.next_page();
        state.set_search("a");
        assert_eq!(state.current_page(), 1);

        state.next_page();
        assert_eq!(state.current_page(), 2);
        state.set_role_filter(Some(Role::User));
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn sorting_keeps_page() {
        let mut state = sample_state();
        state.next_page();
        state.toggle_sort(SortKey::Name);
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn empty_result_disables_paging() {
        let mut state = sample_state();
        state.set_search("nobody");
        let page = state.page();
        assert!(page.rows.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current_page, 1);
        assert!(!page.can_prev);
        assert!(!page.can_next);

        state.next_page();
        state.prev_page();
        assert_eq!(state.current_page(), 1);
    }

    #[test]
    fn age_sort_cycle() {
        let mut state = sample_state();
        state.toggle_sort(SortKey::Age);
        let ages: Vec<i64> = state.records().iter().map(|r| r.age).collect();
        assert_eq!(ages, vec![22, 25, 27, 28, 29, 30, 35]);
        assert_eq!(state.sort(), Some((SortKey::Age, SortDirection::Ascending)));

        state.toggle_sort(SortKey::Age);
        let ages: Vec<i64> = state.records().iter().map(|r| r.age).collect();
        assert_eq!(ages, vec![35, 30, 29, 28, 27, 25, 22]);
        assert_eq!(state.sort(), Some((SortKey::Age, SortDirection::Descending)));

        state.toggle_sort(SortKey::Age);
        assert_eq!(ids(state.records()), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(state.sort(), None);

        state.toggle_sort(SortKey::Age);
        assert_eq!(state.sort(), Some((SortKey::Age, SortDirection::Ascending)));
    }

    #[test]
    fn switching_column_starts_ascending() {
        let mut state = sample_state();
        state.toggle_sort(SortKey::Age);
        state.toggle_sort(SortKey::Age);
        state.toggle_sort(SortKey::Name);
        assert_eq!(state.sort(), Some((SortKey::Name, SortDirection::Ascending)));
        let names: Vec<&str> = state.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Charlie", "David", "Eve", "Frank", "Grace", "Jane Smith", "John Doe"]
        );
    }

    #[test]
    fn reset_restores_full_dataset_under_filter() {
        let mut state = sample_state();
        state.set_role_filter(Some(Role::User));
        state.toggle_sort(SortKey::Id);
        state.toggle_sort(SortKey::Id);
        assert_eq!(ids(&state.page().rows), vec![7, 4, 2]);
        state.toggle_sort(SortKey::Id);
        assert_eq!(state.records().len(), 7);
        assert_eq!(ids(&state.page().rows), vec![2, 4, 7]);
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let mut once = sample_state();
        once.apply_sort(SortKey::Role, SortDirection::Descending);
        let mut twice = once.clone();
        twice.apply_sort(SortKey::Role, SortDirection::Descending);
        assert_eq!(once.records(), twice.records());
    }

    #[test]
    fn page_slice_clips() {
        let items = [1, 2, 3, 4];
        assert_eq!(page_slice(&items, 1, 3), &[1, 2, 3]);
        assert_eq!(page_slice(&items, 2, 3), &[4]);
        assert!(page_slice(&items, 3, 3).is_empty());
        assert_eq!(total_pages(0, 3), 0);
        assert_eq!(total_pages(7, 3), 3);
    }
}
