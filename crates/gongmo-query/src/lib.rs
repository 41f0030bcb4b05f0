//! Listing filter/sort/paginate pipeline and the query state that drives it.

use chrono::NaiveDate;
use gongmo_core::{CategoryFilter, DateField, Employee, ListTab, Listing, SortOrder};
use serde::Serialize;
use tracing::debug_span;

pub const CRATE_NAME: &str = "gongmo-query";

/// Page-jump size of the `<<` / `>>` pager controls.
pub const PAGE_JUMP: usize = 10;

/// Filter parameters that only take effect once committed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingFilter {
    pub search_text: String,
    pub date_field: DateField,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub category: CategoryFilter,
}

impl ListingFilter {
    /// Normalises a raw date-range input: blank means "no bound".
    pub fn date_bound(raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    fn matches_text(&self, listing: &Listing) -> bool {
        if self.search_text.trim().is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        [&listing.title, &listing.source, &listing.category]
            .into_iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    fn matches_date_range(&self, listing: &Listing) -> bool {
        let value = listing.date(self.date_field);
        if let Some(from) = &self.date_from {
            if value < from.as_str() {
                return false;
            }
        }
        if let Some(to) = &self.date_to {
            if value > to.as_str() {
                return false;
            }
        }
        true
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_text(listing)
            && self.matches_date_range(listing)
            && self.category.matches(&listing.category)
    }
}

/// Everything the pipeline reads for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    pub tab: ListTab,
    pub sort_field: DateField,
    pub sort_order: SortOrder,
    /// 1-based; out-of-range values are clamped by [`project`].
    pub page: usize,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            filter: ListingFilter::default(),
            tab: ListTab::default(),
            sort_field: DateField::InfoCollectedAt,
            sort_order: SortOrder::Descending,
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub items: Vec<Listing>,
    /// The page actually shown after clamping.
    pub page: usize,
    pub total_pages: usize,
    /// Number of listings that survived filtering, across all pages.
    pub total_items: usize,
}

/// Derives the visible page of listings. Pure; never panics.
///
/// Filters by tab (deadline vs. `today`), search text, date range and category,
/// stable-sorts on the query's date field, then slices out the requested page.
pub fn project(
    records: &[Listing],
    query: &ListingQuery,
    page_size: usize,
    today: NaiveDate,
) -> Projection {
    let _span = debug_span!("project", records = records.len(), page = query.page).entered();
    let today = today.format("%Y-%m-%d").to_string();

    let mut matched = records
        .iter()
        .filter(|l| query.tab.admits(&l.deadline, &today))
        .filter(|l| query.filter.matches(l))
        .collect::<Vec<_>>();

    // `sort_by` is stable, and reversing keeps `Equal` as `Equal`, so ties stay
    // in record order for both directions.
    let field = query.sort_field;
    matched.sort_by(|a, b| {
        let ord = a.date(field).cmp(b.date(field));
        match query.sort_order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });

    let per_page = page_size.max(1);
    let total_items = matched.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = query.page.clamp(1, total_pages);
    let items = matched
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    Projection {
        items,
        page,
        total_pages,
        total_items,
    }
}

/// Draft/applied query holder.
///
/// Edits land in the draft and only reach the pipeline through [`commit`];
/// tab, sort and page setters apply immediately.
///
/// [`commit`]: QueryState::commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    draft: ListingFilter,
    applied: ListingFilter,
    tab: ListTab,
    sort_field: DateField,
    sort_order: SortOrder,
    page: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::from_query(ListingQuery::default())
    }
}

impl QueryState {
    /// Rebuilds state from an applied snapshot; the draft starts equal to it.
    pub fn from_query(query: ListingQuery) -> Self {
        Self {
            draft: query.filter.clone(),
            applied: query.filter,
            tab: query.tab,
            sort_field: query.sort_field,
            sort_order: query.sort_order,
            page: query.page.max(1),
        }
    }

    pub fn draft(&self) -> &ListingFilter {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ListingFilter {
        &mut self.draft
    }

    pub fn applied(&self) -> &ListingFilter {
        &self.applied
    }

    pub fn tab(&self) -> ListTab {
        self.tab
    }

    pub fn sort_field(&self) -> DateField {
        self.sort_field
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn commit(&mut self) {
        self.applied = self.draft.clone();
        self.page = 1;
    }

    pub fn set_tab(&mut self, tab: ListTab) {
        if self.tab != tab {
            self.tab = tab;
            self.page = 1;
        }
    }

    pub fn set_sort_field(&mut self, field: DateField) {
        self.sort_field = field;
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggled();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Moves to `page`, clamped to `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// The snapshot the pipeline consumes: applied filter plus live tab/sort/page.
    pub fn query(&self) -> ListingQuery {
        ListingQuery {
            filter: self.applied.clone(),
            tab: self.tab,
            sort_field: self.sort_field,
            sort_order: self.sort_order,
            page: self.page,
        }
    }

    pub fn project(&self, records: &[Listing], page_size: usize, today: NaiveDate) -> Projection {
        project(records, &self.query(), page_size, today)
    }
}

/// Pager controls: single-step and ten-step jumps, clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub current: usize,
    pub total_pages: usize,
}

impl Pager {
    pub fn new(current: usize, total_pages: usize) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            current: current.clamp(1, total_pages),
            total_pages,
        }
    }

    pub fn for_projection(projection: &Projection) -> Self {
        Self::new(projection.page, projection.total_pages)
    }

    /// Only worth rendering when there is more than one page.
    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 1
    }

    pub fn can_go_forward(&self) -> bool {
        self.current < self.total_pages
    }

    pub fn jump_back(&self) -> usize {
        self.current.saturating_sub(PAGE_JUMP).max(1)
    }

    pub fn prev(&self) -> usize {
        self.current.saturating_sub(1).max(1)
    }

    pub fn next(&self) -> usize {
        (self.current + 1).min(self.total_pages)
    }

    pub fn jump_forward(&self) -> usize {
        (self.current + PAGE_JUMP).min(self.total_pages)
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.total_pages
    }
}

/// Case-insensitive search over employee name, department and position.
pub fn filter_employees<'a>(employees: &'a [Employee], term: &str) -> Vec<&'a Employee> {
    let needle = term.to_lowercase();
    employees
        .iter()
        .filter(|e| {
            [&e.name, &e.department, &e.position]
                .into_iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
