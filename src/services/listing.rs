//! Search and pagination over the moderation list
//!
//! Pure functions, no I/O. `BlogService::browse` feeds them the full list
//! from the store.

use crate::models::{Blog, BlogStatus};
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Keep blogs whose title, excerpt or status contains `term`, ignoring case.
///
/// A blank term keeps everything. Order is preserved.
pub fn filter(blogs: Vec<Blog>, term: &str) -> Vec<Blog> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return blogs;
    }
    blogs.into_iter().filter(|blog| matches(blog, &needle)).collect()
}

/// `needle` must already be lowercase
fn matches(blog: &Blog, needle: &str) -> bool {
    blog.title.to_lowercase().contains(needle)
        || blog.excerpt.to_lowercase().contains(needle)
        || blog.status.as_str().contains(needle)
}

/// One page of a larger list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Effective 1-based page number after clamping
    pub page: usize,
    pub per_page: usize,
    /// Item count across all pages
    pub total: usize,
    pub total_pages: usize,
    /// 1-based position of the first item shown, 0 when empty
    pub showing_from: usize,
    /// 1-based position of the last item shown, 0 when empty
    pub showing_to: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            showing_from: self.showing_from,
            showing_to: self.showing_to,
        }
    }
}

/// Slice out page `page` of `items`.
///
/// The page is clamped into `1..=max(total_pages, 1)` so out-of-range requests
/// land on the nearest real page. A `per_page` of 0 is treated as 1.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * per_page).min(total);
    let end = (page * per_page).min(total);
    let items: Vec<T> = items.into_iter().skip(start).take(end - start).collect();

    let (showing_from, showing_to) = if items.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    Page {
        items,
        page,
        per_page,
        total,
        total_pages,
        showing_from,
        showing_to,
    }
}

/// Entry in a pagination bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Number(usize),
    /// A gap of one or more hidden pages
    Ellipsis,
}

/// Serializes as a bare number or the string `"..."`
impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Number(n) => serializer.serialize_u64(*n as u64),
            PageItem::Ellipsis => serializer.serialize_str("..."),
        }
    }
}

/// Page numbers to show for `current` out of `total` pages.
///
/// All pages are listed when they fit in `max_visible`. Otherwise the first
/// and last page are always shown: near the start the bar opens with
/// `1..max_visible-1`, near the end it closes with the last `max_visible-1`
/// pages, and in between it shows `current` with one neighbour on each side.
/// Windows narrower than 5 are widened to 5.
pub fn page_window(current: usize, total: usize, max_visible: usize) -> Vec<PageItem> {
    use PageItem::{Ellipsis, Number};

    let max_visible = max_visible.max(5);
    if total <= max_visible {
        return (1..=total).map(Number).collect();
    }

    let current = current.clamp(1, total);
    let mut items = Vec::with_capacity(max_visible + 2);

    if current <= max_visible - 2 {
        items.extend((1..max_visible).map(Number));
        items.push(Ellipsis);
        items.push(Number(total));
    } else if current + (max_visible - 3) >= total {
        items.push(Number(1));
        items.push(Ellipsis);
        items.extend((total + 2 - max_visible..=total).map(Number));
    } else {
        items.push(Number(1));
        items.push(Ellipsis);
        items.extend((current - 1..=current + 1).map(Number));
        items.push(Ellipsis);
        items.push(Number(total));
    }
    items
}

/// Blog counts per moderation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusStats {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

impl StatusStats {
    pub fn from_counts(counts: &HashMap<BlogStatus, i64>) -> Self {
        let get = |status| counts.get(&status).copied().unwrap_or(0);
        let (pending, approved, rejected) = (
            get(BlogStatus::Pending),
            get(BlogStatus::Approved),
            get(BlogStatus::Rejected),
        );
        Self {
            total: pending + approved + rejected,
            pending,
            approved,
            rejected,
        }
    }
}
