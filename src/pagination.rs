use sea_orm::{ConnectionTrait, DbErr, EntityTrait, FromQueryResult, PaginatorTrait, Select};

/// Every listing in the application shows this many posts per page.
pub const POSTS_PER_PAGE: u64 = 10;

/// Number of page links rendered on each side of the current page.
const PAGINATOR_LOOK_AHEAD: u64 = 2;

/// The requested page in a query string, before it is clamped to what exists.
/// Only the first `page` parameter counts; a malformed query string means page 1.
pub fn requested_page(query_string: &str) -> u64 {
    let raw = url::form_urlencoded::parse(query_string.as_bytes())
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned());
    parse_page_number(raw.as_deref())
}

/// Lenient page number parsing. Absent, non-numeric and sub-1 values become 1.
pub fn parse_page_number(raw: Option<&str>) -> u64 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) if n >= 1 => n as u64,
        _ => 1,
    }
}

/// Pages needed for `item_count` items. An empty listing still has one page.
pub fn page_count(item_count: u64, per_page: u64) -> u64 {
    if item_count == 0 {
        1
    } else {
        (item_count + per_page - 1) / per_page
    }
}

/// Clamps a requested page into `1..=page_count`.
pub fn clamp_page(requested: u64, page_count: u64) -> u64 {
    requested.max(1).min(page_count.max(1))
}

/// One slice of an ordered listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: u64,
    pub page_count: u64,
    pub item_count: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.page_count
    }

    pub fn has_other_pages(&self) -> bool {
        self.has_previous() || self.has_next()
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.page_count)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn paginator(&self, base_url: &str) -> Paginator {
        Paginator {
            base_url: base_url.to_owned(),
            this_page: self.number,
            page_count: self.page_count,
        }
    }
}

/// Runs `select` as a page query: one `COUNT` and one `LIMIT/OFFSET` select.
/// Out of range requests get the nearest existing page.
pub async fn fetch_page<'db, C, E, M>(
    db: &'db C,
    select: Select<E>,
    per_page: u64,
    requested: u64,
) -> Result<Page<M>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait<Model = M>,
    M: FromQueryResult + Sized + Send + Sync + 'db,
{
    let paginator = select.paginate(db, per_page);
    let item_count = paginator.num_items().await?;
    let page_count = page_count(item_count, per_page);
    let number = clamp_page(requested, page_count);
    let items = if item_count == 0 {
        Vec::new()
    } else {
        paginator.fetch_page(number - 1).await?
    };

    Ok(Page {
        items,
        number,
        page_count,
        item_count,
    })
}

/// Page link window for templates.
///
/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 9 10 [11] 12 13
#[derive(Debug)]
pub struct Paginator {
    pub base_url: String,
    pub this_page: u64,
    pub page_count: u64,
}

impl Paginator {
    /// Page numbers to link, with `None` standing for an ellipsis.
    pub fn links(&self) -> Vec<Option<u64>> {
        let low = self.this_page.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let high = (self.this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count);
        let mut links = Vec::new();

        if low > 1 {
            links.push(Some(1));
            if low > 2 {
                links.push(None);
            }
        }
        links.extend((low..=high).map(Some));
        if high < self.page_count {
            if high + 1 < self.page_count {
                links.push(None);
            }
            links.push(Some(self.page_count));
        }

        links
    }

    pub fn url_for(&self, page: &u64) -> String {
        format!("{}?page={}", self.base_url, page)
    }

    pub fn is_current(&self, page: &u64) -> bool {
        *page == self.this_page
    }
}
