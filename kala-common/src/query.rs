/// Fields a free-text search is matched against (any one may match).
pub const TEXT_SEARCH_FIELDS: [&str; 3] = ["title", "description", "style"];

/// Minimum search length before the search box submits a query.
pub const MIN_SEARCH_LEN: usize = 2;

/// What the user is currently asking the gallery for.
///
/// An empty string means "no constraint" for every field. Any change to any
/// field invalidates all accumulated pages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryState {
    pub search_text: String,
    pub style: String,
    pub region: String,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Search text with surrounding whitespace removed, or None if blank.
    pub fn search_term(&self) -> Option<&str> {
        non_blank(&self.search_text)
    }

    /// True when no field constrains the result set.
    pub fn is_unfiltered(&self) -> bool {
        self.search_term().is_none()
            && non_blank(&self.style).is_none()
            && non_blank(&self.region).is_none()
    }
}

/// Whether the search box should submit `text` as a new query.
///
/// Clearing the box always submits; otherwise a single character is ignored.
pub fn search_ready(text: &str) -> bool {
    let len = text.chars().count();
    len == 0 || len >= MIN_SEARCH_LEN
}

/// Columns with exact-match filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    Style,
    Region,
}

impl FilterField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Region => "region",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EqualityFilter {
    pub field: FilterField,
    pub value: String,
}

/// Case-insensitive substring match over several columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextMatch {
    pub needle: String,
    pub fields: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    CreatedAtDesc,
}

/// Backend-neutral description of one page request.
///
/// The record range is half-open: `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchDescriptor {
    pub start: usize,
    pub end: usize,
    pub text_match: Option<TextMatch>,
    pub filters: Vec<EqualityFilter>,
    pub order: SortOrder,
}

impl FetchDescriptor {
    /// Number of records requested.
    pub fn limit(&self) -> usize {
        self.end - self.start
    }

    pub fn offset(&self) -> usize {
        self.start
    }
}

/// Translate a query and page position into a fetch descriptor. Pure.
pub fn build(query: &QueryState, page_index: usize, page_size: usize) -> FetchDescriptor {
    let page_size = page_size.max(1);
    let start = page_index * page_size;

    let text_match = query.search_term().map(|needle| TextMatch {
        needle: needle.to_string(),
        fields: &TEXT_SEARCH_FIELDS,
    });

    let filters = [
        (FilterField::Style, &query.style),
        (FilterField::Region, &query.region),
    ]
    .into_iter()
    .filter_map(|(field, value)| {
        non_blank(value).map(|v| EqualityFilter {
            field,
            value: v.to_string(),
        })
    })
    .collect();

    FetchDescriptor {
        start,
        end: start + page_size,
        text_match,
        filters,
        order: SortOrder::CreatedAtDesc,
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_range() {
        let d = build(&QueryState::new(), 0, 12);
        assert_eq!((d.start, d.end), (0, 12));
        assert_eq!(d.limit(), 12);
    }

    #[test]
    fn test_later_page_range() {
        let d = build(&QueryState::new(), 3, 12);
        assert_eq!((d.start, d.end), (36, 48));
        assert_eq!(d.offset(), 36);
    }

    #[test]
    fn test_empty_query_has_no_constraints() {
        let d = build(&QueryState::new(), 0, 12);
        assert!(d.text_match.is_none());
        assert!(d.filters.is_empty());
        assert_eq!(d.order, SortOrder::CreatedAtDesc);
    }

    #[test]
    fn test_search_text_becomes_text_match() {
        let d = build(&QueryState::new().with_search("  madhubani "), 0, 12);
        let m = d.text_match.expect("text match");
        assert_eq!(m.needle, "madhubani");
        assert_eq!(m.fields, &["title", "description", "style"]);
    }

    #[test]
    fn test_blank_search_text_is_ignored() {
        let d = build(&QueryState::new().with_search("   "), 0, 12);
        assert!(d.text_match.is_none());
    }

    #[test]
    fn test_style_and_region_become_equality_filters() {
        let q = QueryState::new().with_style("Warli").with_region("Maharashtra");
        let d = build(&q, 0, 12);
        assert_eq!(
            d.filters,
            vec![
                EqualityFilter {
                    field: FilterField::Style,
                    value: "Warli".into()
                },
                EqualityFilter {
                    field: FilterField::Region,
                    value: "Maharashtra".into()
                },
            ]
        );
    }

    #[test]
    fn test_region_only() {
        let d = build(&QueryState::new().with_region("Bihar"), 0, 12);
        assert_eq!(d.filters.len(), 1);
        assert_eq!(d.filters[0].field.column(), "region");
    }

    #[test]
    fn test_zero_page_size_is_clamped() {
        let d = build(&QueryState::new(), 2, 0);
        assert_eq!((d.start, d.end), (2, 3));
    }

    #[test]
    fn test_build_is_deterministic() {
        let q = QueryState::new().with_search("tree").with_style("Gond");
        assert_eq!(build(&q, 1, 12), build(&q, 1, 12));
    }

    #[test]
    fn test_is_unfiltered() {
        assert!(QueryState::new().is_unfiltered());
        assert!(QueryState::new().with_search(" ").is_unfiltered());
        assert!(!QueryState::new().with_style("Warli").is_unfiltered());
    }

    #[test]
    fn test_search_ready() {
        assert!(search_ready(""));
        assert!(!search_ready("a"));
        assert!(search_ready("ab"));
        assert!(search_ready("तट"));
    }
}
