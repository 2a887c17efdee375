//! Rendering of [`FetchDescriptor`]s into REST query parameters.

use kala_common::{FetchDescriptor, SortOrder, TextMatch};

use super::client::Params;

/// Profile columns embedded wherever an artist or commenter is shown.
pub const PROFILE_SUMMARY: &str = "id,username,full_name,avatar_url";

/// Artwork projection with its artist and like aggregate embedded.
pub fn artwork_select() -> String {
    format!("*,artist:profiles({PROFILE_SUMMARY}),like_count:artwork_likes(count)")
}

/// Query parameters for one gallery page.
pub fn artwork_page_params(descriptor: &FetchDescriptor) -> Params {
    let mut params: Params = vec![("select", artwork_select())];

    if let Some(text_match) = &descriptor.text_match {
        params.push(("or", text_match_clause(text_match)));
    }
    for filter in &descriptor.filters {
        params.push((filter.field.column(), eq(&filter.value)));
    }

    params.push(("order", order_clause(descriptor.order).to_string()));
    params.push(("offset", descriptor.offset().to_string()));
    params.push(("limit", descriptor.limit().to_string()));
    params
}

pub fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::CreatedAtDesc => "created_at.desc",
    }
}

/// `(title.ilike."*x*",description.ilike."*x*",...)`
pub fn text_match_clause(text_match: &TextMatch) -> String {
    let pattern = quote(&format!("*{}*", text_match.needle));
    let parts: Vec<String> = text_match
        .fields
        .iter()
        .map(|field| format!("{field}.ilike.{pattern}"))
        .collect();
    format!("({})", parts.join(","))
}

/// Exact-match operator. Everything after `eq.` is taken literally.
pub fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// Double-quote a value for use inside a logical group, escaping `"` and `\`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
