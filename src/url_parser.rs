//! Decodes filter parameters from a request URL into [`SelectedFilters`].
//!
//! Accepted keys are `category`, `price`, `quantity`, `manufacturer`,
//! `weight` and anything starting with `feature_` or `attribute_group_`.
//! Every other key is ignored. A value holds one or more selections
//! separated by `-`; a selection containing `:` is a `min:max` range.

use crate::types::{FacetKind, SelectedFilters, SelectedValue};

/// Output of [`parse`]: the selection plus the filter part of the query
/// string, suitable for pagination and sort links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFilters {
    pub selected: SelectedFilters,
    pub query_string: String,
}

pub fn is_filter_param(name: &str) -> bool {
    FacetKind::from_name(name).is_some()
}

pub fn parse<I, K, V>(params: I) -> ParsedFilters
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut parsed = ParsedFilters::default();
    let mut pairs = Vec::new();

    for (name, raw) in params {
        let (name, raw) = (name.as_ref(), raw.as_ref());
        if !is_filter_param(name) {
            tracing::trace!("[URL_PARSER] ignoring param {}", name);
            continue;
        }

        pairs.push(format!("{}={}", encode_key(name), encode_value(raw)));
        parsed.selected.touch(name);

        for part in raw.split('-').filter(|p| !p.is_empty()) {
            let value = match part.split_once(':') {
                Some((min, max)) => SelectedValue::range(min, max),
                None => SelectedValue::scalar(part),
            };
            parsed.selected.push(name, value);
        }
    }

    parsed.query_string = pairs.join("&");
    parsed
}

/// Form-encode a parameter name.
pub(crate) fn encode_key(name: &str) -> String {
    url::form_urlencoded::byte_serialize(name.as_bytes()).collect()
}

/// Form-encode a filter value, keeping the `-` and `:` separators literal.
/// A decoded `%` comes out as `%25`, so `%3A` only ever stands for `:`.
pub(crate) fn encode_value(raw: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(raw.as_bytes()).collect();
    encoded.replace("%3A", ":")
}

/// Parse a raw, still URL-encoded query string such as
/// `manufacturer=5-6&price=10%3A50&page=2`.
pub fn parse_query_string(raw: &str) -> ParsedFilters {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    parse(url::form_urlencoded::parse(raw.as_bytes()))
}
