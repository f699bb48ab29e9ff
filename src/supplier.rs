//! Supplier resolution from source URLs.
//!
//! The supplier attached to every product comes from here, never from the
//! extraction payload.

use url::Url;

/// Sentinel returned when a URL matches no known supplier.
pub const UNKNOWN_SUPPLIER: &str = "Unknown";

/// Known domain fragments and the supplier names they map to.
const KNOWN_SUPPLIERS: &[(&str, &str)] = &[
    ("screwfix", "Screwfix"),
    ("toolstation", "Toolstation"),
    ("cef.co.uk", "City Electrical Factors"),
    ("rs-online", "RS Components"),
    ("electricaldirect", "Electrical Direct"),
    ("wickes", "Wickes"),
    ("amazon", "Amazon"),
    ("ebay", "eBay"),
];

/// Map a URL to a human-readable supplier name.
///
/// Matches against the host when the URL parses, otherwise against the raw
/// string. Always returns a name; unmatched URLs yield [`UNKNOWN_SUPPLIER`].
pub fn resolve_supplier(url: &str) -> &'static str {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| url.to_lowercase());

    KNOWN_SUPPLIERS
        .iter()
        .find(|(fragment, _)| host.contains(fragment))
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_SUPPLIER)
}
