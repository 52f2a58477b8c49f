//! Scan tag normalisation.
//!
//! The same physical tag reaches us as a bare code (`ABC123`), a relative path
//! (`/product/ABC123`) or a full public URL
//! (`https://host/public/product/ABC123?ref=qr`). Everything here reduces those
//! to the bare code so they compare equal.

/// Path segments after which the next segment is the tag.
const TAG_MARKERS: &[&str] = &["product", "asset"];

/// Reduce a scan payload to its bare tag.
///
/// Idempotent: the result never contains a `/`, so a second pass only trims.
pub fn extract(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains('/') {
        return trimmed.to_string();
    }

    let path = match trimmed.find(['?', '#']) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };

    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let after_marker = segments.windows(2).find_map(|pair| {
        TAG_MARKERS
            .iter()
            .any(|marker| pair[0].eq_ignore_ascii_case(marker))
            .then_some(pair[1])
    });

    match after_marker.or_else(|| segments.last().copied()) {
        Some(tag) => tag.to_string(),
        // Nothing but separators; keep the input so extraction stays stable.
        None => trimmed.to_string(),
    }
}

/// Whether two payloads refer to the same tag.
///
/// Symmetric. True when the raw forms, the extracted forms, or either
/// raw-vs-extracted cross pair are equal. Blank inputs never match.
pub fn matches(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }

    let extracted_a = extract(a);
    let extracted_b = extract(b);

    a == b || extracted_a == extracted_b || a == extracted_b || extracted_a == b
}
