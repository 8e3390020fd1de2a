//! Ordinal encoding of verdict labels for plotting.
//!
//! Labels from different models share one 0-4 scale so they can be drawn on
//! the same axis. Yallop's seven tiers fold onto that scale.

const LABEL_ORDINALS: &[(&str, u8)] = &[
    ("Not Visible", 0),
    ("Marginal", 1),
    ("Possibly Visible", 2),
    ("Visible", 3),
    ("Easily Visible", 4),
    ("A: Easily visible", 4),
    ("B: Visible under perfect conditions", 3),
    ("C: May need optical aid", 2),
    ("D: Will need optical aid", 1),
    ("E: Visible with telescope", 0),
    ("F: Only photographic", 0),
    ("G: Not visible", 0),
];

/// Highest ordinal in the shared scale.
pub const MAX_ORDINAL: u8 = 4;

/// Ordinal of a verdict label, `None` for labels outside the table.
pub fn encode_label(label: &str) -> Option<u8> {
    LABEL_ORDINALS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, ordinal)| *ordinal)
}
