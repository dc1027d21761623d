//! Classification prompt
//!
//! - DEFAULT_TRADES: the canonical trade list used when building a tag map
//! - build_classification_prompt: prompt sent to the oracle for one description

/// Canonical trade categories
pub const DEFAULT_TRADES: &[&str] = &[
    "Groundworks",
    "Concrete + Formwork",
    "Reinforcement",
    "Structural Steel",
    "Masonry",
    "Waterproofing",
    "Roofing",
    "Mechanical",
    "Plumbing",
    "Electrical",
    "Fire Fighting",
    "HVAC",
    "Drywall / Partitions",
    "Ceilings",
    "Flooring",
    "Tiling",
    "Painting",
    "Joinery",
    "Glazing",
    "Facade",
    "Landscaping",
    "External Works",
    "General / Preliminaries",
];

/// Label assigned when nothing applies
pub const FALLBACK_TAG: &str = "General / Preliminaries";

/// Answer the oracle is told to give when no trade applies
pub const UNMAPPED_TAG: &str = "UNMAPPED";

pub const SYSTEM_INSTRUCTION: &str = "You are a construction BOQ classification assistant.";

/// Build the single-label classification prompt
///
/// # Arguments
/// * `description` - BOQ item or tag text
/// * `allowed` - allowed trade labels, in the order offered
pub fn build_classification_prompt<S: AsRef<str>>(description: &str, allowed: &[S]) -> String {
    let trades = allowed
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{SYSTEM_INSTRUCTION}\n\n\
         Classify the following BOQ TAG into a single allowed trade: {}. \
         Allowed trades are: {}. \
         Return only one trade or '{UNMAPPED_TAG}' if none applies.",
        description.trim(),
        trades
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_trades_contain_fallback() {
        assert_eq!(DEFAULT_TRADES.len(), 23);
        assert!(DEFAULT_TRADES.contains(&FALLBACK_TAG));
    }

    #[test]
    fn test_build_prompt() {
        let prompt = build_classification_prompt("  Supply CONC-100 mix ", &["Masonry", "Roofing"]);
        assert!(prompt.starts_with(SYSTEM_INSTRUCTION));
        assert!(prompt.contains("allowed trade: Supply CONC-100 mix."));
        assert!(prompt.contains("Allowed trades are: Masonry, Roofing."));
        assert!(prompt.contains("'UNMAPPED'"));
    }
}
