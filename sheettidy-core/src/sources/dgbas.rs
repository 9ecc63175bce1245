//! Directorate-General of Budget, Accounting and Statistics

use super::SourceSpec;

/// Downloads vary in shape, so the layout is detected
pub fn sources() -> Vec<SourceSpec> {
    vec![SourceSpec::new("DGBAS01", "DGBAS", "營造工程物價指數")]
}
