//! National Development Council indices; row 1 holds units under the header

use super::SourceSpec;

pub fn sources() -> Vec<SourceSpec> {
    [
        ("NDC01", "製造業採購經理人指數PMI"),
        ("NDC02", "非製造業經理人指數NMI"),
        ("NDC03", "景氣指標及燈號"),
    ]
    .into_iter()
    .map(|(id, label)| SourceSpec::new(id, "NDC", label).with_fixed_layout(&[0], 2))
    .collect()
}
