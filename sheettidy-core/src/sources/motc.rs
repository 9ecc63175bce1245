//! Ministry of Transportation and Communications tables captured from HTML pages

use super::SourceSpec;
use crate::tidy::HeaderPrefix;

fn prefix(prefix: &str, columns: &[usize]) -> HeaderPrefix {
    HeaderPrefix {
        prefix: prefix.to_string(),
        columns: columns.to_vec(),
    }
}

pub fn sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new("MOTC01", "MOTC", "汽車客貨運量概況")
            .with_extensions(&["json"])
            .with_fixed_layout(&[0], 1),
        SourceSpec {
            header_suffix: Some("_高速公路通行量".to_string()),
            ..SourceSpec::new("MOTC02", "MOTC", "高速公路計程收費通行量")
                .with_extensions(&["json"])
                .with_fixed_layout(&[2], 3)
        },
        SourceSpec {
            header_suffix: Some("_貨櫃裝卸量".to_string()),
            header_prefixes: vec![
                prefix("總計_", &[1, 2]),
                prefix("實櫃_", &[3, 4]),
                prefix("空櫃_", &[5, 6]),
            ],
            ..SourceSpec::new("MOTC03", "MOTC", "國際商港貨櫃裝卸量")
                .with_extensions(&["json"])
                .with_fixed_layout(&[2], 3)
        },
    ]
}
