//! Date normalization to canonical `YYYY-MM`
//!
//! Government tables mix Republic-of-China years (`113年05月`, `113/05`),
//! AD years (`2024-05`, `202405`), and month labels that only make sense
//! together with a year seen on an earlier row (`一月`, `Jan.`, `1`).
//! Full dates are parsed here; month labels are exposed separately so the
//! tidy builder can combine them with the year it carries.

use regex::Regex;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// ROC year 1 is AD 1912
pub const ROC_OFFSET: i32 = 1911;

/// Years below this are read as ROC years when the grammar allows both
const ROC_CUTOFF: i32 = 1912;

/// Years a published table can carry once ROC years are shifted
pub const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1900..=2199;

const ENGLISH_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A validated calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (1..=9999).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Shift ROC years (below 1912) to AD before validating
    pub fn from_roc_or_ad(year: i32, month: u32) -> Option<Self> {
        Self::new(roc_to_ad(year), month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn roc_to_ad(year: i32) -> i32 {
    if year < ROC_CUTOFF {
        year + ROC_OFFSET
    } else {
        year
    }
}

/// Normalize a date-like string to `YYYY-MM`, or `None` when no grammar matches
pub fn normalize_date(s: &str) -> Option<String> {
    parse_date(s).map(|ym| ym.to_string())
}

/// Every standalone grammar, including the loose fallback
pub fn parse_date(s: &str) -> Option<YearMonth> {
    let token = clean_token(s);
    if token.is_empty() {
        return None;
    }
    parse_full_token(&token).or_else(|| parse_loose(&token))
}

/// Grammars that describe an unambiguous year-month, without the loose search
pub fn parse_full_date(s: &str) -> Option<YearMonth> {
    let token = clean_token(s);
    if token.is_empty() {
        return None;
    }
    parse_full_token(&token)
}

/// A cell that names a period on its own, for scoring layouts.
///
/// Only the full grammars count and the year must fall in
/// [`PLAUSIBLE_YEARS`], so counts (`12345`) and decimals (`1234.5`) in value
/// columns never score as dates.
pub fn is_period_cell(s: &str) -> bool {
    parse_full_date(s).is_some_and(|ym| PLAUSIBLE_YEARS.contains(&ym.year))
}

fn parse_full_token(token: &str) -> Option<YearMonth> {
    parse_canonical(token)
        .or_else(|| parse_compact(token))
        .or_else(|| parse_roc_words(token))
        .or_else(|| parse_separated(token))
}

/// Trim, unify full-width spaces, and drop the ".0" of numeric renderings
fn clean_token(s: &str) -> String {
    let s = s.replace('\u{3000}', " ");
    let s = s.trim();
    match s.strip_suffix(".0") {
        Some(head) if !head.is_empty() && head.chars().all(|c| c.is_ascii_digit()) => {
            head.to_string()
        }
        _ => s.to_string(),
    }
}

fn captures_to_ym(caps: &regex::Captures<'_>, roc: bool) -> Option<YearMonth> {
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    if roc {
        YearMonth::from_roc_or_ad(year, month)
    } else {
        YearMonth::new(year, month)
    }
}

/// `2024-05`, `2024/5`, `2024.05`
fn parse_canonical(token: &str) -> Option<YearMonth> {
    static CANONICAL: OnceLock<Regex> = OnceLock::new();
    let re = CANONICAL.get_or_init(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").unwrap());
    re.captures(token).and_then(|c| captures_to_ym(&c, false))
}

/// `202405`
fn parse_compact(token: &str) -> Option<YearMonth> {
    static COMPACT: OnceLock<Regex> = OnceLock::new();
    let re = COMPACT.get_or_init(|| Regex::new(r"^(\d{4})(\d{2})$").unwrap());
    re.captures(token).and_then(|c| captures_to_ym(&c, false))
}

/// `113年05月`, `民國113年5月份`, `2024年5月`
fn parse_roc_words(token: &str) -> Option<YearMonth> {
    static ROC_WORDS: OnceLock<Regex> = OnceLock::new();
    let re = ROC_WORDS
        .get_or_init(|| Regex::new(r"(?:民國)?\s*(\d{2,4})\s*年\s*(\d{1,2})\s*月").unwrap());
    re.captures(token).and_then(|c| captures_to_ym(&c, true))
}

/// `113/05`, `113-5`, `2024-05-01 00:00:00`
fn parse_separated(token: &str) -> Option<YearMonth> {
    static SEPARATED: OnceLock<Regex> = OnceLock::new();
    let re = SEPARATED.get_or_init(|| Regex::new(r"^(\d{2,4})[-/](\d{1,2})(?:\D.*)?$").unwrap());
    let caps = re.captures(token)?;
    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let month = caps.get(2)?.as_str().parse::<u32>().ok()?;
    if year < 1900 {
        YearMonth::new(year + ROC_OFFSET, month)
    } else {
        YearMonth::new(year, month)
    }
}

/// A 4-digit year followed within two characters by a month, anywhere
fn parse_loose(token: &str) -> Option<YearMonth> {
    static LOOSE: OnceLock<Regex> = OnceLock::new();
    let re = LOOSE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{4})\D{0,2}?(\d{1,2})(?:\D|$)").unwrap());
    re.captures_iter(token)
        .find_map(|c| captures_to_ym(&c, false))
}

/// Month number from Chinese numerals followed by 月 (`一月`, `十二 月`)
pub fn chinese_month(s: &str) -> Option<u32> {
    static CHINESE: OnceLock<Regex> = OnceLock::new();
    let re = CHINESE.get_or_init(|| Regex::new(r"([一二三四五六七八九十]{1,3})\s*月").unwrap());
    let numeral = re.captures(s)?.get(1)?.as_str();
    chinese_numeral(numeral).filter(|m| (1..=12).contains(m))
}

fn chinese_numeral(s: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        "一二三四五六七八九"
            .chars()
            .position(|d| d == c)
            .map(|i| i as u32 + 1)
    }

    let chars: Vec<char> = s.chars().collect();
    match chars.as_slice() {
        ['十'] => Some(10),
        ['十', d] => digit(*d).map(|d| 10 + d),
        [d] => digit(*d),
        [t, '十'] => digit(*t).map(|t| t * 10),
        [t, '十', d] => Some(digit(*t)? * 10 + digit(*d)?),
        _ => None,
    }
}

/// Month number from an English month name or abbreviation (`Jan.`, `Sept`, `March`)
pub fn english_month(s: &str) -> Option<u32> {
    static WORDS: OnceLock<Regex> = OnceLock::new();
    let re = WORDS.get_or_init(|| Regex::new(r"[A-Za-z]+").unwrap());
    re.find_iter(s).find_map(|m| {
        let word = m.as_str().to_ascii_lowercase();
        if word.len() < 3 {
            return None;
        }
        ENGLISH_MONTHS
            .iter()
            .position(|full| full.starts_with(&word))
            .map(|i| i as u32 + 1)
    })
}

/// A bare month number, optionally followed by 月 (`1`, `01`, `12月`)
pub fn bare_month(s: &str) -> Option<u32> {
    static BARE: OnceLock<Regex> = OnceLock::new();
    let re = BARE.get_or_init(|| Regex::new(r"^(\d{1,2})\s*月?$").unwrap());
    let token = clean_token(s);
    let month = re.captures(&token)?.get(1)?.as_str().parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// Any month label that needs a carried year
pub fn month_marker(s: &str) -> Option<u32> {
    chinese_month(s)
        .or_else(|| bare_month(s))
        .or_else(|| english_month(s))
}

/// AD year of a year-marker cell such as `113年`, `一○五年 2016`, `2016 Total`
///
/// A marker needs a 2 to 4 digit number together with a year or totals cue.
pub fn year_marker(s: &str) -> Option<i32> {
    static BEFORE_NIAN: OnceLock<Regex> = OnceLock::new();
    static STANDALONE: OnceLock<Regex> = OnceLock::new();

    let token = clean_token(s);
    let before_nian =
        BEFORE_NIAN.get_or_init(|| Regex::new(r"(?:^|\D)(\d{2,4})\s*年").unwrap());
    if let Some(caps) = before_nian.captures(&token)
        && let Ok(year) = caps[1].parse::<i32>()
    {
        return Some(roc_to_ad(year));
    }

    let lower = token.to_lowercase();
    let has_cue = ["年", "總計", "合計", "total"]
        .iter()
        .any(|cue| lower.contains(cue));
    if !has_cue {
        return None;
    }

    let standalone = STANDALONE.get_or_init(|| Regex::new(r"(?:^|\D)(\d{2,4})(?:\D|$)").unwrap());
    standalone
        .captures(&token)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .map(roc_to_ad)
}

/// Bare year for a dedicated year column (`113`, `113年`, `2024`)
pub fn year_cell(s: &str) -> Option<i32> {
    static YEAR_ONLY: OnceLock<Regex> = OnceLock::new();
    let re = YEAR_ONLY.get_or_init(|| Regex::new(r"^(?:民國)?\s*(\d{2,4})\s*(?:年度?)?$").unwrap());
    let token = clean_token(s);
    re.captures(&token)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .map(roc_to_ad)
}

/// The 8-digit `YYYYMMDD` tag embedded in a file or folder name
pub fn date_tag(name: &str) -> Option<&str> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| Regex::new(r"(?:^|\D)(\d{8})(?:\D|$)").unwrap());
    let caps = re.captures(name)?;
    let tag = caps.get(1)?.as_str();
    let year = tag[..4].parse::<i32>().ok()?;
    let month = tag[4..6].parse::<u32>().ok()?;
    YearMonth::new(year, month).map(|_| tag)
}

/// Year of the date tag in a file name
pub fn date_tag_year(name: &str) -> Option<i32> {
    date_tag(name).and_then(|tag| tag[..4].parse().ok())
}

/// Year-month stated somewhere in a free-text title line
pub fn title_date(text: &str) -> Option<YearMonth> {
    let token = clean_token(text);
    parse_roc_words(&token).or_else(|| parse_loose(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        for year in 1990..=2100 {
            for month in 1..=12 {
                let canonical = format!("{:04}-{:02}", year, month);
                assert_eq!(normalize_date(&canonical).as_deref(), Some(canonical.as_str()));
            }
        }
    }

    #[test]
    fn test_every_grammar_round_trips() {
        for year in 1990..=2100 {
            let roc = year - ROC_OFFSET;
            for month in 1..=12u32 {
                let canonical = format!("{:04}-{:02}", year, month);
                let inputs = [
                    format!("{}年{:02}月", roc, month),
                    format!("民國{}年{}月", roc, month),
                    format!("{:04}{:02}", year, month),
                    format!("{}/{}", year, month),
                    format!("{}.{:02}", year, month),
                    format!("{}/{:02}", roc, month),
                    format!("{}-{}-01 00:00:00", year, month),
                ];
                for input in &inputs {
                    assert_eq!(
                        normalize_date(input).as_deref(),
                        Some(canonical.as_str()),
                        "{input}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_month_words_under_year_round_trip() {
        const CHINESE: [&str; 12] = [
            "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
            "十二月",
        ];
        const ENGLISH: [&str; 12] = [
            "Jan.", "Feb.", "Mar.", "Apr.", "May", "Jun.", "Jul.", "Aug.", "Sep.", "Oct.", "Nov.",
            "Dec.",
        ];

        for year in 1990..=2100 {
            let carried = year_marker(&format!("{}年", year - ROC_OFFSET));
            assert_eq!(carried, Some(year));
            for month in 1..=12u32 {
                let canonical = format!("{:04}-{:02}", year, month);
                for word in [CHINESE[month as usize - 1], ENGLISH[month as usize - 1]] {
                    let ym = carried.and_then(|y| YearMonth::new(y, month_marker(word)?));
                    assert_eq!(ym.map(|ym| ym.to_string()), Some(canonical.clone()), "{word}");
                }
            }
        }
    }

    #[test]
    fn test_period_cells_exclude_values() {
        for value in ["12345", "23456", "1234.5", "1234.56", "9876.1", "3.35", "-1234.5"] {
            assert!(!is_period_cell(value), "{value}");
        }
        for period in ["2024-01", "202401", "113年1月", "113/01", "2024.1"] {
            assert!(is_period_cell(period), "{period}");
        }
        // only the loose fallback reads these, and it never scores a layout
        assert_eq!(normalize_date("12345").as_deref(), Some("1234-05"));
        assert!(!is_period_cell("Data for 2024 M05"));
    }

    #[test]
    fn test_invalid_months_never_normalize() {
        for bad in ["2024-13", "2024-00", "202413", "202400", "113年13月", "113/0", "2024/13"] {
            assert_eq!(normalize_date(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_roc_conversion() {
        assert_eq!(normalize_date("113年05月").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("民國 114 年 11 月").as_deref(), Some("2025-11"));
        assert_eq!(normalize_date("113/05").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("99-1").as_deref(), Some("2010-01"));
        assert_eq!(normalize_date("1130507"), None);
    }

    #[test]
    fn test_other_grammars() {
        assert_eq!(normalize_date("202405").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("202405.0").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("2024.5").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("2024-05-01 00:00:00").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("2024年5月").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("Data for 2024 M05").as_deref(), Some("2024-05"));
        assert_eq!(normalize_date("臺北市"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn test_month_markers() {
        assert_eq!(chinese_month("一月"), Some(1));
        assert_eq!(chinese_month("　十 月 Oct."), Some(10));
        assert_eq!(chinese_month("十二月"), Some(12));
        assert_eq!(chinese_month("一般"), None);
        assert_eq!(english_month("Jan."), Some(1));
        assert_eq!(english_month("十一月Nov."), Some(11));
        assert_eq!(english_month("Sept"), Some(9));
        assert_eq!(english_month("Total"), None);
        assert_eq!(bare_month("12"), Some(12));
        assert_eq!(bare_month("03月"), Some(3));
        assert_eq!(bare_month("13"), None);
        assert_eq!(month_marker("二月"), Some(2));
    }

    #[test]
    fn test_year_markers() {
        assert_eq!(year_marker("113年"), Some(2024));
        assert_eq!(year_marker("一○五年 2016"), Some(2016));
        assert_eq!(year_marker("105年 合計 Total"), Some(2016));
        assert_eq!(year_marker("2016 Total"), Some(2016));
        assert_eq!(year_marker("一月"), None);
        assert_eq!(year_marker("12"), None);
        assert_eq!(year_cell("113年"), Some(2024));
        assert_eq!(year_cell("2024"), Some(2024));
        assert_eq!(year_cell("1"), None);
    }

    #[test]
    fn test_date_tag() {
        assert_eq!(date_tag("8.1-核發建築物建造執照按用途別分_20251105.xlsx"), Some("20251105"));
        assert_eq!(date_tag_year("失業率_20251105(修正).xlsx"), Some(2025));
        assert_eq!(date_tag("失業率.xlsx"), None);
        assert_eq!(date_tag("123456789"), None);
    }

    #[test]
    fn test_title_date() {
        let ym = title_date("114年11月各縣市加油站汽柴油銷售分析表").unwrap();
        assert_eq!(ym.to_string(), "2025-11");
        assert_eq!(title_date("各縣市加油站汽柴油銷售分析表"), None);
    }
}
