//! 通用工具函数

use chrono::{DateTime, Datelike, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// 生成带前缀的唯一标识符，时间部分取自调用方传入的时钟
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}{}-{}", prefix, now.timestamp_millis(), &simple[..9])
}

/// 生成病历号：`MRN{年份}{6位序号}`
pub fn generate_mrn(admitted_at: DateTime<Utc>, sequence: u64) -> String {
    format!("MRN{}{:06}", admitted_at.year(), 100_000 + sequence % 900_000)
}

/// 不区分大小写的子串匹配，空查询匹配一切
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 截断文本，超长时追加省略号
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// 按键分组，组内保持原有顺序
pub fn group_by<T, K, F>(items: &[T], key: F) -> BTreeMap<K, Vec<&T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Vec<&T>> = BTreeMap::new();
    for item in items {
        groups.entry(key(item)).or_default().push(item);
    }
    groups
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// 按时间字段排序，返回新的集合
pub fn sort_by_date<T, F>(items: &[T], date: F, order: SortOrder) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| match order {
        SortOrder::Ascending => date(a).cmp(&date(b)),
        SortOrder::Descending => date(b).cmp(&date(a)),
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_id() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let a = generate_id("t", at);
        let b = generate_id("t", at);
        assert!(a.starts_with(&format!("t{}-", at.timestamp_millis())));
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_mrn() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(generate_mrn(at, 42), "MRN2025100042");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Complete Blood Count", "blood"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Pharmacy", "lab"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a longer sentence", 8), "a longer...");
    }

    #[test]
    fn test_group_and_sort() {
        let values = vec![3, 1, 4, 1, 5];
        let groups = group_by(&values, |v| v % 2);
        assert_eq!(groups[&1].len(), 4);
        assert_eq!(groups[&0], vec![&4]);

        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let stamped = vec![(1, base), (2, base + chrono::Duration::hours(2)), (3, base + chrono::Duration::hours(1))];
        let newest_first = sort_by_date(&stamped, |(_, t)| *t, SortOrder::Descending);
        assert_eq!(newest_first.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![2, 3, 1]);
    }
}
