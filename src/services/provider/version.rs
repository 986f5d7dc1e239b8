//! 版本号排序
//!
//! 版本号按 `.`、`-`、`_` 切分成段逐段比较：两段都是数字时按数值比较，
//! 否则按字符串字典序比较。缺失的段视为 `0`，所以 `1.0` 与 `1.0.0` 相等。

use std::cmp::Ordering;

fn segments(version: &str) -> Vec<&str> {
    version
        .trim()
        .split(['.', '-', '_'])
        .filter(|s| !s.is_empty())
        .collect()
}

fn compare_segment(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}

pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let left = segments(left);
    let right = segments(right);
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        match compare_segment(l, r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }

    Ordering::Equal
}
