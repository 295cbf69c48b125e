//! 列表合并引擎
//!
//! 轮询与加载更多共用的去重合并逻辑：按标识去重、两端插入、保持相对顺序。
//! 两个操作都是纯函数且幂等，轮询与翻页请求竞态时无论哪个先完成，结果一致。

use std::collections::HashSet;
use std::hash::Hash;

/// 加载更多合并：existing 原序保留，incoming 中未出现过的元素按其原序追加到尾部
pub fn merge_append<T, K, F>(existing: Vec<T>, incoming: Vec<T>, id_of: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = existing.iter().map(&id_of).collect();
    let mut merged = existing;
    for item in incoming {
        if seen.insert(id_of(&item)) {
            merged.push(item);
        }
    }
    merged
}

/// 轮询合并：incoming 中未出现过的元素按其原序插到最前面，existing 原序跟在后面
pub fn merge_prepend<T, K, F>(existing: Vec<T>, incoming: Vec<T>, id_of: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let existing_ids: HashSet<K> = existing.iter().map(&id_of).collect();
    let mut fresh_ids: HashSet<K> = HashSet::new();
    let mut merged: Vec<T> = Vec::with_capacity(existing.len() + incoming.len());
    for item in incoming {
        let id = id_of(&item);
        if !existing_ids.contains(&id) && fresh_ids.insert(id) {
            merged.push(item);
        }
    }
    merged.extend(existing);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        tag: u32,
    }

    fn item(id: &'static str, tag: u32) -> Item {
        Item { id, tag }
    }

    fn ids(list: &[Item]) -> Vec<&'static str> {
        list.iter().map(|i| i.id).collect()
    }

    #[test]
    fn append_keeps_existing_order_and_drops_duplicates() {
        let existing = vec![item("1", 0), item("2", 0), item("3", 0)];
        let incoming = vec![item("3", 9), item("4", 0), item("5", 0)];
        let merged = merge_append(existing, incoming, |i| i.id);
        assert_eq!(ids(&merged), vec!["1", "2", "3", "4", "5"]);
        // 已存在的元素保留原值，不被 incoming 覆盖
        assert_eq!(merged[2].tag, 0);
    }

    #[test]
    fn prepend_inserts_only_new_items_in_front() {
        let existing = vec![item("1", 0), item("2", 0), item("3", 0)];
        let incoming = vec![item("0", 0), item("1", 9)];
        let merged = merge_prepend(existing, incoming, |i| i.id);
        assert_eq!(ids(&merged), vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn merges_are_idempotent() {
        let existing = vec![item("1", 0), item("2", 0)];
        let page = vec![item("2", 0), item("3", 0)];
        let once = merge_append(existing.clone(), page.clone(), |i| i.id);
        let twice = merge_append(once.clone(), page.clone(), |i| i.id);
        assert_eq!(once, twice);

        let once_p = merge_prepend(existing.clone(), page.clone(), |i| i.id);
        let twice_p = merge_prepend(once_p.clone(), page, |i| i.id);
        assert_eq!(once_p, twice_p);
    }

    #[test]
    fn duplicate_ids_within_incoming_collapse_to_first() {
        let existing = vec![item("1", 0)];
        let incoming = vec![item("2", 1), item("2", 2), item("3", 0)];
        let appended = merge_append(existing.clone(), incoming.clone(), |i| i.id);
        assert_eq!(ids(&appended), vec!["1", "2", "3"]);
        assert_eq!(appended[1].tag, 1);

        let prepended = merge_prepend(existing, incoming, |i| i.id);
        assert_eq!(ids(&prepended), vec!["2", "3", "1"]);
        assert_eq!(prepended[0].tag, 1);
    }

    #[test]
    fn empty_incoming_is_identity() {
        let existing = vec![item("1", 0), item("2", 0)];
        assert_eq!(
            merge_append(existing.clone(), vec![], |i| i.id),
            existing.clone()
        );
        assert_eq!(merge_prepend(existing.clone(), vec![], |i| i.id), existing);
    }
}
