//! Burst grouping.
//!
//! Photos taken within the same minute are treated as one burst. The key of
//! a burst is the creation timestamp truncated to minute precision, which
//! for RFC 3339 strings is the first [`BURST_KEY_LEN`] characters
//! (`2020-01-01T10:00`).

use std::collections::HashMap;

use crate::media::MediaItem;

/// Number of leading characters of a creation timestamp that form the key.
pub const BURST_KEY_LEN: usize = 16;

/// The smallest number of items that can form a burst.
pub const MIN_BURST_SIZE: u32 = 2;

/// Items that share the same truncated creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BurstGroup {
    /// The truncated timestamp shared by every item.
    pub key: String,
    /// Items in the order the search returned them.
    pub items: Vec<MediaItem>,
}

impl BurstGroup {
    /// Number of items in the group.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the group has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Returns the grouping key for a creation timestamp.
///
/// Timestamps shorter than [`BURST_KEY_LEN`] characters are used whole.
/// Truncation counts characters, so a multi-byte code point is never split.
pub fn burst_key(creation_time: &str) -> &str {
    match creation_time.char_indices().nth(BURST_KEY_LEN) {
        Some((end, _)) => &creation_time[..end],
        None => creation_time,
    }
}

/// Groups items into bursts and keeps those with at least `min_count` items.
///
/// Items without a creation time are dropped. Groups come out in the order
/// their key first appears in `items`, and each group keeps the original
/// item order.
pub fn group_bursts<I>(items: I, min_count: u32) -> Vec<BurstGroup>
where
    I: IntoIterator<Item = MediaItem>,
{
    let mut groups: Vec<BurstGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in items {
        let Some(creation_time) = item.creation_time.as_deref() else {
            continue;
        };
        let key = burst_key(creation_time);

        match index.get(key) {
            Some(&pos) => groups[pos].items.push(item),
            None => {
                let key = key.to_string();
                index.insert(key.clone(), groups.len());
                groups.push(BurstGroup {
                    key,
                    items: vec![item],
                });
            }
        }
    }

    let min_count = min_count as usize;
    groups.retain(|group| group.len() >= min_count);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, creation_time: &str) -> MediaItem {
        MediaItem::new(
            id,
            format!("https://lh3.example.com/{id}"),
            format!("https://photos.example.com/{id}"),
        )
        .with_creation_time(creation_time)
    }

    fn ids(group: &BurstGroup) -> Vec<&str> {
        group.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn key_truncates_to_minute() {
        assert_eq!(burst_key("2020-01-01T10:00:00Z"), "2020-01-01T10:00");
        assert_eq!(burst_key("2020-01-01T10:00:59.123Z"), "2020-01-01T10:00");
    }

    #[test]
    fn key_uses_whole_short_string() {
        assert_eq!(burst_key("2020-01-01"), "2020-01-01");
        assert_eq!(burst_key(""), "");
        assert_eq!(burst_key("2020-01-01T10:00"), "2020-01-01T10:00");
    }

    #[test]
    fn key_counts_characters_not_bytes() {
        let s = "ééééééééééééééééxx";
        assert_eq!(burst_key(s).chars().count(), BURST_KEY_LEN);
    }

    #[test]
    fn three_in_one_minute_form_a_burst() {
        let items = vec![
            item("a", "2020-01-01T10:00:00Z"),
            item("b", "2020-01-01T10:00:00Z"),
            item("c", "2020-01-01T10:00:00Z"),
            item("d", "2020-01-01T11:00:00Z"),
        ];

        let groups = group_bursts(items, MIN_BURST_SIZE);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "2020-01-01T10:00");
        assert_eq!(ids(&groups[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn group_order_follows_first_occurrence() {
        let items = vec![
            item("a", "2021-05-05T09:30:01Z"),
            item("b", "2020-01-01T10:00:10Z"),
            item("c", "2021-05-05T09:30:40Z"),
            item("d", "2020-01-01T10:00:20Z"),
            item("e", "2020-01-01T10:00:30Z"),
        ];

        let groups = group_bursts(items, 2);

        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2021-05-05T09:30", "2020-01-01T10:00"]);
        assert_eq!(ids(&groups[0]), vec!["a", "c"]);
        assert_eq!(ids(&groups[1]), vec!["b", "d", "e"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let items = vec![
            item("a", "2020-01-01T10:00:00Z"),
            item("b", "2020-01-01T10:00:01Z"),
            item("c", "2020-01-01T10:00:02Z"),
        ];

        assert_eq!(group_bursts(items.clone(), 3).len(), 1);
        assert!(group_bursts(items, 4).is_empty());
    }

    #[test]
    fn items_without_creation_time_are_dropped() {
        let items = vec![
            MediaItem::new("x", "https://lh3/x", "https://photos/x"),
            item("a", "2020-01-01T10:00:00Z"),
            MediaItem::new("y", "https://lh3/y", "https://photos/y"),
            item("b", "2020-01-01T10:00:05Z"),
        ];

        let groups = group_bursts(items, 2);

        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["a", "b"]);
    }

    #[test]
    fn short_timestamps_group_on_whole_string() {
        let items = vec![
            item("a", "2020-01-01"),
            item("b", "2020-01-01"),
            item("c", "2020-01-01T10:00:00Z"),
        ];

        let groups = group_bursts(items, 2);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "2020-01-01");
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group_bursts(Vec::new(), 2).is_empty());
    }
}
