use uuid::Uuid;

use super::model::Feed;

/// Replaces every item's `guid` with a freshly generated v4 UUID.
///
/// Runs unconditionally, in document order; whatever guid the source carried
/// is discarded. Applying this twice yields two different sets of guids.
///
/// Returns the number of items stamped.
pub fn stamp_guids(feed: &mut Feed) -> usize {
    for item in &mut feed.channel.items {
        // TODO: normalize `pub_date` to RFC 822 once the source date format
        // is pinned down. Until then it is relayed verbatim.
        item.guid = Uuid::new_v4().to_string();
    }
    feed.channel.items.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::model::{Channel, Item};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn item(title: &str, guid: &str) -> Item {
        Item {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            description: format!("About {title}"),
            pub_date: "Tue, 31 October 2023 10:00:00 +0000".to_string(),
            guid: guid.to_string(),
        }
    }

    fn feed_with(items: Vec<Item>) -> Feed {
        Feed {
            version: "2.0".to_string(),
            channel: Channel {
                title: "Channel".to_string(),
                link: "https://example.com/".to_string(),
                description: "desc".to_string(),
                items,
            },
        }
    }

    #[test]
    fn test_stamp_replaces_existing_guid() {
        let mut feed = feed_with(vec![item("Hello", "old-123")]);
        assert_eq!(stamp_guids(&mut feed), 1);

        let guid = &feed.channel.items[0].guid;
        assert_ne!(guid, "old-123");
        assert!(Uuid::parse_str(guid).is_ok());
    }

    #[test]
    fn test_stamp_fills_empty_guid() {
        let mut feed = feed_with(vec![item("NoGuid", "")]);
        stamp_guids(&mut feed);
        assert!(Uuid::parse_str(&feed.channel.items[0].guid).is_ok());
    }

    #[test]
    fn test_stamp_empty_channel() {
        let mut feed = feed_with(Vec::new());
        let before = feed.clone();
        assert_eq!(stamp_guids(&mut feed), 0);
        assert_eq!(feed, before);
    }

    #[test]
    fn test_stamp_is_not_idempotent() {
        let mut feed = feed_with(vec![item("A", "a"), item("B", "b")]);
        stamp_guids(&mut feed);
        let first: Vec<String> = feed.channel.items.iter().map(|i| i.guid.clone()).collect();
        stamp_guids(&mut feed);
        let second: Vec<String> = feed.channel.items.iter().map(|i| i.guid.clone()).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_stamp_leaves_channel_untouched() {
        let mut feed = feed_with(vec![item("A", "a")]);
        let channel_before = (
            feed.version.clone(),
            feed.channel.title.clone(),
            feed.channel.link.clone(),
            feed.channel.description.clone(),
        );
        stamp_guids(&mut feed);
        assert_eq!(
            channel_before,
            (
                feed.version.clone(),
                feed.channel.title.clone(),
                feed.channel.link.clone(),
                feed.channel.description.clone(),
            )
        );
    }

    proptest! {
        #[test]
        fn prop_stamp_preserves_order_and_fields(
            titles in prop::collection::vec("[a-zA-Z0-9 ]{0,16}", 0..40)
        ) {
            let items: Vec<Item> = titles
                .iter()
                .enumerate()
                .map(|(i, t)| item(t, &format!("src-{i}")))
                .collect();
            let mut feed = feed_with(items.clone());

            prop_assert_eq!(stamp_guids(&mut feed), items.len());
            prop_assert_eq!(feed.channel.items.len(), items.len());

            let mut seen = HashSet::new();
            for (before, after) in items.iter().zip(&feed.channel.items) {
                prop_assert_eq!(&before.title, &after.title);
                prop_assert_eq!(&before.link, &after.link);
                prop_assert_eq!(&before.description, &after.description);
                prop_assert_eq!(&before.pub_date, &after.pub_date);
                prop_assert_ne!(&before.guid, &after.guid);
                prop_assert!(Uuid::parse_str(&after.guid).is_ok());
                prop_assert!(seen.insert(after.guid.clone()));
            }
        }
    }
}
