//! Stream adapters used around the container.

use futures::future;
use futures::stream::{Stream, StreamExt};

/// Drop items equal to the previously yielded one.
pub fn distinct_until_changed<S, T>(stream: S) -> impl Stream<Item = T>
where
    S: Stream<Item = T>,
    T: Clone + PartialEq,
{
    distinct_until_changed_by(stream, |item: &T| item.clone())
}

/// Drop items whose key equals the key of the previously yielded item.
pub fn distinct_until_changed_by<S, T, K, F>(stream: S, mut key: F) -> impl Stream<Item = T>
where
    S: Stream<Item = T>,
    K: PartialEq,
    F: FnMut(&T) -> K,
{
    stream
        .scan(None::<K>, move |last, item| {
            let next = key(&item);
            let fresh = last.as_ref() != Some(&next);
            if fresh {
                *last = Some(next);
            }
            future::ready(Some(fresh.then_some(item)))
        })
        .filter_map(future::ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn test_distinct_until_changed() {
        let items: Vec<u32> = distinct_until_changed(stream::iter(vec![1, 1, 2, 2, 2, 1, 3, 3]))
            .collect()
            .await;
        assert_eq!(items, vec![1, 2, 1, 3]);
    }

    #[tokio::test]
    async fn test_distinct_until_changed_by_key() {
        let texts = vec!["kuuki", "kuuki", "Kuuki", "ocarina"];
        let items: Vec<&str> = distinct_until_changed_by(stream::iter(texts), |t| t.to_lowercase())
            .collect()
            .await;
        assert_eq!(items, vec!["kuuki", "ocarina"]);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let items: Vec<u8> = distinct_until_changed(stream::iter(Vec::<u8>::new()))
            .collect()
            .await;
        assert!(items.is_empty());
    }
}
