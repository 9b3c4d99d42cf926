//! Identity-rewriting filters
//!
//! These only implement `map`. Each returns a new id built from the incoming
//! one; tag order is preserved unless stated otherwise.

use super::MeterFilter;
use crate::meter::{MeterId, Tag};
use std::collections::HashSet;

/// Appends a fixed list of tags
pub struct CommonTags {
    tags: Vec<Tag>,
}

impl MeterFilter for CommonTags {
    fn map(&self, id: MeterId) -> MeterId {
        id.map_tags(|mut tags| {
            tags.extend(self.tags.iter().cloned());
            tags
        })
    }
}

/// Append `tags` to every meter id
///
/// No deduplication happens: applying the filter twice, or adding a key the
/// id already carries, yields duplicate tags.
pub fn common_tags<I, T>(tags: I) -> CommonTags
where
    I: IntoIterator<Item = T>,
    T: Into<Tag>,
{
    CommonTags {
        tags: tags.into_iter().map(Into::into).collect(),
    }
}

/// Renames one tag key under a name prefix
pub struct RenameTag {
    prefix: String,
    from_key: String,
    to_key: String,
}

impl MeterFilter for RenameTag {
    fn map(&self, id: MeterId) -> MeterId {
        if !id.name().starts_with(&self.prefix) {
            return id;
        }

        id.map_tags(|tags| {
            tags.into_iter()
                .map(|tag| {
                    if tag.key() == self.from_key {
                        Tag::of(self.to_key.as_str(), tag.value())
                    } else {
                        tag
                    }
                })
                .collect()
        })
    }
}

/// Rename tag key `from_key` to `to_key` on meters whose name starts with `prefix`
///
/// Values and tag positions are kept. Ids outside the prefix are returned as-is.
pub fn rename_tag(
    prefix: impl Into<String>,
    from_key: impl Into<String>,
    to_key: impl Into<String>,
) -> RenameTag {
    RenameTag {
        prefix: prefix.into(),
        from_key: from_key.into(),
        to_key: to_key.into(),
    }
}

/// Drops tags by key
pub struct IgnoreTags {
    keys: HashSet<String>,
}

impl MeterFilter for IgnoreTags {
    fn map(&self, id: MeterId) -> MeterId {
        id.map_tags(|mut tags| {
            tags.retain(|tag| !self.keys.contains(tag.key()));
            tags
        })
    }
}

/// Drop every tag whose key is one of `keys`
pub fn ignore_tags<I, K>(keys: I) -> IgnoreTags
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    IgnoreTags {
        keys: keys.into_iter().map(Into::into).collect(),
    }
}

/// Rewrites the values of one tag key
pub struct ReplaceTagValues<R> {
    tag_key: String,
    replacement: R,
    exceptions: HashSet<String>,
}

impl<R> MeterFilter for ReplaceTagValues<R>
where
    R: Fn(&str) -> String + Send + Sync,
{
    fn map(&self, id: MeterId) -> MeterId {
        id.map_tags(|tags| {
            tags.into_iter()
                .map(|tag| {
                    if tag.key() != self.tag_key || self.exceptions.contains(tag.value()) {
                        tag
                    } else {
                        Tag::of(tag.key(), (self.replacement)(tag.value()))
                    }
                })
                .collect()
        })
    }
}

/// Rewrite values of tag `tag_key` through `replacement`
///
/// Values listed in `exceptions` are kept verbatim. Useful for collapsing a
/// high-cardinality tag, e.g. mapping every URI but a few known ones to `"other"`.
pub fn replace_tag_values<R, I, E>(
    tag_key: impl Into<String>,
    replacement: R,
    exceptions: I,
) -> ReplaceTagValues<R>
where
    R: Fn(&str) -> String + Send + Sync,
    I: IntoIterator<Item = E>,
    E: Into<String>,
{
    ReplaceTagValues {
        tag_key: tag_key.into(),
        replacement,
        exceptions: exceptions.into_iter().map(Into::into).collect(),
    }
}
