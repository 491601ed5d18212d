//! Directory-style config id listings.

use std::collections::BTreeSet;

use confer_primitives::ConfigKey;

/// Shortens `full_id` to one `/`-segment deeper than `prefix`.
///
/// Returns `full_id` unchanged when it equals `prefix`. An empty `prefix` has
/// no segments, so the result is the first segment of `full_id`.
///
/// ```
/// use confer_tenant::append_one_level_of_id;
///
/// let full = "search/music/qrservers/default/qr.0";
/// assert_eq!(append_one_level_of_id("search/music", full), "search/music/qrservers");
/// assert_eq!(append_one_level_of_id("", full), "search");
/// assert_eq!(append_one_level_of_id(full, full), full);
/// ```
pub fn append_one_level_of_id(prefix: &str, full_id: &str) -> String {
	if prefix == full_id {
		return full_id.to_string();
	}
	let depth = if prefix.is_empty() {
		0
	} else {
		prefix.split('/').count()
	};
	full_id
		.split('/')
		.take(depth + 1)
		.collect::<Vec<_>>()
		.join("/")
}

/// True if `config_id` lies strictly below `prefix` in the id hierarchy.
///
/// An empty prefix contains every non-empty id.
pub(crate) fn is_below(prefix: &str, config_id: &str) -> bool {
	if prefix.is_empty() {
		return !config_id.is_empty();
	}
	config_id
		.strip_prefix(prefix)
		.is_some_and(|rest| rest.starts_with('/'))
}

/// Keys with their ids cut to the top-level segment, unless `recursive`.
pub(crate) fn list_keys(keys: BTreeSet<ConfigKey>, recursive: bool) -> BTreeSet<ConfigKey> {
	if recursive {
		return keys;
	}
	keys.into_iter()
		.map(|key| {
			let id = append_one_level_of_id("", &key.config_id);
			key.with_config_id(id)
		})
		.collect()
}

/// Keys of the same definition as `key_to_match` below its config id.
pub(crate) fn list_named_keys(
	keys: BTreeSet<ConfigKey>,
	key_to_match: &ConfigKey,
	recursive: bool,
) -> BTreeSet<ConfigKey> {
	let prefix = key_to_match.config_id.as_str();
	keys.into_iter()
		.filter(|key| key.same_definition(key_to_match) && is_below(prefix, &key.config_id))
		.map(|key| {
			if recursive {
				key
			} else {
				let id = append_one_level_of_id(prefix, &key.config_id);
				key.with_config_id(id)
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use rstest::rstest;

	use super::*;

	const FULL: &str = "search/music/qrservers/default/qr.0";

	#[rstest]
	#[case("search/music", "search/music/qrservers")]
	#[case("search", "search/music")]
	#[case(FULL, FULL)]
	#[case("", "search")]
	#[case("search/music/qrservers/default", FULL)]
	fn test_append_one_level_of_id(#[case] prefix: &str, #[case] expected: &str) {
		assert_eq!(append_one_level_of_id(prefix, FULL), expected);
	}

	#[rstest]
	#[case("", "a", true)]
	#[case("", "", false)]
	#[case("search", "search/music", true)]
	#[case("search", "search", false)]
	#[case("search", "searchcluster/x", false)]
	#[case("search/music", "search/video/x", false)]
	fn test_is_below(#[case] prefix: &str, #[case] id: &str, #[case] expected: bool) {
		assert_eq!(is_below(prefix, id), expected);
	}

	fn keys() -> BTreeSet<ConfigKey> {
		[
			ConfigKey::new("qr", "search/music/qrservers/default/qr.0", "search"),
			ConfigKey::new("qr", "search/music/qrservers/default/qr.1", "search"),
			ConfigKey::new("qr", "search/video/qrservers/default/qr.0", "search"),
			ConfigKey::new("qr", "searchcluster/qr.0", "search"),
			ConfigKey::new("log", "admin/logserver", "cloud"),
		]
		.into_iter()
		.collect()
	}

	#[test]
	fn test_list_keys_collapses_to_top_level() {
		let listed = list_keys(keys(), false);
		let ids: Vec<_> = listed.iter().map(|key| key.config_id.as_str()).collect();
		assert_eq!(ids, vec!["admin", "search", "searchcluster"]);
		assert_eq!(list_keys(keys(), true), keys());
	}

	#[test]
	fn test_list_named_keys_one_level() {
		let matcher = ConfigKey::new("qr", "search", "search");
		let listed = list_named_keys(keys(), &matcher, false);
		let ids: Vec<_> = listed.iter().map(|key| key.config_id.as_str()).collect();
		assert_eq!(ids, vec!["search/music", "search/video"]);
	}

	#[test]
	fn test_list_named_keys_recursive_filters_definition() {
		let matcher = ConfigKey::new("qr", "search/music", "search");
		let listed = list_named_keys(keys(), &matcher, true);
		let ids: Vec<_> = listed.iter().map(|key| key.config_id.as_str()).collect();
		assert_eq!(
			ids,
			vec![
				"search/music/qrservers/default/qr.0",
				"search/music/qrservers/default/qr.1",
			]
		);
		assert!(list_named_keys(keys(), &ConfigKey::new("log", "search", "search"), true).is_empty());
	}

	fn segment() -> impl Strategy<Value = String> {
		"[a-z0-9.]{1,6}"
	}

	proptest! {
		#[test]
		fn prop_one_level_is_prefix_of_full_id(segments in prop::collection::vec(segment(), 1..6), cut in 0usize..6) {
			let full = segments.join("/");
			let cut = cut.min(segments.len());
			let prefix = segments[..cut].join("/");
			let shortened = append_one_level_of_id(&prefix, &full);

			prop_assert!(full.starts_with(&shortened));
			let expected = (cut + 1).min(segments.len());
			prop_assert_eq!(shortened.split('/').count(), expected);
		}

		#[test]
		fn prop_one_level_is_idempotent(segments in prop::collection::vec(segment(), 1..6)) {
			let full = segments.join("/");
			let first = append_one_level_of_id("", &full);
			prop_assert_eq!(append_one_level_of_id(&first, &first), first.clone());
			prop_assert_eq!(append_one_level_of_id("", &first), first);
		}
	}
}
