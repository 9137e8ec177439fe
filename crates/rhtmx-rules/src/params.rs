/// Parameter bags shared by matching and generation
///
/// A value of `None` is a flag: a key given without `=value`
/// (`;flag` as a matrix param, `?flag` as a query param).

use std::collections::{BTreeMap, BTreeSet};

/// Parameter mapping: name → optional value
pub type Params = BTreeMap<String, Option<String>>;

/// Builds a [`Params`] from `(key, value)` pairs
///
/// # Examples
///
/// ```
/// use rhtmx_rules::params;
///
/// let p = params([("id", "42"), ("tab", "info")]);
/// assert_eq!(p.get("id"), Some(&Some("42".to_string())));
/// ```
pub fn params<I, K, V>(pairs: I) -> Params
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), Some(v.into())))
        .collect()
}

/// Serializes a parameter bag as `key=value` / `key` strings
///
/// Order follows the map's key order.
pub fn serialize_params(params: &Params) -> Vec<String> {
    params
        .iter()
        .map(|(key, value)| match value {
            Some(v) => format!("{}={}", key, v),
            None => key.clone(),
        })
        .collect()
}

/// Read-tracking view over a parameter bag
///
/// Every key starts out untouched; `get` marks it as consumed. Whatever is left
/// untouched after generation becomes the generated URL's own params.
pub(crate) struct TouchMap<'a> {
    map: &'a Params,
    untouched: BTreeSet<&'a str>,
}

impl<'a> TouchMap<'a> {
    pub(crate) fn new(map: &'a Params) -> Self {
        Self {
            map,
            untouched: map.keys().map(String::as_str).collect(),
        }
    }

    /// Looks up `key` and marks it consumed
    ///
    /// Outer `None`: key absent. `Some(None)`: key present as a flag.
    pub(crate) fn get(&mut self, key: &str) -> Option<Option<&'a str>> {
        self.untouched.remove(key);
        self.map.get(key).map(|value| value.as_deref())
    }

    /// Consumes the view, returning every entry nobody asked for
    pub(crate) fn into_unused(self) -> Params {
        self.untouched
            .into_iter()
            .filter_map(|key| {
                self.map
                    .get_key_value(key)
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_params_with_flags() {
        let mut p = params([("a", "1")]);
        p.insert("flag".to_string(), None);
        assert_eq!(serialize_params(&p), vec!["a=1", "flag"]);
    }

    #[test]
    fn test_touch_map_tracks_unused() {
        let p = params([("id", "1"), ("sort", "asc"), ("page", "2")]);
        let mut touch = TouchMap::new(&p);
        assert_eq!(touch.get("id"), Some(Some("1")));
        assert_eq!(touch.get("missing"), None);

        let unused = touch.into_unused();
        assert_eq!(unused, params([("page", "2"), ("sort", "asc")]));
    }

    #[test]
    fn test_touch_map_flag_value() {
        let mut p = Params::new();
        p.insert("flag".to_string(), None);
        let mut touch = TouchMap::new(&p);
        assert_eq!(touch.get("flag"), Some(None));
        assert!(touch.into_unused().is_empty());
    }
}
