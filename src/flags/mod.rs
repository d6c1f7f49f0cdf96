use serde::{Deserialize, Serialize};

mod ordered;

pub(crate) use ordered::OrderedMap;

/// Remote type whose flags only apply to the shared-with-me instance.
pub(crate) const DRIVE_REMOTE_TYPE: &str = "drive";

pub(crate) const DEFAULT_REMOTE_TYPES: [&str; 3] = ["drive", "mega", "google photos"];

/// Ordered `flag -> value` pairs; `None` is a bare switch.
pub(crate) type FlagSet = OrderedMap<Option<String>>;

pub(crate) type ResolvedFlag = (String, Option<String>);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FlagStore {
    #[serde(default)]
    flags: OrderedMap<FlagSet>,
}

impl FlagStore {
    pub(crate) fn with_defaults() -> Self {
        let mut flags = OrderedMap::new();
        for remote_type in DEFAULT_REMOTE_TYPES {
            flags.insert(remote_type, FlagSet::new());
        }
        Self { flags }
    }

    /// Empty strings are stored by older files to mean "no value".
    pub(crate) fn normalize(&mut self) {
        for set in self.flags.values_mut() {
            for value in set.values_mut() {
                if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                    *value = None;
                }
            }
        }
    }

    pub(crate) fn remote_types(&self) -> impl Iterator<Item = &str> {
        self.flags.keys()
    }

    pub(crate) fn flag_set(&self, remote_type: &str) -> Option<&FlagSet> {
        self.flags.get(remote_type)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Returns false when the type was already present.
    pub(crate) fn add_remote_type(&mut self, remote_type: &str) -> bool {
        if self.flags.contains_key(remote_type) {
            return false;
        }
        self.flags.insert(remote_type, FlagSet::new());
        true
    }

    pub(crate) fn add_or_update(&mut self, remote_type: &str, flag: &str, value: Option<String>) {
        let value = value.filter(|v| !v.trim().is_empty());
        self.flags
            .get_or_insert_with(remote_type, FlagSet::new)
            .insert(flag, value);
    }

    pub(crate) fn delete_flag(&mut self, remote_type: &str, flag: &str) -> bool {
        self.flags
            .get_mut(remote_type)
            .and_then(|set| set.remove(flag))
            .is_some()
    }

    pub(crate) fn delete_remote_type(&mut self, remote_type: &str) -> bool {
        self.flags.remove(remote_type).is_some()
    }

    /// Flags to append to a command for this remote type. Drive flags are
    /// kept for the shared instance only; the personal instance gets none.
    pub(crate) fn resolve(&self, remote_type: &str, shared: bool) -> Vec<ResolvedFlag> {
        if remote_type == DRIVE_REMOTE_TYPE && !shared {
            return vec![];
        }
        self.flags
            .get(remote_type)
            .map(|set| {
                set.iter()
                    .map(|(flag, value)| (flag.to_string(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Splits `--flag=value` typed in one go; a separate value wins.
pub(crate) fn split_flag_input(flag: &str, value: &str) -> (String, Option<String>) {
    let flag = flag.trim();
    let value = value.trim();
    if value.is_empty() {
        if let Some((name, inline)) = flag.split_once('=') {
            let inline = inline.trim();
            return (
                name.trim().to_string(),
                (!inline.is_empty()).then(|| inline.to_string()),
            );
        }
        return (flag.to_string(), None);
    }
    (flag.to_string(), Some(value.to_string()))
}
