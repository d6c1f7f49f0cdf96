use std::collections::HashMap;

use crate::error::Error;
use crate::model::RemoteRef;
use crate::rclone::{ProcessRunner, args};

/// Companion remotes for shared drives are hidden from pickers.
const SHARED_SUFFIX: &str = "-shared";

pub(crate) fn check_tool(runner: &dyn ProcessRunner) -> Result<(), Error> {
    runner.capture(&args(["version"])).map(|_| ())
}

/// Every configured remote, companions included, in tool order.
pub(crate) fn parse_listremotes(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| line.trim().trim_end_matches(':').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// The names offered to the user: companions hidden, sorted.
pub(crate) fn visible_remotes(all: &[String]) -> Vec<String> {
    let mut remotes: Vec<String> = all
        .iter()
        .filter(|name| !name.ends_with(SHARED_SUFFIX))
        .cloned()
        .collect();
    remotes.sort_by_key(|name| name.to_lowercase());
    remotes
}

pub(crate) fn parse_config_dump(output: &str) -> HashMap<String, String> {
    let Ok(serde_json::Value::Object(remotes)) = serde_json::from_str(output) else {
        return HashMap::new();
    };
    remotes
        .into_iter()
        .filter_map(|(name, section)| {
            let remote_type = section.get("type")?.as_str()?.to_string();
            Some((name, remote_type))
        })
        .collect()
}

pub(crate) fn parse_config_show_type(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "type")
            .then(|| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// Remote names and types, fetched once per run. Changes made to the
/// rclone configuration while the program runs are not picked up.
#[derive(Debug, Default)]
pub(crate) struct RemoteCatalog {
    all: Option<Vec<String>>,
    types: Option<HashMap<String, String>>,
    shown: HashMap<String, Option<String>>,
}

impl RemoteCatalog {
    fn all(&mut self, runner: &dyn ProcessRunner) -> Result<&[String], Error> {
        if self.all.is_none() {
            let output = runner.capture(&args(["listremotes"]))?;
            self.all = Some(parse_listremotes(&output));
        }
        Ok(self.all.as_deref().unwrap_or_default())
    }

    pub(crate) fn names(&mut self, runner: &dyn ProcessRunner) -> Result<Vec<String>, Error> {
        Ok(visible_remotes(self.all(runner)?))
    }

    /// `<remote>-shared`, when such a companion remote is configured.
    pub(crate) fn shared_companion(
        &mut self,
        runner: &dyn ProcessRunner,
        remote: &str,
    ) -> Result<Option<String>, Error> {
        let companion = format!("{}{SHARED_SUFFIX}", remote.trim_end_matches(':'));
        Ok(self
            .all(runner)?
            .iter()
            .any(|name| *name == companion)
            .then_some(companion))
    }

    pub(crate) fn remote_type(
        &mut self,
        runner: &dyn ProcessRunner,
        remote: &str,
    ) -> Option<String> {
        let remote = remote.trim_end_matches(':');
        if self.types.is_none() {
            let dumped = runner
                .capture(&args(["config", "dump"]))
                .map(|out| parse_config_dump(&out))
                .unwrap_or_default();
            self.types = Some(dumped);
        }
        if let Some(found) = self.types.as_ref().and_then(|types| types.get(remote)) {
            return Some(found.clone());
        }
        if let Some(cached) = self.shown.get(remote) {
            return cached.clone();
        }
        let shown = runner
            .capture(&args(["config".to_string(), "show".to_string(), format!("{remote}:")]))
            .ok()
            .and_then(|out| parse_config_show_type(&out));
        self.shown.insert(remote.to_string(), shown.clone());
        shown
    }

    pub(crate) fn remote_ref(&mut self, runner: &dyn ProcessRunner, remote: &str) -> RemoteRef {
        RemoteRef {
            name: remote.trim_end_matches(':').to_string(),
            remote_type: self.remote_type(runner, remote),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rclone::MockRunner;

    #[test]
    fn listremotes_hides_shared_companions() {
        let all = parse_listremotes("mega:\ngdrive:\ngdrive-shared:\n\nBox:\n");
        assert_eq!(all, ["mega", "gdrive", "gdrive-shared", "Box"]);
        assert_eq!(visible_remotes(&all), ["Box", "gdrive", "mega"]);
    }

    #[test]
    fn config_dump_maps_names_to_types() {
        let dump = r#"{"gdrive":{"type":"drive","scope":"drive"},"mega":{"type":"mega"},"odd":{}}"#;
        let types = parse_config_dump(dump);
        assert_eq!(types.get("gdrive").map(String::as_str), Some("drive"));
        assert_eq!(types.get("mega").map(String::as_str), Some("mega"));
        assert!(!types.contains_key("odd"));
        assert!(parse_config_dump("not json").is_empty());
    }

    #[test]
    fn config_show_type_line_is_found() {
        let out = "[gdrive]\ntype = drive\nscope = drive\n";
        assert_eq!(parse_config_show_type(out).as_deref(), Some("drive"));
        assert_eq!(parse_config_show_type("[x]\nscope = y\n"), None);
    }

    #[test]
    fn catalog_fetches_dump_once() {
        let runner = MockRunner::default();
        runner.set_output(&["config", "dump"], Ok(r#"{"gdrive":{"type":"drive"}}"#));
        runner.set_output(&["config", "show", "mega:"], Ok("[mega]\ntype = mega\n"));
        let mut catalog = RemoteCatalog::default();
        assert_eq!(catalog.remote_type(&runner, "gdrive").as_deref(), Some("drive"));
        assert_eq!(catalog.remote_type(&runner, "gdrive:").as_deref(), Some("drive"));
        assert_eq!(catalog.remote_type(&runner, "mega").as_deref(), Some("mega"));
        assert_eq!(catalog.remote_type(&runner, "mega").as_deref(), Some("mega"));
        assert_eq!(runner.capture_count("config"), 2);
        let remote = catalog.remote_ref(&runner, "gdrive");
        assert!(remote.is_type("drive"));
    }

    #[test]
    fn catalog_names_are_cached() {
        let runner = MockRunner::default();
        runner.set_output(&["listremotes"], Ok("b:\na:\n"));
        let mut catalog = RemoteCatalog::default();
        assert_eq!(catalog.names(&runner).unwrap(), ["a", "b"]);
        assert_eq!(catalog.names(&runner).unwrap(), ["a", "b"]);
        assert_eq!(runner.capture_count("listremotes"), 1);
    }

    #[test]
    fn shared_companion_is_found_by_suffix() {
        let runner = MockRunner::default();
        runner.set_output(&["listremotes"], Ok("gdrive:\ngdrive-shared:\nmega:\n"));
        let mut catalog = RemoteCatalog::default();
        assert_eq!(
            catalog.shared_companion(&runner, "gdrive:").unwrap().as_deref(),
            Some("gdrive-shared")
        );
        assert_eq!(catalog.shared_companion(&runner, "mega").unwrap(), None);
        assert_eq!(runner.capture_count("listremotes"), 1);
    }

    #[test]
    fn tool_check_surfaces_missing_binary() {
        let runner = MockRunner::default();
        runner.set_missing(true);
        assert!(matches!(check_tool(&runner), Err(Error::ToolNotFound { .. })));
    }
}
