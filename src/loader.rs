use std::path::{Path, PathBuf};

use futures::future::join_all;
use log::{debug, info};
use serde_yaml::Value;
use tokio::fs::read_to_string;

use crate::assets::reference_document;
use crate::error::LoadError;
use crate::graph::ConfigGraph;
use crate::raw::{config_version, Node};
use crate::schema::{Category, CONFIG_VERSION};
use crate::validator::validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Reject documents whose version marker is not the supported version.
    pub verify_version: bool,
    /// Reject unknown top-level keys rather than skipping them.
    pub strict: bool,
    /// Lowercase every mapping key before validation.
    pub lowercase_keys: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions {
            verify_version: true,
            strict: true,
            lowercase_keys: true,
        }
    }
}

impl LoaderOptions {
    /// Options for loading a document that will be written back out, keys are
    /// kept exactly as written.
    pub fn round_trip() -> LoaderOptions {
        LoaderOptions {
            lowercase_keys: false,
            ..Default::default()
        }
    }
}

/// Parses and validates a document.
pub fn load(text: &str, options: &LoaderOptions) -> Result<ConfigGraph, LoadError> {
    let version = config_version(text);
    if options.verify_version && version != CONFIG_VERSION {
        return Err(LoadError::Version {
            found: version,
            required: CONFIG_VERSION,
        });
    }

    let mut root = Node::parse(text)?;
    if options.lowercase_keys {
        root.lowercase_keys();
    }

    match &root {
        Node::Mapping(_) | Node::Scalar(Value::Null) => {}
        other => {
            return Err(LoadError::Structure(format!(
                "expected a mapping of config sections, found {}",
                other.describe()
            )))
        }
    }

    let config = validate(&root, options.strict).map_err(LoadError::Invalid)?;
    let graph = ConfigGraph::new(version, config);

    info!(
        "Loaded {}.",
        Category::ALL
            .iter()
            .map(|c| format!("{} {}", graph.count(*c), c))
            .collect::<Vec<String>>()
            .join(", ")
    );

    Ok(graph)
}

/// Loads the reference configuration embedded in the crate.
pub fn load_reference(options: &LoaderOptions) -> Result<ConfigGraph, LoadError> {
    let text = reference_document().map_err(LoadError::Structure)?;
    load(&text, options)
}

pub async fn load_file(path: &Path, options: &LoaderOptions) -> Result<ConfigGraph, LoadError> {
    debug!("Loading file: {}", path.display());

    let text = read_to_string(path).await.map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    load(&text, options)
}

/// Loads every file concurrently. Results are in the same order as `paths`.
pub async fn load_files(
    paths: &[PathBuf],
    options: &LoaderOptions,
) -> Vec<Result<ConfigGraph, LoadError>> {
    join_all(paths.iter().map(|path| load_file(path, options))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;
    use tokio::runtime::Runtime;

    #[test]
    fn version_is_checked_first() {
        let result = load("#config_version=3\nswitches: [", &LoaderOptions::default());
        match result {
            Err(LoadError::Version { found, required }) => {
                assert_eq!(found, 3);
                assert_eq!(required, 4);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn version_check_can_be_skipped() {
        let options = LoaderOptions {
            verify_version: false,
            ..Default::default()
        };
        let graph = load("switches:\n  s_one:\n    number: 1\n", &options).unwrap();
        assert_eq!(graph.version(), 0);
        assert_eq!(graph.count(Category::Switches), 1);
    }

    #[test]
    fn key_case_follows_options() {
        let text = "#config_version=4\nSwitches:\n  S_One:\n    Number: 1\n";
        let graph = load(text, &LoaderOptions::default()).unwrap();
        assert!(graph.switch("s_one").is_some());

        let result = load(text, &LoaderOptions::round_trip());
        assert!(result.unwrap_err().validation_errors().is_some());
    }

    #[test]
    fn non_mapping_documents_are_rejected() {
        let result = load("#config_version=4\n- switches\n", &LoaderOptions::default());
        match result {
            Err(LoadError::Structure(message)) => assert!(message.ends_with("found a list")),
            other => panic!("unexpected result {:?}", other),
        }

        let result = load("#config_version=4\njust some text\n", &LoaderOptions::default());
        assert!(matches!(result, Err(LoadError::Structure(_))));
    }

    #[test]
    fn empty_document_loads() {
        let graph = load("#config_version=4\n", &LoaderOptions::default()).unwrap();
        assert!(graph.counts().values().all(|count| *count == 0));
    }

    #[test]
    fn loads_files_in_order() {
        let mut good = NamedTempFile::new().unwrap();
        write!(good, "#config_version=4\ncoils:\n  c_one:\n    number: 1\n").unwrap();
        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "#config_version=4\ncoils:\n  c_one:\n    number: x\n").unwrap();
        let missing = good.path().with_extension("missing");

        let paths = vec![
            good.path().to_owned(),
            bad.path().to_owned(),
            missing,
        ];
        let mut runtime = Runtime::new().unwrap();
        let results = runtime.block_on(load_files(&paths, &LoaderOptions::default()));

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().count(Category::Coils), 1);
        assert!(matches!(results[1], Err(LoadError::Invalid(_))));
        assert!(matches!(results[2], Err(LoadError::Io { .. })));
    }
}
