//! Catalog of resource descriptors
//!
//! Descriptors come from the built-in CRDs and from CRD manifests on disk.
//! Files may hold several YAML documents; documents that are not
//! `CustomResourceDefinition`s are skipped.

mod descriptor;

pub use descriptor::ResourceDescriptor;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Configuration;
use crate::crd;
use crate::{Error, Result};

const CRD_KIND: &str = "CustomResourceDefinition";

/// Ordered set of descriptors, unique by group, version and kind
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    descriptors: Vec<ResourceDescriptor>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding only the built-in CRDs
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for definition in crd::builtin_crds() {
            catalog.add_crd(&definition)?;
        }
        Ok(catalog)
    }

    /// Catalog described by the provider configuration
    pub fn from_configuration(config: &Configuration) -> Result<Self> {
        let mut catalog = if config.include_builtin {
            Self::builtin()?
        } else {
            Self::new()
        };
        for path in &config.crd_paths {
            let added = catalog.load_path(path)?;
            info!("Loaded {} resource version(s) from {:?}", added, path);
        }
        Ok(catalog)
    }

    /// Add every served version of a CRD, returning how many were added
    pub fn add_crd(&mut self, definition: &CustomResourceDefinition) -> Result<usize> {
        let descriptors = ResourceDescriptor::from_crd(definition)?;
        let added = descriptors.len();
        for descriptor in descriptors {
            if self.descriptors.iter().any(|d| d.same_gvk(&descriptor)) {
                return Err(Error::CatalogError(format!(
                    "{} {} is defined more than once",
                    descriptor.api_version(),
                    descriptor.kind
                )));
            }
            debug!("Registered {} {}", descriptor.api_version(), descriptor.kind);
            self.descriptors.push(descriptor);
        }
        Ok(added)
    }

    /// Load a CRD file, or every `.yaml`/`.yml` file below a directory
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        if path.is_dir() {
            let mut added = 0;
            for file in yaml_files(path)? {
                added += self.load_file(&file)?;
            }
            Ok(added)
        } else {
            self.load_file(path)
        }
    }

    fn load_file(&mut self, path: &Path) -> Result<usize> {
        let contents = fs::read_to_string(path).map_err(|source| Error::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |source| Error::ParseError {
            path: path.to_path_buf(),
            source,
        };

        let mut added = 0;
        for document in serde_yaml::Deserializer::from_str(&contents) {
            let value = serde_yaml::Value::deserialize(document).map_err(parse_error)?;
            if value.get("kind").and_then(|k| k.as_str()) != Some(CRD_KIND) {
                debug!("Skipping non-CRD document in {:?}", path);
                continue;
            }
            let definition: CustomResourceDefinition =
                serde_yaml::from_value(value).map_err(parse_error)?;
            added += self.add_crd(&definition)?;
        }
        Ok(added)
    }

    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source| Error::IoError {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            files.extend(yaml_files(&path)?);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        ) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WIDGET_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com
spec:
  group: example.com
  names:
    kind: Widget
    plural: widgets
  scope: Namespaced
  versions:
    - name: v1alpha1
      served: false
      storage: false
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              required: [size]
              properties:
                size:
                  type: integer
                  minimum: 1
                colorName:
                  type: string
                  enum: [red, blue]
"#;

    const CONFIG_MAP: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: unrelated
data:
  key: value
"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn builtin_catalog_is_not_empty() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), crd::builtin_crds().len());
    }

    #[test]
    fn loads_served_versions_and_skips_other_documents() {
        let dir = tempfile::tempdir().unwrap();
        let contents = format!("---\n{}\n---\n{}", CONFIG_MAP, WIDGET_CRD);
        let path = write(dir.path(), "widgets.yaml", &contents);

        let mut catalog = Catalog::new();
        assert_eq!(catalog.load_path(&path).unwrap(), 1);
        let widget = &catalog.descriptors()[0];
        assert_eq!(widget.api_version(), "example.com/v1");
        assert!(widget.spec.as_ref().unwrap().get("color_name").is_some());
    }

    #[test]
    fn loads_directories_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        write(&nested, "widgets.yml", WIDGET_CRD);
        write(dir.path(), "README.md", "not yaml");

        let mut catalog = Catalog::new();
        assert_eq!(catalog.load_path(dir.path()).unwrap(), 1);
    }

    #[test]
    fn duplicate_definitions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "widgets.yaml", WIDGET_CRD);

        let mut catalog = Catalog::new();
        catalog.load_path(&path).unwrap();
        let err = catalog.load_path(&path).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let mut catalog = Catalog::new();
        let err = catalog
            .load_path(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError { .. }));
    }

    #[test]
    fn malformed_files_are_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "broken.yaml",
            "kind: CustomResourceDefinition\nspec: [unclosed",
        );
        let err = Catalog::new().load_path(&path).unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }
}
