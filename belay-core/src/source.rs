// belay-core - Module sources for require
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Where `require` finds the code for a namespace.
//!
//! A [`ModuleSource`] maps a namespace name to a [`Module`]: either source
//! text to evaluate, or a native installer that populates the namespace
//! from Rust. The registry consults native modules first, then embedded
//! sources, then files on the load paths (`a.b` is found as `a/b.bel`).

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::namespace::Namespace;

/// File extension for namespace source files.
pub const SOURCE_EXTENSION: &str = "bel";

/// Installs Rust-defined vars into a freshly required namespace.
pub type NativeModule = Rc<dyn Fn(&Namespace) -> Result<()>>;

/// The code behind a namespace.
#[derive(Clone)]
pub enum Module {
    /// Source text; `origin` names where it came from for diagnostics.
    Source { origin: String, text: Rc<str> },
    Native(NativeModule),
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Module::Source { origin, .. } => write!(f, "Module::Source({})", origin),
            Module::Native(_) => write!(f, "Module::Native"),
        }
    }
}

/// Something that can provide the module for a namespace.
pub trait ModuleSource {
    /// Return the module for `ns_name`, or `None` if this source doesn't
    /// have it.
    fn locate(&self, ns_name: &str) -> Result<Option<Module>>;
}

/// Native modules keyed by namespace name.
#[derive(Default)]
pub struct NativeModules {
    modules: HashMap<String, NativeModule>,
}

impl NativeModules {
    pub fn insert(&mut self, ns_name: &str, installer: NativeModule) {
        self.modules.insert(ns_name.to_string(), installer);
    }
}

impl ModuleSource for NativeModules {
    fn locate(&self, ns_name: &str) -> Result<Option<Module>> {
        Ok(self.modules.get(ns_name).cloned().map(Module::Native))
    }
}

/// Source text registered in memory.
#[derive(Default)]
pub struct EmbeddedSources {
    sources: HashMap<String, Rc<str>>,
}

impl EmbeddedSources {
    pub fn insert(&mut self, ns_name: &str, text: Rc<str>) {
        self.sources.insert(ns_name.to_string(), text);
    }
}

impl ModuleSource for EmbeddedSources {
    fn locate(&self, ns_name: &str) -> Result<Option<Module>> {
        Ok(self.sources.get(ns_name).map(|text| Module::Source {
            origin: format!("<embedded {}>", ns_name),
            text: text.clone(),
        }))
    }
}

/// Source files under a list of directories.
pub struct LoadPath {
    paths: Vec<PathBuf>,
}

impl LoadPath {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        LoadPath { paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn set(&mut self, paths: Vec<PathBuf>) {
        self.paths = paths;
    }

    /// Find the file for a namespace, e.g. `mylib.utils` -> `mylib/utils.bel`.
    pub fn find_file(&self, ns_name: &str) -> Option<PathBuf> {
        let relative = format!("{}.{}", ns_name.replace('.', "/"), SOURCE_EXTENSION);
        self.paths
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|path| path.is_file())
    }
}

impl Default for LoadPath {
    fn default() -> Self {
        LoadPath::new(vec![PathBuf::from("src"), PathBuf::from("lib")])
    }
}

impl ModuleSource for LoadPath {
    fn locate(&self, ns_name: &str) -> Result<Option<Module>> {
        let Some(path) = self.find_file(ns_name) else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some(Module::Source {
            origin: path.display().to_string(),
            text: Rc::from(text),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_lookup() {
        let mut sources = EmbeddedSources::default();
        sources.insert("a.b", Rc::from("(def x 1)"));

        match sources.locate("a.b").unwrap() {
            Some(Module::Source { origin, text }) => {
                assert_eq!(origin, "<embedded a.b>");
                assert_eq!(&*text, "(def x 1)");
            }
            other => panic!("unexpected module: {:?}", other),
        }
        assert!(sources.locate("a.c").unwrap().is_none());
    }

    #[test]
    fn test_load_path_maps_dots_to_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mylib")).unwrap();
        std::fs::write(dir.path().join("mylib/utils.bel"), "(def y 2)").unwrap();

        let load_path = LoadPath::new(vec![dir.path().join("missing"), dir.path().to_path_buf()]);
        let found = load_path.find_file("mylib.utils").unwrap();
        assert!(found.ends_with("mylib/utils.bel"));

        assert!(matches!(
            load_path.locate("mylib.utils"),
            Ok(Some(Module::Source { .. }))
        ));
        assert!(load_path.locate("mylib.other").unwrap().is_none());
    }
}
