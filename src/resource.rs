use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::conductor::Session;
use crate::core::{GrainError, Result};
use crate::registry::SqlFunction;

/// Resolves resource names (fixture files, SQL scripts) to byte streams
pub trait ResourceLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Box<dyn Read + Send>>;

    fn load_string(&self, name: &str) -> Result<String> {
        let mut text = String::new();
        self.load(name)?.read_to_string(&mut text)?;
        Ok(text)
    }
}

impl<F> ResourceLoader for F
where
    F: Fn(&str) -> Result<Box<dyn Read + Send>> + Send + Sync,
{
    fn load(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        self(name)
    }
}

/// Loads resources relative to a root directory
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryLoader {
    fn load(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let path = self.root.join(name);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(GrainError::ResourceNotFound {
                kind: "resource",
                name: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Function that runs the SQL script `name` as one batch.
///
/// The script is read on every call, so edits between runs are picked up.
pub fn script(loader: Arc<dyn ResourceLoader>, name: &str) -> SqlFunction {
    let name = name.to_string();
    Arc::new(move |session: &mut Session| {
        let sql = loader.load_string(&name)?;
        log::info!("running script {name}");
        session.execute_batch(&sql)
    })
}
