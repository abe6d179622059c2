use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

/// Key/value persistence handed to every game at construction.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

pub type SharedStore = Rc<dyn ScoreStore>;

/// JSON object on disk, rewritten on every `set`.
pub struct FileStore {
    path: PathBuf,
    values: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens (or prepares to create) the store at `path`. A missing file is an
    /// empty store; a file that is not a JSON string map is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("score file {} is not a JSON object of strings", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e).with_context(|| format!("reading score file {}", path.display())),
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "score store opened");
        Ok(Self {
            path,
            values: RefCell::new(values),
        })
    }

    /// Default location: next to the executable.
    pub fn default_path() -> PathBuf {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join("minicade.scores.json");
            }
        }
        PathBuf::from("minicade.scores.json")
    }

    fn write_file(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&*self.values.borrow())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl ScoreStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        if let Err(e) = self.write_file() {
            tracing::warn!(error = %e, key, "could not persist score");
        }
    }
}

/// In-memory store for tests and for running without a writable score file.
#[derive(Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Rc::new(Self::new())
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    HigherIsBetter,
    LowerIsBetter,
}

/// One game's persisted best. Read once at construction, written only when
/// beaten.
pub struct BestScore {
    key: &'static str,
    order: Order,
    value: Option<u32>,
    store: SharedStore,
}

impl BestScore {
    pub fn load(store: SharedStore, key: &'static str, order: Order) -> Self {
        let value = store.get(key).and_then(|s| s.trim().parse::<u32>().ok());
        Self { key, order, value, store }
    }

    pub fn value(&self) -> Option<u32> {
        self.value
    }

    /// Value shown in status bars (0 when nothing is recorded yet).
    pub fn shown(&self) -> u32 {
        self.value.unwrap_or(0)
    }

    pub fn beats(&self, score: u32) -> bool {
        match (self.order, self.value) {
            (Order::HigherIsBetter, _) if score == 0 => false,
            (_, None) => true,
            (Order::HigherIsBetter, Some(best)) => score > best,
            (Order::LowerIsBetter, Some(best)) => score < best,
        }
    }

    /// Records `score` if it beats the stored best. Returns `true` on a new best.
    pub fn submit(&mut self, score: u32) -> bool {
        if !self.beats(score) {
            return false;
        }
        self.value = Some(score);
        self.store.set(self.key, &score.to_string());
        tracing::info!(key = self.key, score, "new best score");
        true
    }
}
