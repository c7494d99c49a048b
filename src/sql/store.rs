//! Named-query registry. Statements live in `.sql` files, each introduced by a
//! `-- name: <query_name>` marker line; the registry is built once and only read afterwards.

use crate::error::QueryError;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

const EMBEDDED: &[(&str, &str)] = &[
    ("stock_categories.sql", include_str!("queries/stock_categories.sql")),
    ("stock_sub_categories.sql", include_str!("queries/stock_sub_categories.sql")),
    ("stock_variants.sql", include_str!("queries/stock_variants.sql")),
    ("stock_items.sql", include_str!("queries/stock_items.sql")),
    ("existences.sql", include_str!("queries/existences.sql")),
    ("stock_counts.sql", include_str!("queries/stock_counts.sql")),
    ("menu_categories.sql", include_str!("queries/menu_categories.sql")),
    ("menu_sub_categories.sql", include_str!("queries/menu_sub_categories.sql")),
    ("menu_variants.sql", include_str!("queries/menu_variants.sql")),
    ("menu_ingredients.sql", include_str!("queries/menu_ingredients.sql")),
    ("settings.sql", include_str!("queries/settings.sql")),
];

fn query_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("query name pattern compiles"))
}

#[derive(Clone, Debug, Default)]
pub struct QueryStore {
    queries: HashMap<String, String>,
}

impl QueryStore {
    /// Statements compiled into the binary.
    pub fn embedded() -> Result<Self, QueryError> {
        Self::parse_sources(EMBEDDED.iter().copied())
    }

    /// Every `*.sql` file in `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self, QueryError> {
        let io_err = |path: &Path, source| QueryError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
            let path = entry.map_err(|e| io_err(dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("sql") {
                files.push(path);
            }
        }
        files.sort();
        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sources.push((file, text));
        }
        let store = Self::parse_sources(sources)?;
        tracing::info!(dir = %dir.display(), queries = store.len(), "loaded queries from directory");
        Ok(store)
    }

    /// Directory override when given, embedded statements otherwise.
    pub fn load(dir: Option<&Path>) -> Result<Self, QueryError> {
        match dir {
            Some(dir) => Self::load_dir(dir),
            None => Self::embedded(),
        }
    }

    pub fn parse_sources<I, F, T>(sources: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (F, T)>,
        F: AsRef<str>,
        T: AsRef<str>,
    {
        let mut queries = HashMap::new();
        for (file, text) in sources {
            parse_file(file.as_ref(), text.as_ref(), &mut queries)?;
        }
        Ok(QueryStore { queries })
    }

    pub fn get(&self, name: &str) -> Result<&str, QueryError> {
        self.queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| QueryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

fn marker_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("--")?.trim_start();
    Some(rest.strip_prefix("name:")?.trim())
}

struct Pending {
    name: String,
    line: usize,
    body: String,
}

fn parse_file(file: &str, text: &str, out: &mut HashMap<String, String>) -> Result<(), QueryError> {
    let malformed = |line: usize, reason: String| QueryError::Malformed {
        file: file.to_string(),
        line,
        reason,
    };
    let finish = |pending: Option<Pending>, out: &mut HashMap<String, String>| -> Result<(), QueryError> {
        let Some(p) = pending else {
            return Ok(());
        };
        let body = p.body.trim();
        let statement = body.strip_suffix(';').unwrap_or(body).trim_end();
        if statement.is_empty() {
            return Err(malformed(p.line, format!("query '{}' has no statement", p.name)));
        }
        if out.contains_key(&p.name) {
            return Err(QueryError::Duplicate {
                name: p.name,
                file: file.to_string(),
            });
        }
        out.insert(p.name, statement.to_string());
        Ok(())
    };

    let mut current: Option<Pending> = None;
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if let Some(name) = marker_name(line) {
            finish(current.take(), out)?;
            if !query_name_pattern().is_match(name) {
                return Err(malformed(line_no, format!("invalid query name '{}'", name)));
            }
            current = Some(Pending {
                name: name.to_string(),
                line: line_no,
                body: String::new(),
            });
            continue;
        }
        match current.as_mut() {
            Some(p) => {
                p.body.push_str(line);
                p.body.push('\n');
            }
            None => {
                let trimmed = line.trim();
                if !trimmed.is_empty() && !trimmed.starts_with("--") {
                    return Err(malformed(line_no, "statement text before the first '-- name:' marker".into()));
                }
            }
        }
    }
    finish(current, out)
}
