use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    pub scylla: ScyllaConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub nodes: Vec<String>,
    pub keyspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name given to the branch every session starts with.
    pub root_branch_name: String,
    /// Label budget when a session has a single branch.
    pub label_chars: usize,
    /// Label budget once a session has branched.
    pub label_chars_multi: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            root_branch_name: "main".to_string(),
            label_chars: 20,
            label_chars_multi: 15,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        Ok(Settings {
            scylla: ScyllaConfig {
                nodes: lookup("SCYLLA_NODES")
                    .unwrap_or_else(|| "localhost:9042".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or_else(|| "thought_tree".to_string()),
                username: lookup("SCYLLA_USERNAME"),
                password: lookup("SCYLLA_PASSWORD"),
            },
            app: AppConfig {
                root_branch_name: lookup("ROOT_BRANCH_NAME")
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(defaults.root_branch_name),
                label_chars: parse_budget(&lookup, "TREE_LABEL_CHARS", defaults.label_chars)?,
                label_chars_multi: parse_budget(
                    &lookup,
                    "TREE_LABEL_CHARS_MULTI",
                    defaults.label_chars_multi,
                )?,
            },
        })
    }
}

fn parse_budget<F>(lookup: &F, key: &str, default: usize) -> Result<usize, String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => Err(format!("Invalid {}: must be greater than zero", key)),
            Ok(value) => Ok(value),
            Err(e) => Err(format!("Invalid {}: {}", key, e)),
        },
    }
}
