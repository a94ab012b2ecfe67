use derive_more::{Display, From};
use regex::Regex;
use serde::Deserialize;
use serde_valid::yaml::FromYamlStr;
use serde_valid::Validate;

const MONGO_URL_PATTERN: &str = r"^mongodb(\+srv)?://[-a-zA-Z0-9@:%._\+~#=/,?&]{1,256}$";

// Config Type
#[derive(Debug, Clone)]
pub struct Config {
    // Infra Dependencies
    pub infra: InfraConfig,
    // Database and collection names
    pub database: DatabaseConfig,
    // Sequences to run, in declaration order
    pub jobs: Vec<JobConfig>,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&config_file_content)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        let mut jobs = Vec::with_capacity(raw_config.jobs.len());
        for raw_job in raw_config.jobs {
            let job = match raw_job.operation {
                Operation::UpdateUserAge => {
                    let age = raw_job.age.ok_or_else(|| ConfigError::MissingAge(raw_job.name.clone()))?;
                    Job::UpdateUserAge { id: raw_job.id, age }
                }
                Operation::DeleteTask => Job::DeleteTask { id: raw_job.id },
            };
            jobs.push(JobConfig { name: raw_job.name, style: raw_job.style, job });
        }

        Ok(Config { infra: raw_config.infra, database: raw_config.database, jobs })
    }

    /// Replace the configured MongoDB url, e.g. with one taken from the environment.
    pub fn with_mongo_url(mut self, mongo_url: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(MONGO_URL_PATTERN)?;
        if !pattern.is_match(mongo_url) {
            return Err(ConfigError::InvalidMongoUrl(mongo_url.to_string()));
        }
        self.infra.mongo_url = mongo_url.to_string();
        Ok(self)
    }
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Job {} updates a user but has no age", _0)]
    #[from(ignore)]
    MissingAge(String),

    #[display("Invalid MongoDB url: {}", _0)]
    #[from(ignore)]
    InvalidMongoUrl(String),

    #[display("Regex Error: {}", _0)]
    RegexError(regex::Error),

    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

impl std::error::Error for ConfigError {}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[validate]
    pub infra: InfraConfig,
    #[validate]
    pub database: DatabaseConfig,
    #[validate]
    #[validate(min_items = 1)]
    pub jobs: Vec<RawJobConfig>,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct InfraConfig {
    // The URL of the MongoDB, same pattern as MONGO_URL_PATTERN
    #[validate(pattern = r"^mongodb(\+srv)?://[-a-zA-Z0-9@:%._\+~#=/,?&]{1,256}$")]
    pub mongo_url: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct DatabaseConfig {
    // The database holding both collections
    #[validate(min_length = 1)]
    pub name: String,
    #[validate(min_length = 1)]
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    #[validate(min_length = 1)]
    #[serde(default = "default_tasks_collection")]
    pub tasks_collection: String,
    // Which version of an updated document is handed back
    #[serde(default)]
    pub return_document: ReturnDocument,
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_tasks_collection() -> String {
    "tasks".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawJobConfig {
    #[validate(min_length = 1)]
    pub name: String,
    pub operation: Operation,
    // Hex ObjectId of the target document
    #[validate(pattern = r"^[a-fA-F0-9]{24}$")]
    pub id: String,
    // Only read for update_user_age
    #[validate(minimum = 0)]
    pub age: Option<i32>,
    #[serde(default)]
    pub style: Style,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    UpdateUserAge,
    DeleteTask,
}

#[derive(Debug, Deserialize, Display, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDocument {
    #[display("before")]
    Before,
    #[default]
    #[display("after")]
    After,
}

#[derive(Debug, Deserialize, Display, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[display("chained")]
    Chained,
    #[default]
    #[display("sequential")]
    Sequential,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Job {
    #[display("update user {} to age {}", id, age)]
    UpdateUserAge { id: String, age: i32 },
    #[display("delete task {}", id)]
    DeleteTask { id: String },
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display("{} ({}, {})", name, job, style)]
pub struct JobConfig {
    pub name: String,
    pub style: Style,
    pub job: Job,
}

#[cfg(test)]
pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, ConfigError, Job, ReturnDocument, Style};
    use crate::get_sample_config;

    const BASE: &str = r#"
infra:
    mongo_url: 'mongodb://127.0.0.1:27017'
database:
    name: task-manager-api
"#;

    #[test]
    fn test_config_parsing() {
        let config = get_sample_config();
        assert_eq!(config.jobs.len(), 4);
        assert_eq!(config.database.users_collection, "users");
        assert_eq!(config.database.return_document, ReturnDocument::After);
    }

    #[test]
    fn test_jobs_are_typed() {
        let config = format!(
            "{}{}",
            BASE,
            r#"
jobs:
  - name: update
    operation: update_user_age
    id: 6187b8997a2ae35f524c15cd
    age: 34
    style: chained
  - name: delete
    operation: delete_task
    id: 61879c818a6dcf16c13ed2be
"#
        );
        let config = Config::from_yaml_str(&config).unwrap();

        assert_eq!(
            config.jobs[0].job,
            Job::UpdateUserAge { id: "6187b8997a2ae35f524c15cd".to_string(), age: 34 }
        );
        assert_eq!(config.jobs[0].style, Style::Chained);
        assert_eq!(config.jobs[1].job, Job::DeleteTask { id: "61879c818a6dcf16c13ed2be".to_string() });
        assert_eq!(config.jobs[1].style, Style::Sequential);
        assert_eq!(config.database.tasks_collection, "tasks");
    }

    #[test]
    fn test_update_job_requires_age() {
        let config = format!(
            "{}{}",
            BASE,
            r#"
jobs:
  - name: update
    operation: update_user_age
    id: 6187b8997a2ae35f524c15cd
"#
        );
        assert!(matches!(
            Config::from_yaml_str(&config).unwrap_err(),
            ConfigError::MissingAge(name) if name == "update"
        ));
    }

    #[test]
    fn test_should_not_allow_malformed_ids() {
        let config = format!(
            "{}{}",
            BASE,
            r#"
jobs:
  - name: delete
    operation: delete_task
    id: not-an-object-id
"#
        );
        assert!(matches!(Config::from_yaml_str(&config).unwrap_err(), ConfigError::SerdeError(_)));
    }

    #[test]
    fn test_should_not_allow_empty_jobs() {
        let config = format!("{}jobs: []\n", BASE);
        assert!(matches!(Config::from_yaml_str(&config).unwrap_err(), ConfigError::SerdeError(_)));
    }

    #[test]
    fn test_should_not_allow_invalid_mongo_url() {
        for mongo_url in ["redis://x mongodb://y", "redis://localhost:6379", "mongodb://"] {
            let config = format!(
                r#"
infra:
    mongo_url: '{}'
database:
    name: task-manager-api
jobs:
  - name: delete
    operation: delete_task
    id: 61879c818a6dcf16c13ed2be
"#,
                mongo_url
            );
            assert!(
                matches!(Config::from_yaml_str(&config).unwrap_err(), ConfigError::SerdeError(_)),
                "accepted {}",
                mongo_url
            );
        }
    }

    #[test]
    fn test_yaml_and_override_accept_the_same_urls() {
        let config = format!(
            "{}{}",
            BASE.replace("mongodb://127.0.0.1:27017", "mongodb://user:pw@db.internal:27018/app?authSource=admin"),
            r#"
jobs:
  - name: delete
    operation: delete_task
    id: 61879c818a6dcf16c13ed2be
"#
        );
        let config = Config::from_yaml_str(&config).unwrap();
        let url = config.infra.mongo_url.clone();

        let config = config.with_mongo_url(&url).unwrap();
        assert_eq!(config.infra.mongo_url, url);
    }

    #[test]
    fn test_mongo_url_override() {
        let config = get_sample_config();

        let config = config.with_mongo_url("mongodb://db.internal:27018").unwrap();
        assert_eq!(config.infra.mongo_url, "mongodb://db.internal:27018");

        assert!(matches!(
            config.with_mongo_url("redis://localhost:6379").unwrap_err(),
            ConfigError::InvalidMongoUrl(_)
        ));
    }
}
