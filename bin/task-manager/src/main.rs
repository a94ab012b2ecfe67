use clap::Parser;
use futures_util::future::join_all;
use log::{debug, info};
use thiserror::Error;

use config::{Config, ConfigError, JobConfig};
use query_runner::{report, run_job, Repository, Task, User};
use storage::{DBError, MongoDBClient};

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Run only the job with this name
    #[arg(short, long)]
    job: Option<String>,
}

#[derive(Error, Debug)]
enum AppError {
    #[error("Failed to initialise logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Failed to load config: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to reach MongoDB: {0}")]
    Storage(#[from] DBError),

    #[error("No job named {0} in config")]
    UnknownJob(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    dotenv::dotenv().ok();
    simple_logger::SimpleLogger::new().env().init()?;

    let args = Args::parse();
    debug!("Args: {:?}", args);

    // Load configuration from yaml
    let mut config = Config::from_file(&args.config)?;
    if let Ok(mongo_url) = std::env::var("MONGODB_URL") {
        debug!("Using MongoDB url from environment");
        config = config.with_mongo_url(&mongo_url)?;
    }

    let jobs: Vec<JobConfig> = match &args.job {
        Some(name) => {
            let job = config.jobs.iter().find(|job| &job.name == name);
            vec![job.cloned().ok_or_else(|| AppError::UnknownJob(name.clone()))?]
        }
        None => config.jobs.clone(),
    };

    run(&config, &jobs).await
}

async fn run(config: &Config, jobs: &[JobConfig]) -> Result<(), AppError> {
    info!("Connecting to database {}", config.database.name);

    let user_db_provider = MongoDBClient::new(
        &config.infra.mongo_url,
        config.database.name.clone(),
        config.database.users_collection.clone(),
        config.database.return_document,
    )
    .await?;
    let task_db_provider = MongoDBClient::with_client(
        user_db_provider.client.clone(),
        config.database.name.clone(),
        config.database.tasks_collection.clone(),
        config.database.return_document,
    );
    user_db_provider.ping().await?;
    debug!(
        "Using collections {} and {}",
        user_db_provider.collection_name(),
        task_db_provider.collection_name()
    );

    let users: Repository<User, _> = Repository::new(user_db_provider);
    let tasks: Repository<Task, _> = Repository::new(task_db_provider);

    // Jobs are independent of each other and may interleave
    let results = join_all(jobs.iter().map(|job| {
        let (users, tasks) = (&users, &tasks);
        async move {
            debug!("Starting job {}", job);
            let result = run_job(users, tasks, &job.job, job.style).await;
            report(&job.name, &result);
            result.is_ok()
        }
    }))
    .await;

    let succeeded = results.iter().filter(|ok| **ok).count();
    info!("{} of {} jobs succeeded", succeeded, results.len());

    Ok(())
}
