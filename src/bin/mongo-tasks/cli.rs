use clap::Parser;

/// CLI arguments for mongo-tasks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML settings file (uri, database, collection names)
    #[arg(long)]
    pub config: Option<String>,

    /// MongoDB connection string; overrides the settings file
    #[arg(long, env = "MONGODB_URI")]
    pub mongo_uri: Option<String>,

    /// Database name; overrides the settings file
    #[arg(long, env = "MONGODB_DB")]
    pub db: Option<String>,

    /// Run only these task numbers (repeatable), still in catalogue order
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub only: Vec<u8>,

    /// Also run the users example first. It deletes every user.
    #[arg(long)]
    pub users_example: bool,

    /// Print each task's plan and exit without connecting
    #[arg(long)]
    pub dry_run: bool,

    /// Print each task's plan before running it
    #[arg(long)]
    pub debug: bool,
}
