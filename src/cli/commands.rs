use crate::detection::types::Request;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Detects devfiles, Dockerfiles and ports for the components of a Git repository
#[derive(Parser, Debug)]
#[command(
    name = "component-detection",
    about = "Detects devfiles, Dockerfiles and ports for the components of a Git repository",
    version,
    author,
    long_about = "component-detection clones a repository, finds the devfile and Dockerfile of \
                  every component (in-tree or via a devfile registry sample) and publishes the \
                  result as a keyed record."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run detection for one request",
        long_about = "Runs detection for one request given as positional arguments, in this \
                      order:\n  token namespace name contextPath devfilePath dockerfilePath \
                      repoURL revision registryURL isDevfilePresent isDockerfilePresent\n\n\
                      Empty arguments are allowed; surrounding quotes are stripped.\n\n\
                      Examples:\n  \
                      component-detection detect '' default app ./ '' '' \
                      https://github.com/devfile-samples/devfile-sample-python-basic '' '' false false"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Print a published result record",
        long_about = "Reads the result record stored for NAMESPACE/NAME and prints its decoded \
                      maps as JSON."
    )]
    Show(ShowArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "TOKEN", value_parser = parse_text, help = "Git token, empty for public repositories")]
    pub token: String,

    #[arg(value_name = "NAMESPACE", value_parser = parse_text)]
    pub namespace: String,

    #[arg(value_name = "NAME", value_parser = parse_text)]
    pub name: String,

    #[arg(value_name = "CONTEXT", value_parser = parse_text, help = "Component root inside the repository")]
    pub context_path: String,

    #[arg(value_name = "DEVFILE_PATH", value_parser = parse_text)]
    pub devfile_path: String,

    #[arg(value_name = "DOCKERFILE_PATH", value_parser = parse_text)]
    pub dockerfile_path: String,

    #[arg(value_name = "REPO_URL", value_parser = parse_text)]
    pub repo_url: String,

    #[arg(value_name = "REVISION", value_parser = parse_text, help = "Branch or commit, empty for the default branch")]
    pub revision: String,

    #[arg(value_name = "REGISTRY_URL", value_parser = parse_text, help = "Devfile registry, empty for the configured one")]
    pub registry_url: String,

    #[arg(value_name = "IS_DEVFILE_PRESENT", action = ArgAction::Set, value_parser = parse_flag)]
    pub is_devfile_present: bool,

    #[arg(value_name = "IS_DOCKERFILE_PRESENT", action = ArgAction::Set, value_parser = parse_flag)]
    pub is_dockerfile_present: bool,

    #[arg(long, help = "Do not publish a result record, only print the outcome")]
    pub no_result_record: bool,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for result records (overrides DETECTOR_RESULT_DIR)"
    )]
    pub result_dir: Option<PathBuf>,
}

impl DetectArgs {
    pub fn to_request(&self) -> Request {
        let optional = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());

        Request {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            repo_url: self.repo_url.clone(),
            revision: optional(&self.revision),
            context_path: if self.context_path.is_empty() {
                "./".to_string()
            } else {
                self.context_path.clone()
            },
            devfile_registry_url: self.registry_url.clone(),
            git_token: optional(&self.token),
            create_result_record: !self.no_result_record,
            devfile_path: optional(&self.devfile_path),
            dockerfile_path: optional(&self.dockerfile_path),
            is_devfile_present: self.is_devfile_present,
            is_dockerfile_present: self.is_dockerfile_present,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    #[arg(value_name = "NAMESPACE", value_parser = parse_text)]
    pub namespace: String,

    #[arg(value_name = "NAME", value_parser = parse_text)]
    pub name: String,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory for result records (overrides DETECTOR_RESULT_DIR)"
    )]
    pub result_dir: Option<PathBuf>,
}

/// Trim whitespace and one pair of surrounding quotes.
pub fn strip_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim();
        }
    }
    trimmed
}

fn parse_text(value: &str) -> Result<String, String> {
    Ok(strip_quotes(value).to_string())
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match strip_quotes(value).to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(format!("Invalid boolean: {}. Expected true or false", other)),
    }
}
