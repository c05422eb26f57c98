use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use regex::Regex;
use tokio::io::{AsyncReadExt, BufReader};

use crate::cli;
use crate::config::Config;
use crate::error::Error;
use crate::lcdb::{Store, StoreSnapshot};
use crate::models::{self, Credentials, Difficulty, InboundMessage, Platform, ReviewEntry};
use crate::srs::{self, Quality, ReviewRepository};

const MAX_CMD_LENGTH: usize = 12;

static VALID_CMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("command regex"));

struct CommandInstance<'a> {
    store: &'a Store,
    config: &'a Config,
    parameters: &'a [String],
}

pub struct Commands;
impl Commands {
    /// Runs `args` (command first, then its parameters) and returns what to print.
    pub async fn run_command(store: &Store, config: &Config, args: &[String]) -> Result<String> {
        let Some((command, parameters)) = args.split_first() else {
            return Ok(Self::get_help());
        };

        let cmd = CommandInstance { store, config, parameters };

        let result: String = match command.as_str() {
            "connect" => cmd.connect()?,
              "watch" => cmd.watch().await?,
             "submit" => cmd.submit().await?,
            "reviews" => cmd.reviews()?,
                "due" => cmd.due()?,
              "grade" => cmd.grade()?,
               "rate" => cmd.rate()?,
            "unrated" => cmd.unrated()?,
             "export" => cmd.export()?,
             "import" => cmd.import().await?,
               "help" => Self::get_help(),
            _ => {
                if Commands::is_valid_cmd(command) {
                    log::info!("User submitted unknown command: {}", command);
                    return Err(anyhow!("No such command found: {}, see `help` for commands.", command));
                } else {
                    log::info!("User submitted invalid command: {}", command);
                    return Err(anyhow!("Invalid command syntax."));
                }
            }
        };

        Ok(result)
    }
}

impl CommandInstance<'_> {
    fn parameter(&self, index: usize, usage: &str) -> Result<&str> {
        self.parameters
            .get(index)
            .map(String::as_str)
            .with_context(|| format!("Expected usage: `{usage}`"))
    }

    fn connect(&self) -> Result<String> {
        const USAGE: &str = "connect <token> <owner/repo>";
        let credentials = Credentials::new(self.parameter(0, USAGE)?, self.parameter(1, USAGE)?)?;
        self.store.save_credentials(&credentials)?;

        Ok(format!("Connected to {}.", credentials.repo))
    }

    async fn watch(&self) -> Result<String> {
        let platform: Platform = self.parameter(0, "watch <leetcode|neetcode>")?.parse()?;
        let background = cli::background(self.store, self.config);

        let synced = cli::watch(platform, self.config, &background, BufReader::new(tokio::io::stdin())).await?;
        Ok(format!("Page closed. Synced {synced} submission(s)."))
    }

    async fn submit(&self) -> Result<String> {
        let source = self.parameter(0, "submit <file|->")?;
        let message: InboundMessage = serde_json::from_str(&read_input(source).await?)
            .context("Expected a SUBMISSION_ACCEPTED message")?;

        let report = cli::background(self.store, self.config).handle(message).await?;

        let mut output = String::from("**Synced:**");
        for path in report.description_path.iter().chain([&report.solution_path]) {
            output += "\n\t";
            output += path;
        }
        Ok(output)
    }

    fn reviews(&self) -> Result<String> {
        let entries = self.store.all()?;
        Ok(list("Review schedule", &entries))
    }

    fn due(&self) -> Result<String> {
        let entries = srs::due_entries(self.store, models::now_millis())?;
        Ok(list("Due for review", &entries))
    }

    fn grade(&self) -> Result<String> {
        const USAGE: &str = "grade <slug> <again|hard|good|easy|0-5>";
        let slug = self.parameter(0, USAGE)?;
        let quality: Quality = self.parameter(1, USAGE)?.parse()?;

        let entry = srs::grade(self.store, slug, quality, models::now_millis())?;
        log::info!("Graded {slug} with quality {}", quality.value());
        Ok(format!("{entry}"))
    }

    fn rate(&self) -> Result<String> {
        const USAGE: &str = "rate <slug> <easy|medium|hard>";
        let slug = self.parameter(0, USAGE)?;
        let difficulty = match Difficulty::from_label(self.parameter(1, USAGE)?) {
            Difficulty::Unknown => return Err(anyhow!("Expected usage: `{USAGE}`")),
            difficulty => difficulty,
        };

        if !srs::rate_difficulty(self.store, slug, difficulty, models::now_millis())? {
            return Err(Error::UnknownProblem(slug.to_string()).into());
        }
        Ok(format!("Rated {slug} as {difficulty}."))
    }

    fn unrated(&self) -> Result<String> {
        let entries = srs::unrated(self.store)?;
        Ok(list("Not yet rated", &entries))
    }

    fn export(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.store.export()?)?)
    }

    async fn import(&self) -> Result<String> {
        let source = self.parameter(0, "import <file|->")?;
        let snapshot: StoreSnapshot = serde_json::from_str(&read_input(source).await?)
            .context("Expected an exported store snapshot")?;

        let added = self.store.import(snapshot)?;
        Ok(format!("Imported {added} review entries."))
    }
}

/// Non-async helpers
impl Commands {
    /// Ensures that the string slice conforms to C-like identifier regex
    fn is_valid_cmd(s: &str) -> bool {
        s.len() <= MAX_CMD_LENGTH && VALID_CMD.is_match(s)
    }

    /// Gets a help string. Should be updated after a new command is added
    pub fn get_help() -> String {
        String::from(
            r#"
**Command List:**
`connect <token> <owner/repo>`:  Store the GitHub token and repository to sync to.
`watch <leetcode|neetcode>`:  Read page events (JSON lines) from stdin and sync accepted submissions.
`submit <file|->`:  Sync a single SUBMISSION_ACCEPTED message.
`reviews`:  List every scheduled problem.
`due`:  List problems due for review.
`grade <slug> <again|hard|good|easy|0-5>`:  Record a review.
`rate <slug> <easy|medium|hard>`:  Record how hard a problem felt.
`unrated`:  List problems without a difficulty rating.
`export`:  Print the review store as JSON (without the token).
`import <file|->`:  Add review entries from an export.
`help`:  Get information on supported commands
"#,
        )
    }
}

fn list(heading: &str, entries: &[ReviewEntry]) -> String {
    if entries.is_empty() {
        return format!("**{heading}:** nothing here.");
    }
    format!("**{heading}:**\n{}", entries.iter().join("\n"))
}

/// Reads a file, or stdin for `-`.
async fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        tokio::io::stdin().read_to_string(&mut input).await?;
        Ok(input)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Could not read {source}"))
    }
}
