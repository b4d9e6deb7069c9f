//! `gather` binary: one subcommand per activity source.
//!
//! Each subcommand takes the same positional window/output/log arguments plus
//! a few source-specific selectors, runs the matching collector once, and
//! exits 0 or 1 per the shared outcome contract.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use activity_harness::collector_chat::ChatCollector;
use activity_harness::collector_docs::DocsCollector;
use activity_harness::collector_issues::IssuesCollector;
use activity_harness::collector_mail::MailCollector;
use activity_harness::models::{CollectionRequest, DateRange, EnvVars, Source, SourceFilter};
use activity_harness::runner;
use activity_harness::traits::Collector;

#[derive(Parser)]
#[command(
    name = "gather",
    about = "Collect team activity from mail, documents, issues, and chat into normalized JSON digests",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Gather meeting-notes emails from Gmail
    Mail {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Gather matching Google Docs with content previews
    Docs {
        #[command(flatten)]
        common: CommonArgs,

        /// Full-text term the documents must contain
        #[arg(index = 5, default_value = "cog")]
        search_term: String,
    },

    /// Gather recently active Jira issues for a project
    Issues {
        #[command(flatten)]
        common: CommonArgs,

        /// Project key to search
        #[arg(index = 5, default_value = "RHDPOPS")]
        project: String,

        /// Comma-separated team members (assignee-or-reporter filter)
        #[arg(index = 6, default_value = "")]
        members: String,
    },

    /// Gather Slack messages from an explicit channel list
    Chat {
        #[command(flatten)]
        common: CommonArgs,

        /// Comma-separated channel ids to read
        #[arg(index = 5, default_value = "")]
        channels: String,

        /// Comma-separated author names to keep (substring match)
        #[arg(index = 6, default_value = "")]
        authors: String,
    },
}

#[derive(clap::Args)]
struct CommonArgs {
    /// Window start date (YYYY-MM-DD)
    #[arg(index = 1)]
    start_date: Option<NaiveDate>,

    /// Window end date (YYYY-MM-DD)
    #[arg(index = 2)]
    end_date: Option<NaiveDate>,

    /// Output file path (default: <tmp>/<source>.json)
    #[arg(index = 3)]
    output: Option<PathBuf>,

    /// Directory for the per-run log file
    #[arg(index = 4, default_value = "logs")]
    log_dir: PathBuf,
}

impl Command {
    fn into_parts(self) -> (Box<dyn Collector>, CommonArgs, SourceFilter) {
        match self {
            Command::Mail { common } => (Box::new(MailCollector), common, SourceFilter::None),
            Command::Docs {
                common,
                search_term,
            } => (
                Box::new(DocsCollector),
                common,
                SourceFilter::SearchTerm(search_term),
            ),
            Command::Issues {
                common,
                project,
                members,
            } => (
                Box::new(IssuesCollector),
                common,
                SourceFilter::Project {
                    key: project,
                    members: SourceFilter::parse_list(&members),
                },
            ),
            Command::Chat {
                common,
                channels,
                authors,
            } => (
                Box::new(ChatCollector),
                common,
                SourceFilter::Channels {
                    ids: SourceFilter::parse_list(&channels),
                    authors: SourceFilter::parse_list(&authors),
                },
            ),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (collector, common, filter) = cli.command.into_parts();

    let source = collector.source();
    // Issues and chat default to the trailing seven days; resolving here
    // keeps the echoed date_range in agreement with the executed query.
    let window = DateRange::new(common.start_date, common.end_date);
    let window = match source {
        Source::Jira | Source::Slack => window.or_last_days(7),
        Source::CogEmails | Source::Gdocs => window,
    };
    let request = CollectionRequest {
        window,
        output_path: common
            .output
            .unwrap_or_else(|| std::env::temp_dir().join(source.default_output_name())),
        log_dir: common.log_dir,
        filter,
        env: EnvVars::from_process(),
    };

    match runner::run(collector.as_ref(), &request).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("gather: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
