use std::env;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use jr_common::matching::{evaluate_batch, AccuracyReport, MatchConfig, MatchEngine, MatchReport};
use jr_common::normalize::correct_job_type;
use jr_common::providers::{JSearchProvider, JobProvider, TheirStackProvider};
use jr_common::{CandidateJob, SearchCriteria};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Provider {
    Jsearch,
    Theirstack,
}

/// Fetches live results for one canonical search and tabulates how the
/// relevance matcher grades them, field by field.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jr-accuracy",
    about = "Scores live provider results against a canonical search"
)]
struct Cli {
    /// Provider to fetch from
    #[arg(long, value_enum, default_value = "jsearch")]
    provider: Provider,

    /// Job title criterion
    #[arg(long, default_value = "Software Engineer")]
    title: String,

    /// Industry criterion
    #[arg(long, default_value = "Technology")]
    industry: String,

    /// Salary range criterion
    #[arg(long, default_value = "$80,000 - $100,000")]
    salary: String,

    /// Work arrangement: Remote | On site | Hybrid
    #[arg(long, default_value = "Remote")]
    job_type: String,

    /// City criterion
    #[arg(long, default_value = "San Francisco")]
    city: String,

    /// State criterion
    #[arg(long, default_value = "CA")]
    state: String,

    /// Country criterion
    #[arg(long, default_value = "US")]
    country: String,

    /// Date-posted window: day | week | month | all
    #[arg(long, default_value = "week")]
    date_posted: String,

    /// Provider pages to fetch
    #[arg(long, default_value_t = 2)]
    pages: u32,

    /// Score bound for the strong-match bucket
    #[arg(long, env = "JR_MIN_SCORE_THRESHOLD", default_value_t = 80.0)]
    threshold: f64,
}

impl Cli {
    fn criteria(&self) -> SearchCriteria {
        SearchCriteria {
            title: self.title.clone(),
            industry: Some(self.industry.clone()),
            salary_range: Some(self.salary.clone()),
            location_city: Some(self.city.clone()),
            location_state: Some(self.state.clone()),
            country: Some(self.country.clone()),
            date_posted: Some(self.date_posted.clone()),
            job_type: correct_job_type(&self.job_type),
        }
    }
}

fn build_provider(
    choice: Provider,
    client: reqwest::Client,
) -> Result<Box<dyn JobProvider>, String> {
    match choice {
        Provider::Jsearch => {
            let key =
                env::var("RAPID_API_KEY").map_err(|_| "RAPID_API_KEY is not set".to_string())?;
            Ok(Box::new(JSearchProvider::new(client, key)))
        }
        Provider::Theirstack => {
            let key = env::var("THEIRSTACK_API_KEY")
                .map_err(|_| "THEIRSTACK_API_KEY is not set".to_string())?;
            Ok(Box::new(TheirStackProvider::new(client, key)))
        }
    }
}

fn grade(percent: f64) -> &'static str {
    if percent >= 80.0 {
        "✓"
    } else if percent >= 50.0 {
        "⚠"
    } else {
        "✗"
    }
}

/// One column per field matcher: hit, miss, or not applicable.
fn check_columns(report: &MatchReport) -> String {
    report
        .checks()
        .into_iter()
        .map(|(_, check)| {
            if !check.is_applicable() {
                '-'
            } else if check.is_match() {
                '+'
            } else {
                'x'
            }
        })
        .collect()
}

fn print_report(criteria: &SearchCriteria, jobs: &[CandidateJob], report: &AccuracyReport) {
    println!(
        "Scored {} jobs against \"{}\"",
        report.job_count(),
        criteria.title
    );
    println!();

    println!(
        "{:<12} {:>8} {:>11} {:>9}",
        "field", "matched", "applicable", "accuracy"
    );
    for field in &report.fields {
        println!(
            "{:<12} {:>8} {:>11} {:>8.1}% {}",
            field.field,
            field.matched,
            field.applicable,
            field.percent(),
            grade(field.percent()),
        );
    }
    println!();

    println!("fields: T=title I=industry S=salary J=job_type L=location C=country D=date_posted");
    for (job, result) in jobs.iter().zip(&report.reports) {
        println!(
            "{:>5.1} [{}] {} @ {}",
            result.score,
            check_columns(result),
            job.title,
            job.company,
        );
    }
    println!();

    println!(
        "perfect: {}/{}  strong (>={:.0}): {}/{}  overall: {:.1}%",
        report.perfect_matches,
        report.job_count(),
        report.strong_threshold,
        report.strong_matches,
        report.job_count(),
        report.overall(),
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let criteria = cli.criteria();

    let client = match reqwest::Client::builder().build() {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to build http client");
            return ExitCode::FAILURE;
        }
    };

    let provider = match build_provider(cli.provider, client) {
        Ok(provider) => provider,
        Err(message) => {
            error!(%message, "provider is not configured");
            return ExitCode::FAILURE;
        }
    };

    let jobs = match provider.fetch(&criteria, cli.pages).await {
        Ok(jobs) => jobs,
        Err(err) => {
            error!(error = %err, provider = provider.name(), "fetch failed");
            return ExitCode::FAILURE;
        }
    };

    let engine = MatchEngine::new(MatchConfig {
        min_score_threshold: cli.threshold,
        ..MatchConfig::from_env()
    });
    let report = evaluate_batch(&engine, &criteria, &jobs, Utc::now());
    print_report(&criteria, &jobs, &report);

    ExitCode::SUCCESS
}
