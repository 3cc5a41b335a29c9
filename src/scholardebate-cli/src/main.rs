//! ScholarDebate CLI - AI Debate Tool
//!
//! A terminal host for scholarly debates between two language models.

use clap::Parser;
use colored::Colorize;
use scholardebate_core::config::{DebateSettings, MAX_ROUNDS, MIN_ROUNDS};
use scholardebate_core::{
    gateway, Agent, Conclusion, Config, DebateError, DebateOrchestrator, DebatePresenter,
    DebateReport, Turn,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scholardebate",
    version,
    about = "AI Debate Tool - Watch two models debate a topic",
    long_about = "A CLI tool for running scholarly debates between two models served by an OpenAI-compatible endpoint (a local model server by default)."
)]
struct Cli {
    /// The topic to debate (may also come from the config file)
    #[arg(value_name = "TOPIC")]
    topic: Option<String>,

    /// Model for agent A, who leads every round
    #[arg(short = 'a', long, value_name = "MODEL")]
    agent_a: Option<String>,

    /// Model for agent B, who answers agent A
    #[arg(short = 'b', long, value_name = "MODEL")]
    agent_b: Option<String>,

    /// Agent A argues against the topic instead of for it
    #[arg(long)]
    against: bool,

    /// Maximum number of debate rounds
    #[arg(short, long, value_name = "ROUNDS",
          value_parser = clap::value_parser!(u32).range(MIN_ROUNDS as i64..=MAX_ROUNDS as i64))]
    rounds: Option<u32>,

    /// Word ceiling per turn
    #[arg(long, value_name = "WORDS")]
    word_limit: Option<usize>,

    /// Give up on a model call after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Remove <think>-style reasoning blocks from model output
    #[arg(long)]
    strip_reasoning: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List the models the server offers and exit
    #[arg(long)]
    list_models: bool,

    /// Print the final report as JSON instead of rendering the debate
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::new("", "", ""),
    };
    apply_environment(&mut config, |key| env::var(key).ok());
    apply_flags(&cli, &mut config);

    let gateway = gateway::connect(&config.gateway)?;
    info!(api_base = %config.gateway.api_base, "using model server");

    if cli.list_models {
        for model in gateway.list_models().await? {
            println!("{}", model);
        }
        return Ok(());
    }

    if config.debate.agent_a.is_empty() || config.debate.agent_b.is_empty() {
        let available = gateway.list_models().await?;
        debug!(count = available.len(), "fetched available models");
        select_agents(&mut config.debate, &available);
    }

    let orchestrator = match DebateOrchestrator::new(&config, gateway) {
        Ok(orchestrator) => orchestrator,
        Err(DebateError::InvalidConfiguration(reason)) => {
            eprintln!("{} {}", "Error:".red().bold(), reason);
            eprintln!(
                "Usage: scholardebate \"<topic>\" -a model1 -b model2 [--rounds {}-{}]",
                MIN_ROUNDS, MAX_ROUNDS
            );
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        let mut orchestrator = orchestrator;
        let report = orchestrator.run().await?;
        println!("{}", report.to_json()?);
        return Ok(());
    }

    let (agent_a, agent_b) = orchestrator.agents();
    print_header(orchestrator.topic(), agent_a, agent_b);

    let mut orchestrator = orchestrator.with_presenter(Arc::new(ConsolePresenter));
    orchestrator.run().await?;

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Overlay API settings from the environment, read through `lookup`.
fn apply_environment(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(api_base) = lookup("OPENAI_API_BASE").or_else(|| lookup("OPENAI_BASE_URL")) {
        config.gateway.api_base = api_base;
    }
    if let Some(api_key) = lookup("OPENAI_API_KEY") {
        config.gateway.api_key = api_key;
    }
}

/// Fill in agents left unset: A takes the first listed model, B the second
/// (or the first when the server offers only one). Nothing is chosen from an
/// empty list, so validation reports the missing agent.
fn select_agents(debate: &mut DebateSettings, available: &[String]) {
    let Some(first) = available.first() else {
        return;
    };
    if debate.agent_a.is_empty() {
        debate.agent_a = first.clone();
    }
    if debate.agent_b.is_empty() {
        debate.agent_b = available.get(1).unwrap_or(first).clone();
    }
}

/// Overlay command-line flags, which win over file and environment.
fn apply_flags(cli: &Cli, config: &mut Config) {
    let debate = &mut config.debate;
    if let Some(topic) = &cli.topic {
        debate.topic = topic.clone();
    }
    if let Some(agent_a) = &cli.agent_a {
        debate.agent_a = agent_a.clone();
    }
    if let Some(agent_b) = &cli.agent_b {
        debate.agent_b = agent_b.clone();
    }
    if cli.against {
        debate.agent_a_supports = false;
    }
    if let Some(rounds) = cli.rounds {
        debate.max_rounds = rounds;
    }
    if let Some(word_limit) = cli.word_limit {
        debate.word_limit = word_limit;
    }
    if cli.strip_reasoning {
        debate.strip_reasoning = true;
    }
    if let Some(timeout) = cli.timeout {
        config.gateway.timeout_secs = Some(timeout);
    }
}

fn print_header(topic: &str, agent_a: &Agent, agent_b: &Agent) {
    println!();
    println!("{}", "═".repeat(70).bright_blue());
    println!(
        "{}",
        format!("  {} - Scholarly Debate", "ScholarDebate".bold())
            .bright_blue()
            .bold()
    );
    println!("{}", "═".repeat(70).bright_blue());
    println!();
    println!("{} {}", "Topic:".bold(), topic.bright_white());
    println!();
    for agent in [agent_a, agent_b] {
        println!(
            "  {} will present arguments {} the topic.",
            agent.model.bright_cyan(),
            agent.stance.label().yellow()
        );
    }
    println!();
    println!("{}", "─".repeat(70).dimmed());
}

/// Renders the debate to the terminal.
struct ConsolePresenter;

impl DebatePresenter for ConsolePresenter {
    fn show_round(&self, round: u32) {
        println!();
        println!("{}", format!("  Round {}", round).bright_magenta().bold());
        println!("{}", "─".repeat(70).bright_magenta());
    }

    fn show_pending(&self, agent: &Agent, _round: u32) {
        println!(
            "{} {} {}",
            "▶".bright_cyan(),
            agent.model.bright_cyan().bold(),
            format!("({})", agent.stance.display_name()).yellow()
        );
        println!("  {}", format!("Waiting for {}'s response...", agent.model).dimmed());
    }

    fn show_turn(&self, turn: &Turn) {
        println!();
        for line in textwrap(&turn.content, 66).lines() {
            println!("  {}", line);
        }
        println!();
    }

    fn show_warning(&self, message: &str) {
        println!("  {} {}", "⚠".yellow(), message.yellow());
    }

    fn show_conclusion(&self, conclusion: &Conclusion) {
        println!();
        println!("{}", "═".repeat(70).bright_blue());
        let banner = format!("  {}", conclusion);
        if conclusion.by_concession() {
            println!("{}", banner.bright_green().bold());
        } else {
            println!("{}", banner.bright_white().bold());
        }
        println!("{}", "═".repeat(70).bright_blue());
    }

    fn show_report(&self, report: &DebateReport) {
        println!();
        println!("{}", "  Debate Summary Report".bold().underline());
        println!();
        println!("Total arguments presented: {}", report.total_turns);
        println!(
            "Supporting side ({}) prevailed in {} exchanges",
            report.supporting_agent.bright_cyan(),
            report.tally.supporting_wins
        );
        println!(
            "Opposing side ({}) prevailed in {} exchanges",
            report.opposing_agent.bright_cyan(),
            report.tally.opposing_wins
        );
        println!("{} {}", "Overall assessment:".bold(), report.verdict_sentence());

        for summary in &report.summaries {
            println!();
            println!("{}", format!("Summary of {}'s Arguments", summary.agent).bold());
            for (i, argument) in summary.arguments.iter().enumerate() {
                let wrapped = textwrap(&format!("Round {}: {}", i + 1, argument), 66);
                for line in wrapped.lines() {
                    println!("  {}", line);
                }
            }
        }

        println!();
        println!("{}", "Collected Citations".bold());
        if report.citations.is_empty() {
            println!("  {}", "No citations were provided during the debate.".dimmed());
        } else {
            for citation in &report.citations {
                println!("  - {}", citation);
            }
        }
        println!();
    }
}

/// Simple text wrapping function.
fn textwrap(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line_len = 0;

    for word in text.split_whitespace() {
        if current_line_len + word.len() + 1 > width && current_line_len > 0 {
            result.push('\n');
            current_line_len = 0;
        }
        if current_line_len > 0 {
            result.push(' ');
            current_line_len += 1;
        }
        result.push_str(word);
        current_line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textwrap_breaks_long_lines() {
        let wrapped = textwrap("alpha beta gamma delta", 11);
        assert_eq!(wrapped, "alpha beta\ngamma delta");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "scholardebate",
            "Cities should ban cars",
            "-a",
            "llama3",
            "-b",
            "mistral",
            "--against",
            "--rounds",
            "3",
            "--timeout",
            "60",
        ]);
        let mut config = Config::new("", "", "");
        apply_flags(&cli, &mut config);

        assert_eq!(config.debate.topic, "Cities should ban cars");
        assert_eq!(config.debate.agent_a, "llama3");
        assert!(!config.debate.agent_a_supports);
        assert_eq!(config.debate.max_rounds, 3);
        assert_eq!(config.gateway.timeout_secs, Some(60));
        assert!(config.validate().is_ok());
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_select_agents_from_listed_models() {
        let mut config = Config::new("topic", "", "");
        select_agents(&mut config.debate, &models(&["llama3", "mistral", "qwen2"]));

        assert_eq!(config.debate.agent_a, "llama3");
        assert_eq!(config.debate.agent_b, "mistral");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_select_agents_single_model_fails_validation() {
        let mut config = Config::new("topic", "", "");
        select_agents(&mut config.debate, &models(&["llama3"]));

        assert_eq!(config.debate.agent_a, "llama3");
        assert_eq!(config.debate.agent_b, "llama3");
        assert!(matches!(
            config.validate(),
            Err(DebateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_select_agents_without_models_leaves_agents_unset() {
        let mut config = Config::new("topic", "", "");
        select_agents(&mut config.debate, &[]);

        assert!(config.debate.agent_a.is_empty());
        assert!(config.debate.agent_b.is_empty());
        assert!(matches!(
            config.validate(),
            Err(DebateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_select_agents_keeps_explicit_choice() {
        let mut config = Config::new("topic", "mistral", "");
        select_agents(&mut config.debate, &models(&["llama3", "mistral"]));

        assert_eq!(config.debate.agent_a, "mistral");
        assert_eq!(config.debate.agent_b, "mistral");
        assert!(config.validate().is_err());

        let mut config = Config::new("topic", "qwen2", "");
        select_agents(&mut config.debate, &models(&["llama3", "mistral"]));
        assert_eq!(config.debate.agent_b, "mistral");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_environment() {
        let vars = std::collections::HashMap::from([
            ("OPENAI_BASE_URL", "http://gpu:8000/v1"),
            ("OPENAI_API_KEY", "sk-local"),
        ]);
        let mut config = Config::new("topic", "a", "b");
        apply_environment(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.gateway.api_base, "http://gpu:8000/v1");
        assert_eq!(config.gateway.api_key, "sk-local");
    }

    #[test]
    fn test_apply_environment_prefers_api_base_and_keeps_defaults() {
        let vars = std::collections::HashMap::from([
            ("OPENAI_API_BASE", "http://primary/v1"),
            ("OPENAI_BASE_URL", "http://fallback/v1"),
        ]);
        let mut config = Config::new("topic", "a", "b");
        apply_environment(&mut config, |key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.gateway.api_base, "http://primary/v1");
        assert!(config.gateway.api_key.is_empty());

        let mut config = Config::new("topic", "a", "b");
        apply_environment(&mut config, |_| None);
        assert_eq!(config.gateway.api_base, scholardebate_core::config::DEFAULT_API_BASE);
    }

    #[test]
    fn test_rounds_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["scholardebate", "t", "--rounds", "11"]).is_err());
        assert!(Cli::try_parse_from(["scholardebate", "t", "--rounds", "0"]).is_err());
    }
}
