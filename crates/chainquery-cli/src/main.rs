//! ChainQuery CLI
//!
//! Asks the query pipeline what API request answers an on-chain question
//! and prints it. Results go to stdout; logs go to stderr.

mod output;

use std::io::{self, BufRead, Write};

use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chainquery_core::{ChainQueryConfig, QueryAssembler};

use crate::output::{render, SAMPLE_PROMPTS};

#[derive(Parser, Debug)]
#[command(name = "chainquery", version, about = "Turn on-chain questions into API requests")]
struct Cli {
    /// Natural language question
    #[arg(short, long)]
    prompt: Option<String>,

    /// Read questions from stdin until `quit`
    #[arg(short, long)]
    interactive: bool,

    /// Print the request descriptor as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chainquery=info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ChainQueryConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using default configuration");
        ChainQueryConfig::default()
    });

    let assembler = QueryAssembler::from_config(&config);
    tracing::info!(ai_enabled = assembler.is_ai_enabled(), "Query pipeline ready");

    let mut stdout = io::stdout();

    if cli.interactive {
        writeln!(stdout, "Blockchain query assistant (interactive mode)")?;
        writeln!(stdout, "Type 'quit' to exit\n")?;
        writeln!(stdout, "Sample prompts:")?;
        for (i, sample) in SAMPLE_PROMPTS.iter().enumerate() {
            writeln!(stdout, "{}. {}", i + 1, sample)?;
        }
        writeln!(stdout)?;
        stdout.flush()?;

        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(error = %e, "Error reading stdin");
                    continue;
                }
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
                break;
            }

            let rendered = render(question, assembler.build_query(question).as_ref(), cli.json)?;
            writeln!(stdout, "{}\n", rendered)?;
            stdout.flush()?;
        }
    } else if let Some(prompt) = cli.prompt.as_deref() {
        let rendered = render(prompt, assembler.build_query(prompt).as_ref(), cli.json)?;
        writeln!(stdout, "{}", rendered)?;
    } else {
        Cli::command().print_help()?;
    }

    Ok(())
}
