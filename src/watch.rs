use std::collections::HashSet;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::client::DirectoryService;
use crate::dashboard::{Action, Intent, Orchestrator};
use crate::models::{RiskLevel, SortOption};
use crate::render::{render_dashboard, Palette};

const HELP: &str = "commands: filter <LOW|MEDIUM|HIGH|all>, sort <risk_level|risk_level_asc|score|score_asc|default>, \
evaluate, refresh, expand <student_id>, collapse <student_id>, dismiss, help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Intent),
    Expand(String),
    Collapse(String),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?}")]
    Unknown(String),
    #[error("{command} needs an argument")]
    MissingArgument { command: &'static str },
    #[error("unknown risk level {0:?}")]
    RiskLevel(String),
    #[error("unknown sort option {0:?}")]
    SortOption(String),
}

/// Parses one line typed into the interactive session. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let command = match verb.to_ascii_lowercase().as_str() {
        "filter" => {
            let value = argument.ok_or(CommandError::MissingArgument { command: "filter" })?;
            let filter = if value.eq_ignore_ascii_case("all") {
                None
            } else {
                Some(
                    RiskLevel::parse(&value.to_ascii_uppercase())
                        .ok_or_else(|| CommandError::RiskLevel(value.to_string()))?,
                )
            };
            Command::Dispatch(Intent::SetRiskFilter(filter))
        }
        "sort" => {
            let value = argument.ok_or(CommandError::MissingArgument { command: "sort" })?;
            let sort = <SortOption as clap::ValueEnum>::from_str(value, true)
                .map_err(|_| CommandError::SortOption(value.to_string()))?;
            Command::Dispatch(Intent::SetSortOption(sort))
        }
        "evaluate" => Command::Dispatch(Intent::Evaluate),
        "refresh" => Command::Dispatch(Intent::Refresh),
        "dismiss" => Command::Dispatch(Intent::DismissError),
        "expand" => Command::Expand(
            argument
                .ok_or(CommandError::MissingArgument { command: "expand" })?
                .to_string(),
        ),
        "collapse" => Command::Collapse(
            argument
                .ok_or(CommandError::MissingArgument { command: "collapse" })?
                .to_string(),
        ),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Interactive session: stdin lines become intents, and the dashboard is
/// redrawn after every state change.
pub async fn watch<S>(dashboard: &mut Orchestrator<S>, palette: Palette) -> anyhow::Result<()>
where
    S: DirectoryService + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut expanded: HashSet<String> = HashSet::new();

    dashboard.dispatch(Action::Mount);
    draw(dashboard, &expanded, palette);
    println!("{HELP}");

    loop {
        tokio::select! {
            _ = dashboard.settle_next(), if !dashboard.is_idle() => {}
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(None) => continue,
                    Ok(Some(Command::Dispatch(intent))) => dashboard.dispatch(intent),
                    Ok(Some(Command::Expand(student_id))) => {
                        expanded.insert(student_id);
                    }
                    Ok(Some(Command::Collapse(student_id))) => {
                        expanded.remove(&student_id);
                    }
                    Ok(Some(Command::Help)) => {
                        println!("{HELP}");
                        continue;
                    }
                    Ok(Some(Command::Quit)) => break,
                    Err(error) => {
                        println!("{error}; {HELP}");
                        continue;
                    }
                }
            }
        }
        draw(dashboard, &expanded, palette);
    }

    Ok(())
}

fn draw<S>(dashboard: &Orchestrator<S>, expanded: &HashSet<String>, palette: Palette)
where
    S: DirectoryService + 'static,
{
    println!("{}", "-".repeat(60));
    print!("{}", render_dashboard(dashboard.state(), expanded, palette));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_filter_and_sort_commands() {
        assert_eq!(
            parse_command("filter high"),
            Ok(Some(Command::Dispatch(Intent::SetRiskFilter(Some(RiskLevel::High)))))
        );
        assert_eq!(
            parse_command("  filter ALL "),
            Ok(Some(Command::Dispatch(Intent::SetRiskFilter(None))))
        );
        assert_eq!(
            parse_command("sort score_asc"),
            Ok(Some(Command::Dispatch(Intent::SetSortOption(SortOption::ScoreAsc))))
        );
        assert_eq!(
            parse_command("sort default"),
            Ok(Some(Command::Dispatch(Intent::SetSortOption(SortOption::Default))))
        );
    }

    #[test]
    fn parses_session_commands() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(
            parse_command("evaluate"),
            Ok(Some(Command::Dispatch(Intent::Evaluate)))
        );
        assert_eq!(
            parse_command("expand S001"),
            Ok(Some(Command::Expand("S001".to_string())))
        );
        assert_eq!(parse_command("quit"), Ok(Some(Command::Quit)));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            parse_command("filter severe"),
            Err(CommandError::RiskLevel("severe".to_string()))
        );
        assert_eq!(
            parse_command("sort"),
            Err(CommandError::MissingArgument { command: "sort" })
        );
        assert_eq!(
            parse_command("launch"),
            Err(CommandError::Unknown("launch".to_string()))
        );
    }
}
