//! Terminal chat loop.
//!
//! Reads one line per action from stdin. `/clear` resets the conversation,
//! `/pick N` resubmits the N-th offered suggestion and `/quit` exits.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use analyst_chat::{Action, ChartSeries, ChatOrchestrator, Exchange, ResultView};

const BAR_WIDTH: usize = 40;

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Quit,
    Action(Action),
    Skip,
    Invalid(String),
}

/// Interpret one line typed by the user.
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Skip;
    }

    match line.split_once(char::is_whitespace) {
        _ if line == "/quit" || line == "/exit" => Input::Quit,
        _ if line == "/clear" => Input::Action(Action::ClearHistory),
        Some(("/pick", arg)) => match arg.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Input::Action(Action::SelectSuggestion(n - 1)),
            _ => Input::Invalid(format!("not a suggestion number: {}", arg.trim())),
        },
        _ if line == "/pick" => Input::Invalid("usage: /pick N".to_string()),
        _ if line.starts_with('/') => Input::Invalid(format!("unknown command: {}", line)),
        _ => Input::Action(Action::Ask(line.to_string())),
    }
}

/// Text shown for one answered question.
pub fn render_exchange(exchange: &Exchange) -> String {
    let mut out = String::new();
    if !exchange.answer.is_empty() {
        let _ = writeln!(out, "{}", exchange.answer);
    }

    for inspection in &exchange.inspections {
        if let Some(ref statement) = inspection.statement {
            let _ = writeln!(out, "\nSQL:\n{}", statement);
        }
        let _ = writeln!(out, "\n{}", inspection.result.to_table());
        if let ResultView::Tabs { ref series, .. } = inspection.view {
            for s in series {
                out.push('\n');
                out.push_str(&render_bars(s));
            }
        }
    }

    if !exchange.suggestions.is_empty() {
        let _ = writeln!(out, "\nSuggestions (/pick N):");
        for (i, suggestion) in exchange.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
        }
    }
    out
}

/// Horizontal bar chart of one series.
pub fn render_bars(series: &ChartSeries) -> String {
    let mut out = format!("{}\n", series.name);
    let max = series
        .points
        .iter()
        .map(|(_, v)| v.abs())
        .fold(0.0_f64, f64::max);
    let label_width = series
        .points
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    for (label, value) in &series.points {
        let len = if max > 0.0 {
            ((value.abs() / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "  {:<width$} | {} {}",
            label,
            "#".repeat(len),
            value,
            width = label_width
        );
    }
    out
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run(orchestrator: ChatOrchestrator) -> std::io::Result<()> {
    let mut session = orchestrator.new_session();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("{}\n> ", session.greeting()).as_bytes())
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let output = match parse_line(&line) {
            Input::Quit => break,
            Input::Skip => String::new(),
            Input::Invalid(msg) => format!("{}\n", msg),
            Input::Action(action) => {
                let clearing = action == Action::ClearHistory;
                match orchestrator.cycle(&mut session, Some(action)).await {
                    Ok(_) if clearing => format!("{}\n", session.greeting()),
                    Ok(exchanges) => exchanges
                        .iter()
                        .map(|exchange| {
                            let mut text = String::new();
                            if exchange.question != line.trim() {
                                text.push_str(&format!("> {}\n", exchange.question));
                            }
                            text.push_str(&render_exchange(exchange));
                            text
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                    Err(e) => format!("error: {}\n", e),
                }
            }
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;
    }

    tracing::info!(session_id = %session.id, turns = session.turns().len(), "Chat ended");
    Ok(())
}
