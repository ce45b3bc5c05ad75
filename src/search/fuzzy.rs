use anyhow::{Context, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::io::{self, BufRead, Write};
use std::process::{Command, Stdio};

const MAX_SHOWN: usize = 10;
/// Score lead at which the best match is taken without asking.
const CLEAR_WINNER_MARGIN: i64 = 100;

/// Lets the user pick one snippet reference, via fzf when installed.
pub fn pick(options: &[String]) -> Result<String> {
    if options.is_empty() {
        anyhow::bail!("No snippets available");
    }
    match try_fzf(options) {
        Ok(selected) => Ok(selected),
        Err(e) => {
            tracing::debug!(error = %e, "fzf unavailable, using built-in picker");
            interactive_pick(options)
        }
    }
}

/// Options matching `query`, best first.
pub fn rank<'a>(options: &'a [String], query: &str) -> Vec<(i64, &'a String)> {
    let matcher = SkimMatcherV2::default();
    let mut matches: Vec<(i64, &String)> = options
        .iter()
        .filter_map(|option| matcher.fuzzy_match(option, query).map(|score| (score, option)))
        .collect();
    matches.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    matches
}

fn try_fzf(options: &[String]) -> Result<String> {
    let mut child = Command::new("fzf")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .context("fzf not available")?;

    if let Some(mut stdin) = child.stdin.take() {
        for option in options {
            writeln!(stdin, "{option}")?;
        }
    }

    let output = child.wait_with_output()?;
    // 130: cancelled with ESC
    if output.status.code() == Some(130) {
        anyhow::bail!("Selection cancelled");
    }
    if !output.status.success() {
        anyhow::bail!("fzf exited with error");
    }

    let selected = String::from_utf8(output.stdout)?.trim().to_string();
    if selected.is_empty() {
        anyhow::bail!("No selection made");
    }
    Ok(selected)
}

fn interactive_pick(options: &[String]) -> Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stderr = io::stderr();

    loop {
        eprint!("Search: ");
        stderr.flush()?;
        let query = read_line(&mut input)?;
        if query.is_empty() {
            continue;
        }

        let matches = rank(options, &query);
        if matches.is_empty() {
            eprintln!("No matches found. Try again.");
            continue;
        }

        eprintln!("\nMatches:");
        for (i, (_, option)) in matches.iter().take(MAX_SHOWN).enumerate() {
            eprintln!("  {}. {}", i + 1, option);
        }

        if matches.len() == 1 || matches[0].0 - matches[1].0 > CLEAR_WINNER_MARGIN {
            return Ok(matches[0].1.clone());
        }

        let shown = matches.len().min(MAX_SHOWN);
        eprint!("\nSelect (1-{shown}): ");
        stderr.flush()?;
        match read_line(&mut input)?.parse::<usize>() {
            Ok(n) if (1..=shown).contains(&n) => return Ok(matches[n - 1].1.clone()),
            _ => eprintln!("Invalid selection. Try again.\n"),
        }
    }
}

fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        anyhow::bail!("Selection cancelled");
    }
    Ok(line.trim().to_string())
}
