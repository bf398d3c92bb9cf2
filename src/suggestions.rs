//! # Error Suggestions
//!
//! Helper functions that build user-facing errors with `hint:` lines, so a
//! failure tells the user what went wrong and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use batch_tool::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("auth-token is required");
//!
//! // Use:
//! return Err(suggestions::missing_setting("auth-token"));
//! ```

use std::path::Path;

use crate::defaults::CONFIG_ENV;

/// Generate an error for an explicitly given configuration file that does
/// not exist.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a batch-tool.yaml file in the current directory or /usr/local/etc/\n\
         hint: Use --config to specify a different path\n\
         hint: Set the {CONFIG_ENV} environment variable",
        path = path.display()
    )
}

/// Generate an error for a setting the current command needs but that is
/// empty.
pub fn missing_setting(key: &str) -> anyhow::Error {
    let (flag, env) = match key {
        "auth-token" => (Some("--auth-token"), Some("AUTH_TOKEN")),
        _ => (None, None),
    };

    let mut hints = format!("hint: Set '{key}' in batch-tool.yaml");
    if let Some(flag) = flag {
        hints.push_str(&format!("\nhint: Pass {flag} <VALUE>"));
    }
    if let Some(env) = env {
        hints.push_str(&format!("\nhint: Set the {env} environment variable"));
    }

    anyhow::anyhow!("{key} is required\n\n{hints}")
}

/// Generate an error for a catalog that could not be loaded or refreshed.
pub fn catalog_unavailable(error: &crate::error::Error) -> anyhow::Error {
    anyhow::anyhow!(
        "Could not load repository metadata: {error}\n\n\
         hint: Check that git.host and git.project point at your Bitbucket server\n\
         hint: Check that auth-token is valid (--auth-token or AUTH_TOKEN)\n\
         hint: Run 'batch-tool catalog --refresh' to rebuild the local cache"
    )
}

/// Generate an error for `git commit` without a message.
pub fn commit_message_required() -> anyhow::Error {
    anyhow::anyhow!(
        "A commit message is required for new commits\n\n\
         hint: Pass -m/--message <MESSAGE>\n\
         hint: Use -a/--amend to reuse the latest commit's message"
    )
}

/// A hint line for a label reference that matches no known label.
///
/// Returns `None` when no known label is close enough to suggest.
pub fn unknown_label(label: &str, known: &[&str]) -> Option<String> {
    find_similar(label, known).map(|s| format!("hint: Did you mean '~{s}'?"))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // single rolling row
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }

    row[b.len()]
}
