//! `wlog steps`: step-through of the token stream.

use std::path::Path;

use anyhow::{Result, bail};
use wlog_core::{EngineConfig, Token, linearize, reconstruct_prefix, steps};

use super::util::load_log;

pub fn format_steps(tokens: &[Token]) -> String {
    steps(tokens)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text reconstructed by applying tokens `0..=index`.
pub fn prefix_at(tokens: &[Token], index: usize) -> Result<String> {
    if index >= tokens.len() {
        bail!(
            "token index {index} out of range (stream has {} tokens)",
            tokens.len()
        );
    }
    Ok(reconstruct_prefix(tokens, index))
}

pub fn run(path: &Path, config: &EngineConfig, index: Option<usize>) -> Result<()> {
    let log = load_log(path)?;
    let linearization = linearize(&log, config);
    match index {
        Some(index) => println!("{}", prefix_at(&linearization.tokens, index)?),
        None => println!("{}", format_steps(&linearization.tokens)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use wlog_core::{EventLog, RecordKind};

    use super::*;

    fn tokens() -> Vec<Token> {
        let mut log = EventLog::default();
        log.record(RecordKind::Text, 0, "a");
        log.record(RecordKind::Text, 100, "ab");
        log.record(RecordKind::Key, 100, "keydown: b");
        linearize(&log, &EngineConfig::default().with_pause_threshold(1.0)).tokens
    }

    #[test]
    fn test_format_steps() {
        assert_snapshot!(format_steps(&tokens()), @r"
        0 <START> | actual: | reconstructed:
        1 a | actual:a | reconstructed:a
        2 b | actual:ab | reconstructed:ab
        3 <END> | actual:ab | reconstructed:ab
        ");
    }

    #[test]
    fn test_prefix_at_bounds() {
        let tokens = tokens();
        assert_eq!(prefix_at(&tokens, 1).unwrap(), "a");
        assert!(prefix_at(&tokens, 4).is_err());
    }
}
