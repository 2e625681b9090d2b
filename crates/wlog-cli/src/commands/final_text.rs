//! `wlog final-text`: the last snapshot of each log.

use std::path::PathBuf;

use anyhow::Result;
use rayon::prelude::*;

use super::util::{display_name, load_log};

/// `(display name, final text)` per log, in input order.
pub fn final_texts(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    paths
        .par_iter()
        .map(|path| {
            let log = load_log(path)?;
            Ok((display_name(path), log.final_text().to_string()))
        })
        .collect()
}

pub fn format_final_texts(texts: &[(String, String)]) -> String {
    if let [(_, text)] = texts {
        return text.clone();
    }
    texts
        .iter()
        .map(|(name, text)| format!("== {name} ==\n{text}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn run(paths: &[PathBuf]) -> Result<()> {
    let texts = final_texts(paths)?;
    println!("{}", format_final_texts(&texts));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_text_is_printed_bare() {
        let texts = vec![("a.json".to_string(), "Hello".to_string())];
        assert_eq!(format_final_texts(&texts), "Hello");
    }

    #[test]
    fn test_multiple_texts_get_headings() {
        let texts = vec![
            ("a.json".to_string(), "One".to_string()),
            ("b.json".to_string(), "Two".to_string()),
        ];
        assert_eq!(format_final_texts(&texts), "== a.json ==\nOne\n\n== b.json ==\nTwo");
    }
}
