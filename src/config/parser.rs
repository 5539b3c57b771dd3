//! Minimal INI-style parser feeding [`Graph`] (§4.10).
//!
//! `[section]` headers, `key = value` or `key: value` pairs, `#`/`;`
//! comment lines, blank lines ignored. No interpolation, no nesting —
//! deliberately simpler than a full INI grammar since the descriptor
//! schemas (§4.8, §4.10) never need more.

// Layer 3: Internal module imports
use super::error::ConfigError;
use super::graph::Graph;

pub fn parse(text: &str) -> Result<Graph, ConfigError> {
    let mut graph = Graph::new();
    let mut current_section: Option<String> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix('[') {
            let name = stripped
                .strip_suffix(']')
                .ok_or_else(|| malformed(idx, raw_line))?
                .trim()
                .to_string();
            current_section = Some(name);
            continue;
        }
        let (key, value) = split_pair(line).ok_or_else(|| malformed(idx, raw_line))?;
        let section = current_section.as_deref().unwrap_or("main");
        graph.set(section, key.trim(), value.trim());
    }

    Ok(graph)
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    line.split_once('=').or_else(|| line.split_once(':'))
}

fn malformed(line: usize, text: &str) -> ConfigError {
    ConfigError::Malformed {
        path: std::path::PathBuf::new(),
        line: line + 1,
        text: text.to_string(),
    }
}
