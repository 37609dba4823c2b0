//! Source-group selection: wildcard matching over slash-separated group
//! paths, one glob segment per nesting level.

use cfgtree::ConfigFile;
use glob::Pattern;

/// Splits a slash-separated group path into its segments.
pub fn path_segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group paths matching `pattern`, level by level. Each segment of the
/// pattern is a wildcard matched against the group names at that depth.
pub fn select_components(config: &ConfigFile, pattern: &str) -> Result<Vec<Vec<String>>, String> {
    let segments = path_segments(pattern);
    if segments.is_empty() {
        return Err("empty source component pattern".to_string());
    }
    let patterns: Vec<Pattern> = segments
        .iter()
        .map(|segment| Pattern::new(segment).map_err(|e| format!("bad pattern {:?}: {}", segment, e)))
        .collect::<Result<_, _>>()?;

    let mut pool: Vec<Vec<String>> = config
        .root()
        .group_names()
        .into_iter()
        .map(|name| vec![name])
        .collect();

    for (depth, pattern) in patterns.iter().enumerate() {
        let mut matched: Vec<Vec<String>> = Vec::new();
        for path in &pool {
            let name = path.last().expect("paths are non-empty");
            if pattern.matches(name) {
                matched.push(path.clone());
            }
        }
        if depth == patterns.len() - 1 {
            return Ok(matched);
        }
        // Descend: the next level's candidates are the children of this
        // level's matches.
        pool = Vec::new();
        for path in matched {
            let segments: Vec<&str> = path.iter().map(String::as_str).collect();
            let Some(group) = config.group_at(&segments) else {
                continue;
            };
            for child in group.group_names() {
                let mut next = path.clone();
                next.push(child);
                pool.push(next);
            }
        }
    }
    Ok(Vec::new())
}
