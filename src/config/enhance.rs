use anyhow::Result;

/// Expand environment variables in settings text.
/// Supports `${VAR}`, `${VAR:-default}` and `$VAR`; undefined variables expand to nothing.
pub fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                expr.push(c);
            }
            result.push_str(&lookup(&expr));
            continue;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            result.push('$');
        } else {
            result.push_str(&lookup(&name));
        }
    }
    result
}

fn lookup(expr: &str) -> String {
    match expr.split_once(":-") {
        Some((name, default)) => match std::env::var(name) {
            Ok(val) if !val.is_empty() => val,
            _ => default.to_string(),
        },
        None => std::env::var(expr).unwrap_or_default(),
    }
}

/// Inline `!include path` lines, resolved relative to `base_dir`.
pub fn process_includes(content: &str, base_dir: &str) -> Result<String> {
    let mut result = String::new();
    for line in content.lines() {
        let Some(path) = line.trim().strip_prefix("!include ") else {
            result.push_str(line);
            result.push('\n');
            continue;
        };
        let path = path.trim();
        let full_path = if std::path::Path::new(path).is_absolute() {
            path.to_string()
        } else {
            format!("{}/{}", base_dir, path)
        };
        let included = std::fs::read_to_string(&full_path)
            .map_err(|e| anyhow::anyhow!("failed to include '{}': {}", full_path, e))?;
        result.push_str(&included);
        result.push('\n');
    }
    Ok(result)
}
