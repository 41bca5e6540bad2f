// ─── Launch Arguments ───
// `${...}` placeholder substitution for JVM and game arguments.

use std::collections::BTreeMap;

use tracing::debug;

/// Values for `${name}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct LaunchVariables(BTreeMap<String, String>);

impl LaunchVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Replaces every known placeholder. `None` when any placeholder is left
    /// unresolved.
    pub fn expand(&self, raw: &str) -> Option<String> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}')?;
            out.push_str(self.get(&after[..end])?);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Some(out)
    }
}

/// JVM arguments with placeholders substituted.
///
/// Classpath switches are dropped together with their value; the caller
/// injects its own classpath.
pub fn substitute_jvm_args(raw: &[String], vars: &LaunchVariables) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        let arg = &raw[i];
        if arg == "-cp" || arg == "-classpath" || arg == "--class-path" {
            i += 2;
            continue;
        }
        push_expanded(&mut out, arg, vars);
        i += 1;
    }
    out
}

pub fn substitute_game_args(raw: &[String], vars: &LaunchVariables) -> Vec<String> {
    let mut out = Vec::new();
    for arg in raw {
        push_expanded(&mut out, arg, vars);
    }
    out
}

/// Unresolvable arguments are skipped, together with the option flag that
/// would otherwise be left dangling.
fn push_expanded(out: &mut Vec<String>, arg: &str, vars: &LaunchVariables) {
    match vars.expand(arg) {
        Some(resolved) => out.push(resolved),
        None => {
            debug!("Dropping unresolved argument {:?}", arg);
            if out.last().is_some_and(|last| last.starts_with('-')) {
                out.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> LaunchVariables {
        let mut vars = LaunchVariables::new();
        vars.set("natives_directory", "/tmp/natives")
            .set("classpath", "/tmp/a.jar")
            .set("auth_player_name", "Steve")
            .set("version_name", "1.20.1");
        vars
    }

    #[test]
    fn jvm_args_drop_classpath_and_unresolved_tokens() {
        let raw: Vec<String> = [
            "-XX:+UseG1GC",
            "-cp",
            "${classpath}",
            "-Djava.library.path=${natives_directory}",
            "--class-path",
            "/tmp/wrong.jar",
            "-Dsomething=${unknown_placeholder}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(
            substitute_jvm_args(&raw, &vars()),
            vec!["-XX:+UseG1GC", "-Djava.library.path=/tmp/natives"]
        );
    }

    #[test]
    fn game_args_drop_dangling_option_for_unresolved_value() {
        let raw: Vec<String> = [
            "--username",
            "${auth_player_name}",
            "--version",
            "${version_name}",
            "--quickPlayPath",
            "${quickPlayPath}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        assert_eq!(
            substitute_game_args(&raw, &vars()),
            vec!["--username", "Steve", "--version", "1.20.1"]
        );
    }

    #[test]
    fn expand_handles_multiple_and_unterminated_placeholders() {
        let vars = vars();
        assert_eq!(
            vars.expand("${version_name}-${auth_player_name}").as_deref(),
            Some("1.20.1-Steve")
        );
        assert_eq!(vars.expand("${version_name").as_deref(), None);
        assert_eq!(vars.expand("plain").as_deref(), Some("plain"));
    }
}
