use serde::{Deserialize, Serialize};

use super::rules::{rules_allow, Platform, PlatformRule};
use crate::core::error::LauncherResult;

/// One entry of `arguments.game` / `arguments.jvm`: either a bare string or a
/// rule-guarded value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentTemplate {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<PlatformRule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    One(String),
    Many(Vec<String>),
}

impl ArgumentTemplate {
    /// The raw values this template contributes on `platform`, placeholders
    /// left untouched.
    pub fn values_for(&self, platform: &Platform) -> LauncherResult<Vec<String>> {
        match self {
            Self::Plain(s) => Ok(vec![s.clone()]),
            Self::Conditional { rules, value } => {
                if !rules_allow(rules, platform)? {
                    return Ok(Vec::new());
                }
                Ok(match value {
                    ArgumentValue::One(s) => vec![s.clone()],
                    ArgumentValue::Many(v) => v.clone(),
                })
            }
        }
    }
}

/// Flattens a template list for one platform.
pub fn expand_templates(
    templates: &[ArgumentTemplate],
    platform: &Platform,
) -> LauncherResult<Vec<String>> {
    let mut out = Vec::new();
    for template in templates {
        out.extend(template.values_for(platform)?);
    }
    Ok(out)
}

/// Splits the pre-1.13 `minecraftArguments` string.
pub fn legacy_templates(raw: &str) -> Vec<ArgumentTemplate> {
    raw.split_whitespace()
        .map(|s| ArgumentTemplate::Plain(s.to_string()))
        .collect()
}
