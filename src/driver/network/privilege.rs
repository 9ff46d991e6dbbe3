use crate::errors::ScrawlError;
use regex::bytes::{
    Regex,
    RegexBuilder,
};
use std::collections::HashMap;

/// The combined prompt pattern joins every level's pattern -- with heavy char class use that
/// compiles big, so give the regex crate plenty of headroom.
const JOINED_PROMPT_REGEX_COMPILED_BYTES_LIMIT: usize = 25_000_000;

/// `PrivilegeLevel` defines a named device mode -- the pattern that matches its resting prompt,
/// its place in the privilege graph (previous/next levels and its depth), and how to traverse
/// the edges out of it.
#[derive(Clone)]
pub struct PrivilegeLevel {
    /// The name of the `PrivilegeLevel` ex: "exec".
    pub name: String,
    /// A regular expression pattern matching the resting prompt for this `PrivilegeLevel`.
    pub pattern: Regex,
    /// Sub-strings that negate a `pattern` match -- used to disambiguate levels whose prompts
    /// look alike.
    pub not_contains: Vec<String>,
    /// The name of the "previous" or "lower" `PrivilegeLevel` (empty for the root level).
    pub previous_privilege_level: String,
    /// The command typed *at* this level to de-escalate back to the previous one.
    pub deescalate: String,
    /// The name of the "next" or "higher" `PrivilegeLevel` (empty at the top of the graph, and
    /// for levels -- like named configuration sessions -- that are entered explicitly rather
    /// than on the default upward walk).
    pub next_privilege_level: String,
    /// The command typed at the *previous* level to escalate *into* this level.
    pub escalate: String,
    /// Indicates if escalating into this level requires authentication -- handled with the
    /// driver's `secondary_password`.
    pub escalate_auth: bool,
    /// The prompt pattern to expect when escalation asks for authentication.
    pub escalate_prompt: String,
    /// The depth of this level in the graph -- the root is 0. Overlapping prompt matches resolve
    /// to the deepest matching level.
    pub level: u8,
}

impl PrivilegeLevel {
    /// Returns a new `PrivilegeLevel` with the given name/pattern/depth and no graph edges --
    /// use the struct fields to wire edges up.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfiguration` error if the pattern cannot be compiled.
    pub fn new(
        name: &str,
        pattern: &str,
        level: u8,
    ) -> Result<Self, ScrawlError> {
        let compiled_pattern =
            Regex::new(pattern).map_err(|err| ScrawlError::InvalidConfiguration {
                details: format!(
                    "privilege level '{name}' pattern '{pattern}' could not be compiled, \
                    error: {err}"
                ),
            })?;

        Ok(Self {
            name: name.to_owned(),
            pattern: compiled_pattern,
            not_contains: vec![],
            previous_privilege_level: String::new(),
            deescalate: String::new(),
            next_privilege_level: String::new(),
            escalate: String::new(),
            escalate_auth: false,
            escalate_prompt: String::new(),
            level,
        })
    }

    /// Check if this privilege level matches a prompt -- the pattern must match and none of the
    /// `not_contains` strings may be present.
    #[must_use]
    pub fn matches(
        &self,
        prompt: &str,
    ) -> bool {
        if self
            .not_contains
            .iter()
            .any(|not_contained| prompt.contains(not_contained))
        {
            return false;
        }

        self.pattern.is_match(prompt.as_bytes())
    }
}

/// Validates a set of privilege levels as a graph: unique names, resolvable previous/next
/// references, no cycles in the previous/next relations, and auth-escalation edges carrying both
/// the escalation command and the auth prompt pattern.
pub(crate) fn validate_privilege_levels(
    privilege_levels: &[PrivilegeLevel],
) -> Result<(), ScrawlError> {
    if privilege_levels.is_empty() {
        return Err(ScrawlError::InvalidConfiguration {
            details: String::from("at least one privilege level is required"),
        });
    }

    let mut by_name: HashMap<&str, &PrivilegeLevel> = HashMap::new();

    for privilege_level in privilege_levels {
        if by_name
            .insert(privilege_level.name.as_str(), privilege_level)
            .is_some()
        {
            return Err(ScrawlError::InvalidConfiguration {
                details: format!("duplicate privilege level name '{}'", privilege_level.name),
            });
        }
    }

    for privilege_level in privilege_levels {
        for (edge, referenced) in [
            ("previous", &privilege_level.previous_privilege_level),
            ("next", &privilege_level.next_privilege_level),
        ] {
            if !referenced.is_empty() && !by_name.contains_key(referenced.as_str()) {
                return Err(ScrawlError::InvalidConfiguration {
                    details: format!(
                        "privilege level '{}' references unknown {edge} level '{referenced}'",
                        privilege_level.name
                    ),
                });
            }
        }

        if privilege_level.escalate_auth
            && (privilege_level.escalate.is_empty() || privilege_level.escalate_prompt.is_empty())
        {
            return Err(ScrawlError::InvalidConfiguration {
                details: format!(
                    "privilege level '{}' requires escalation auth but is missing the escalate \
                    command and/or escalate prompt",
                    privilege_level.name
                ),
            });
        }
    }

    // walking any previous/next chain must terminate within the graph size, otherwise there is
    // a cycle
    let edge_selectors: [fn(&PrivilegeLevel) -> &str; 2] = [
        |p| p.previous_privilege_level.as_str(),
        |p| p.next_privilege_level.as_str(),
    ];

    for privilege_level in privilege_levels {
        for selector in edge_selectors {
            let mut steps = 0;
            let mut cursor = selector(privilege_level);

            while !cursor.is_empty() {
                steps += 1;

                if steps > privilege_levels.len() {
                    return Err(ScrawlError::InvalidConfiguration {
                        details: format!(
                            "privilege levels contain a cycle involving '{}'",
                            privilege_level.name
                        ),
                    });
                }

                cursor = by_name.get(cursor).map_or("", |p| selector(*p));
            }
        }
    }

    Ok(())
}

/// Joins every level's pattern into the single "any known prompt" pattern the channel runs with
/// while a network driver owns it.
pub(crate) fn joined_prompt_pattern(
    privilege_levels: &[PrivilegeLevel],
) -> Result<Regex, ScrawlError> {
    let joined_patterns = privilege_levels
        .iter()
        .map(|privilege_level| privilege_level.pattern.as_str())
        .collect::<Vec<&str>>()
        .join("|");

    RegexBuilder::new(joined_patterns.as_str())
        .size_limit(JOINED_PROMPT_REGEX_COMPILED_BYTES_LIMIT)
        .build()
        .map_err(|err| ScrawlError::InvalidConfiguration {
            details: format!("failed compiling joined privilege prompt pattern, error: {err}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{
        joined_prompt_pattern,
        validate_privilege_levels,
        PrivilegeLevel,
    };
    use crate::errors::ScrawlError;

    fn exec_and_priv_exec() -> Vec<PrivilegeLevel> {
        let mut exec = PrivilegeLevel::new("exec", r"(?im)^\S{1,48}>\s?$", 0).unwrap();
        exec.next_privilege_level = String::from("privilege_exec");

        let mut priv_exec = PrivilegeLevel::new("privilege_exec", r"(?im)^\S{1,48}#\s?$", 1).unwrap();
        priv_exec.previous_privilege_level = String::from("exec");
        priv_exec.deescalate = String::from("disable");
        priv_exec.escalate = String::from("enable");
        priv_exec.escalate_auth = true;
        priv_exec.escalate_prompt = String::from(r"(?im)^password:\s?$");

        vec![exec, priv_exec]
    }

    #[test]
    fn valid_graph_passes() {
        assert!(validate_privilege_levels(&exec_and_priv_exec()).is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut levels = exec_and_priv_exec();
        levels.push(PrivilegeLevel::new("exec", r">$", 0).unwrap());

        let err = validate_privilege_levels(&levels).unwrap_err();

        assert!(matches!(err, ScrawlError::InvalidConfiguration { .. }));
    }

    #[test]
    fn unknown_edge_references_are_rejected() {
        let mut levels = exec_and_priv_exec();
        levels[1].next_privilege_level = String::from("configuration");

        assert!(validate_privilege_levels(&levels).is_err());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut levels = exec_and_priv_exec();
        levels[0].previous_privilege_level = String::from("privilege_exec");
        levels[1].previous_privilege_level = String::from("exec");

        assert!(validate_privilege_levels(&levels).is_err());
    }

    #[test]
    fn escalate_auth_requires_command_and_prompt() {
        let mut levels = exec_and_priv_exec();
        levels[1].escalate_prompt = String::new();

        assert!(validate_privilege_levels(&levels).is_err());
    }

    #[test]
    fn joined_pattern_matches_any_level_prompt() {
        let joined = joined_prompt_pattern(&exec_and_priv_exec()).unwrap();

        assert!(joined.is_match(b"router1>"));
        assert!(joined.is_match(b"router1#"));
        assert!(!joined.is_match(b"gibberish$$$"));
    }

    #[test]
    fn not_contains_negates_a_match() {
        let mut level = PrivilegeLevel::new("privilege_exec", r"(?im)^\S{1,48}#\s?$", 1).unwrap();
        level.not_contains = vec![String::from("(config")];

        assert!(level.matches("router1#"));
        assert!(!level.matches("router1(config)#"));
    }
}
