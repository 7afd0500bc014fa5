//! Command policy: pure allow/deny rules evaluated before any session exists.
//!
//! `show` modifiers are matched as whole whitespace-separated tokens, so
//! `show run|include x` passes. `erase` in a configuration block is matched
//! as a plain substring, so `no erase startup-config` is rejected.

use crate::domain::command::OperationClass;
use crate::domain::error::PolicyRejection;

/// Tokens that must not appear in a `show` command.
pub const DISALLOWED_MODIFIERS: &[&str] = &[
    "|", "include", "exclude", "begin", "redirect", ">", "<", "config", "copy", "delete", "erase",
    "reload", "write",
];

/// Substring that rejects a configuration block.
pub const DANGEROUS_CONFIG_WORD: &str = "erase";

/// Validate `command` against the rule for `class`.
///
/// # Errors
///
/// Returns the [`PolicyRejection`] describing the first rule violated.
pub fn validate(class: OperationClass, command: &str) -> Result<(), PolicyRejection> {
    match class {
        OperationClass::Show => validate_show(command),
        OperationClass::Ping => require_verb(command, "ping"),
        OperationClass::Config => validate_config(command),
        OperationClass::LinuxRaw | OperationClass::LearnConfig | OperationClass::LearnLogging => {
            Ok(())
        }
    }
}

fn require_verb(command: &str, verb: &'static str) -> Result<(), PolicyRejection> {
    if command.trim().to_lowercase().starts_with(verb) {
        Ok(())
    } else {
        Err(PolicyRejection::InvalidOperation { verb })
    }
}

fn validate_show(command: &str) -> Result<(), PolicyRejection> {
    require_verb(command, "show")?;

    let lowered = command.trim().to_lowercase();
    if lowered
        .split_whitespace()
        .any(|token| DISALLOWED_MODIFIERS.contains(&token))
    {
        return Err(PolicyRejection::DisallowedModifier {
            command: command.to_string(),
        });
    }
    Ok(())
}

fn validate_config(block: &str) -> Result<(), PolicyRejection> {
    if block.to_lowercase().contains(DANGEROUS_CONFIG_WORD) {
        return Err(PolicyRejection::DangerousOperation);
    }
    Ok(())
}
