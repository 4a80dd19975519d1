//! # Offline Subcommands
//!
//! `next-id` applies the allocator's successor rule to a given maximum.
//! `transitions` prints the active rule table. Neither touches a database.

use anyhow::Result;
use clap::Args;
use rpms_state::{EnforcementMode, TransitionTable};
use rpms_workflow::next_publication_id;

/// Arguments for `rpms next-id`.
#[derive(Args, Debug)]
pub struct NextIdArgs {
    /// Current greatest identifier. Omit for an empty store.
    #[arg(long)]
    pub current: Option<String>,
}

/// Print the identifier that follows `--current`.
pub fn run_next_id(args: &NextIdArgs) -> Result<u8> {
    println!("{}", next_publication_id(args.current.as_deref()));
    Ok(0)
}

/// Render the rule table as aligned text.
pub fn render_table(table: &TransitionTable) -> String {
    let mut out = format!("enforcement: {}\n", table.mode());
    out.push_str(&format!(
        "{:<16} {:<28} {:<48} {}\n",
        "ACTION", "ROLES", "FROM", "TO"
    ));
    for rule in table.rules() {
        let roles: Vec<&str> = rule.roles.iter().map(|r| r.as_str()).collect();
        out.push_str(&format!(
            "{:<16} {:<28} {:<48} {}\n",
            rule.action.as_str(),
            roles.join(","),
            rule.from.to_string(),
            rule.to
        ));
    }
    out
}

/// Print the transition table for the selected mode.
pub fn run_transitions(mode: EnforcementMode) -> Result<u8> {
    print!("{}", render_table(&TransitionTable::new(mode)));
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatible_table_lists_every_action() {
        let text = render_table(&TransitionTable::compatible());
        assert!(text.starts_with("enforcement: compatible\n"));
        for action in ["create", "update", "recommend", "update_metadata", "review", "delete"] {
            assert!(text.contains(action), "missing {action}");
        }
        assert!(text.contains("editor,coordinator,admin"));
    }

    #[test]
    fn strict_table_shows_source_sets() {
        let text = render_table(&TransitionTable::strict());
        assert!(text.contains("recommended_for_publication"));
        assert!(text.contains("submitted|under_review|approved"));
    }
}
