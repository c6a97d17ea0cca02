pub mod agent;
pub mod config;
pub mod events;
pub mod members;
pub mod tasks;
pub mod tools;
pub mod view;

use anyhow::{Result, bail};
use famsync_core::{Household, Instant, MemberId, RecurrenceRule};

pub fn now() -> Instant {
    chrono::Local::now().naive_local()
}

/// Resolve a member by id, or by name ignoring case.
pub fn resolve_member(household: &Household, input: &str) -> Result<MemberId> {
    if let Some(member) = household.member(input) {
        return Ok(member.id.clone());
    }

    let matches: Vec<_> = household
        .members
        .iter()
        .filter(|m| m.name.eq_ignore_ascii_case(input.trim()))
        .collect();

    match matches.as_slice() {
        [member] => Ok(member.id.clone()),
        [] => bail!("No member named \"{}\"", input),
        _ => bail!("Several members are named \"{}\"; use the id", input),
    }
}

pub fn resolve_members(household: &Household, inputs: &[String]) -> Result<Vec<MemberId>> {
    inputs.iter().map(|i| resolve_member(household, i)).collect()
}

pub fn parse_rule(input: &str) -> Result<RecurrenceRule> {
    Ok(input.parse::<RecurrenceRule>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Household {
        let h = Household::default().add_member("Sarah", None).unwrap().household;
        h.add_member("Mike", None).unwrap().household
    }

    #[test]
    fn resolves_by_id_or_name() {
        let h = family();
        let sarah = h.members[0].id.clone();
        assert_eq!(resolve_member(&h, &sarah).unwrap(), sarah);
        assert_eq!(resolve_member(&h, "sarah").unwrap(), sarah);
        assert!(resolve_member(&h, "Leo").is_err());
    }

    #[test]
    fn duplicate_names_need_an_id() {
        let h = family().add_member("Mike", None).unwrap().household;
        assert!(resolve_member(&h, "mike").is_err());
    }
}
