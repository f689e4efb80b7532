//! Initiative ordering
//!
//! The active roster view is the roster sorted by initiative
//! descending. The sort is stable, so combatants tied on initiative
//! keep their insertion order. `Session::current_turn` indexes this
//! derived view.

use super::combatant::Combatant;

/// Sort a roster into turn order: initiative descending, insertion
/// order preserved among ties. Takes the roster in insertion order as
/// returned by the store.
pub fn initiative_order(mut roster: Vec<Combatant>) -> Vec<Combatant> {
    roster.sort_by(|a, b| b.initiative.cmp(&a.initiative));
    roster
}

/// Resolve the combatant holding the given turn index, if any
pub fn active_combatant(ordered: &[Combatant], turn: i32) -> Option<&Combatant> {
    usize::try_from(turn).ok().and_then(|i| ordered.get(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::combatant::{Combatant, CombatantDraft};

    fn combatant(name: &str, initiative: i32) -> Combatant {
        Combatant::from_draft(
            "s1",
            CombatantDraft {
                name: name.to_string(),
                initiative: Some(initiative),
                ..Default::default()
            },
        )
    }

    fn names(roster: &[Combatant]) -> Vec<&str> {
        roster.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_descending_order() {
        let roster = vec![
            combatant("Aria", 15),
            combatant("Brom", 20),
            combatant("Cole", 5),
        ];

        let ordered = initiative_order(roster);
        assert_eq!(names(&ordered), vec!["Brom", "Aria", "Cole"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let roster = vec![
            combatant("first", 10),
            combatant("second", 10),
            combatant("high", 12),
            combatant("third", 10),
        ];

        let ordered = initiative_order(roster);
        assert_eq!(names(&ordered), vec!["high", "first", "second", "third"]);
    }

    #[test]
    fn test_idempotent_on_sorted_input() {
        let roster = vec![
            combatant("a", 3),
            combatant("b", 3),
            combatant("c", -1),
        ];

        let once = initiative_order(roster);
        let twice = initiative_order(once.clone());
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn test_negative_and_zero_initiative() {
        let roster = vec![
            combatant("slow", -4),
            combatant("zero", 0),
            combatant("fast", 1),
        ];

        let ordered = initiative_order(roster);
        assert_eq!(names(&ordered), vec!["fast", "zero", "slow"]);
    }

    #[test]
    fn test_active_combatant_bounds() {
        let ordered = initiative_order(vec![combatant("a", 2), combatant("b", 1)]);

        assert_eq!(active_combatant(&ordered, 0).unwrap().name, "a");
        assert_eq!(active_combatant(&ordered, 1).unwrap().name, "b");
        assert!(active_combatant(&ordered, 2).is_none());
        assert!(active_combatant(&ordered, -1).is_none());
        assert!(active_combatant(&[], 0).is_none());
    }
}
