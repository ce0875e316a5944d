use log::debug;

use std::collections::{BTreeMap, HashSet};

pub use crate::config::*;

/// A builder for new elections.
///
/// Slates are numbered by their position (starting at 1) unless a number is
/// given explicitly. All the checks happen in [`ElectionBuilder::build`].
///
/// ```
/// use student_voting::builder::ElectionBuilder;
/// use student_voting::ElectionRules;
/// # use student_voting::ElectionError;
///
/// let election = ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
///     .title("Student council 2024")
///     .description("Yearly election of the student council")
///     .slate("Blue")
///     .slate("Green")
///     .build(&[])?;
///
/// assert_eq!(election.slates[1].number, 2);
/// assert_eq!(election.votes["chapa-2"], 0);
/// # Ok::<(), ElectionError>(())
/// ```
pub struct ElectionBuilder {
    pub(crate) _rules: ElectionRules,
    pub(crate) _title: String,
    pub(crate) _description: String,
    pub(crate) _dates: Option<ElectionDates>,
    pub(crate) _slates: Vec<(String, Option<u32>)>,
}

impl ElectionBuilder {
    pub fn new(rules: &ElectionRules) -> ElectionBuilder {
        ElectionBuilder {
            _rules: *rules,
            _title: String::new(),
            _description: String::new(),
            _dates: None,
            _slates: Vec::new(),
        }
    }

    pub fn title(self, title: &str) -> ElectionBuilder {
        ElectionBuilder {
            _title: title.trim().to_string(),
            ..self
        }
    }

    pub fn description(self, description: &str) -> ElectionBuilder {
        ElectionBuilder {
            _description: description.trim().to_string(),
            ..self
        }
    }

    /// If not called, the election starts when it is built.
    pub fn dates(self, dates: ElectionDates) -> ElectionBuilder {
        ElectionBuilder {
            _dates: Some(dates),
            ..self
        }
    }

    /// Adds a slate numbered after its position.
    pub fn slate(mut self, name: &str) -> ElectionBuilder {
        self._slates.push((name.trim().to_string(), None));
        self
    }

    pub fn slates(self, names: &[String]) -> ElectionBuilder {
        names.iter().fold(self, |b, name| b.slate(name))
    }

    /// Adds a slate with a chosen ballot number.
    pub fn numbered_slate(mut self, name: &str, number: u32) -> ElectionBuilder {
        self._slates.push((name.trim().to_string(), Some(number)));
        self
    }

    /// Validates the input and creates the election, open and with an empty
    /// tally.
    ///
    /// `existing` is the current collection. It is only looked at when the
    /// rules forbid more than one open election.
    pub fn build(self, existing: &[Election]) -> Result<Election, ElectionError> {
        if self._title.is_empty() {
            return Err(ElectionError::BlankField("title"));
        }
        if self._description.is_empty() {
            return Err(ElectionError::BlankField("description"));
        }
        if self._slates.iter().any(|(name, _)| name.is_empty()) {
            return Err(ElectionError::BlankField("slate name"));
        }
        if self._slates.len() < self._rules.min_slates.max(1) {
            return Err(ElectionError::NotEnoughSlates {
                required: self._rules.min_slates.max(1),
                provided: self._slates.len(),
            });
        }

        let mut slates: Vec<Slate> = Vec::new();
        let mut numbers: HashSet<u32> = HashSet::new();
        for (idx, (name, number)) in self._slates.iter().enumerate() {
            let number = number.unwrap_or(idx as u32 + 1);
            if !numbers.insert(number) {
                return Err(ElectionError::DuplicateBallotNumber(number));
            }
            slates.push(Slate {
                id: format!("chapa-{}", number),
                name: name.clone(),
                number,
            });
        }

        if self._rules.single_open_election {
            if let Some(open) = existing.iter().find(|e| e.is_open()) {
                return Err(ElectionError::ElectionAlreadyOpen(open.id.clone()));
            }
        }

        let votes: BTreeMap<SlateId, u64> = slates.iter().map(|s| (s.id.clone(), 0)).collect();
        let dates = self._dates.unwrap_or_else(ElectionDates::starting_now);
        let election = Election {
            id: ElectionId::new(),
            title: self._title,
            description: self._description,
            start_date: dates.start,
            end_date: dates.end,
            slates,
            votes,
            voters: Vec::new(),
            status: ElectionStatus::Open,
        };
        debug!(
            "build: election {} with {} slates",
            election.id,
            election.slates.len()
        );
        Ok(election)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ElectionBuilder {
        ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
            .title("  Council  ")
            .description("Yearly vote")
    }

    #[test]
    fn numbers_slates_in_order() {
        let e = base().slate("A").slate(" B ").slate("C").build(&[]).unwrap();
        let numbers: Vec<u32> = e.slates.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(e.slates[1].name, "B");
        assert_eq!(e.title, "Council");
        assert_eq!(e.votes.len(), 3);
        assert!(e.votes.values().all(|v| *v == 0));
        assert!(e.voters.is_empty());
        assert!(e.is_open());
        assert!(e.check_integrity().is_empty());
    }

    #[test]
    fn explicit_numbers() {
        let e = base()
            .numbered_slate("A", 10)
            .numbered_slate("B", 20)
            .build(&[])
            .unwrap();
        assert_eq!(e.slates[0].id, "chapa-10");
        assert_eq!(e.slate_by_number(20).map(|s| s.name.as_str()), Some("B"));
    }

    #[test]
    fn rejects_duplicate_numbers() {
        let res = base().slate("A").numbered_slate("B", 1).build(&[]);
        assert_eq!(res, Err(ElectionError::DuplicateBallotNumber(1)));
    }

    #[test]
    fn rejects_blank_fields() {
        let res = ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
            .title(" ")
            .description("x")
            .slate("A")
            .build(&[]);
        assert_eq!(res, Err(ElectionError::BlankField("title")));

        let res = base().slate("A").slate("   ").build(&[]);
        assert_eq!(res, Err(ElectionError::BlankField("slate name")));
    }

    #[test]
    fn enforces_minimum_slates() {
        let res = base().build(&[]);
        assert_eq!(
            res,
            Err(ElectionError::NotEnoughSlates {
                required: 1,
                provided: 0
            })
        );
        let rules = ElectionRules {
            min_slates: 2,
            ..ElectionRules::DEFAULT_RULES
        };
        let res = ElectionBuilder::new(&rules)
            .title("t")
            .description("d")
            .slate("A")
            .build(&[]);
        assert!(matches!(
            res,
            Err(ElectionError::NotEnoughSlates { required: 2, .. })
        ));
    }

    #[test]
    fn single_open_election() {
        let first = base().slate("A").build(&[]).unwrap();
        let res = base().slate("B").build(&[first.clone()]);
        assert_eq!(res, Err(ElectionError::ElectionAlreadyOpen(first.id.clone())));

        let permissive = ElectionRules {
            single_open_election: false,
            ..ElectionRules::DEFAULT_RULES
        };
        let second = ElectionBuilder::new(&permissive)
            .title("t")
            .description("d")
            .slate("B")
            .build(&[first.clone()])
            .unwrap();
        assert_ne!(second.id, first.id);
    }
}
