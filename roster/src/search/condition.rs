//! Member search criteria and their translation into a [`Predicate`].

use super::predicate::{Column, Predicate, all};
use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Optional filters for searching members.
///
/// Every field is independently optional; an absent field places no constraint on the result.
/// Blank strings (empty or whitespace only) count as absent, and an empty age bound (`ageGoe=`)
/// parses as no bound.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MemberSearchCondition {
    /// Exact member name
    pub member_name: Option<String>,

    /// Exact name of the member's team
    pub team_name: Option<String>,

    /// Inclusive lower bound on age
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub age_goe: Option<i32>,

    /// Inclusive upper bound on age
    #[serde(default)]
    #[serde_as(as = "NoneAsEmptyString")]
    pub age_loe: Option<i32>,
}

impl MemberSearchCondition {
    pub fn with_member_name(mut self, name: impl Into<String>) -> Self {
        self.member_name = Some(name.into());
        self
    }

    pub fn with_team_name(mut self, name: impl Into<String>) -> Self {
        self.team_name = Some(name.into());
        self
    }

    pub fn with_age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    pub fn with_age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }
}

/// True when `value` contains at least one non-whitespace character
pub fn has_text(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn member_name_eq(name: Option<&str>) -> Option<Predicate> {
    name.filter(|n| has_text(n)).map(|n| Column::MemberName.eq(n))
}

pub fn team_name_eq(name: Option<&str>) -> Option<Predicate> {
    name.filter(|n| has_text(n)).map(|n| Column::TeamName.eq(n))
}

pub fn age_goe(bound: Option<i32>) -> Option<Predicate> {
    bound.map(|age| Column::MemberAge.goe(age))
}

pub fn age_loe(bound: Option<i32>) -> Option<Predicate> {
    bound.map(|age| Column::MemberAge.loe(age))
}

/// Combine the criteria into one predicate, AND-ing only the conditions whose inputs are present.
///
/// `None` means "no filter": the caller should run the query without a WHERE clause.
pub fn compose(condition: &MemberSearchCondition) -> Option<Predicate> {
    all([
        member_name_eq(condition.member_name.as_deref()),
        team_name_eq(condition.team_name.as_deref()),
        age_goe(condition.age_goe),
        age_loe(condition.age_loe),
    ])
}

/// Name and age equality, each side applied only when supplied.
///
/// Unlike the per-field search helpers the name is matched whenever it is present, even if blank.
pub fn all_eq(name: Option<&str>, age: Option<i32>) -> Option<Predicate> {
    all([name.map(|n| Column::MemberName.eq(n)), age.map(|a| Column::MemberAge.eq(a))])
}

/// Accumulates predicates conjunctively (or disjunctively) as guards pass.
///
/// Equivalent to collecting `Option<Predicate>` values and reducing them with [`all`]; kept for
/// call sites where the conditions are naturally written as a sequence of `if` blocks.
#[derive(Debug, Clone, Default)]
pub struct ConditionBuilder {
    predicate: Option<Predicate>,
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(match self.predicate.take() {
            Some(current) => current.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn or(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(match self.predicate.take() {
            Some(current) => current.or(predicate),
            None => predicate,
        });
        self
    }

    pub fn has_value(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn build(self) -> Option<Predicate> {
        self.predicate
    }
}

/// Same result as [`compose`], assembled with a [`ConditionBuilder`]
pub fn compose_with_builder(condition: &MemberSearchCondition) -> Option<Predicate> {
    let mut builder = ConditionBuilder::new();
    if let Some(name) = condition.member_name.as_deref().filter(|n| has_text(n)) {
        builder.and(Column::MemberName.eq(name));
    }
    if let Some(name) = condition.team_name.as_deref().filter(|n| has_text(n)) {
        builder.and(Column::TeamName.eq(name));
    }
    if let Some(age) = condition.age_goe {
        builder.and(Column::MemberAge.goe(age));
    }
    if let Some(age) = condition.age_loe {
        builder.and(Column::MemberAge.loe(age));
    }
    builder.build()
}
