//! Typed predicate expressions over the `members` and `teams` tables.
//!
//! A [`Predicate`] is a small expression tree built from [`Column`] helpers:
//!
//! ```
//! use roster::search::predicate::Column;
//!
//! let adults_in_team_a = Column::TeamName.eq("teamA").and(Column::MemberAge.goe(18));
//! assert_eq!(adults_in_team_a.to_string(), "(t.name = 'teamA' AND m.age >= 18)");
//! ```
//!
//! Queries alias the tables as `m` (members) and `t` (teams). Rendering into SQL goes through
//! [`Predicate::push_to`], which binds every operand as a parameter.

use sqlx::{Postgres, QueryBuilder};
use std::fmt;

/// Table a [`Column`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Member,
    Team,
}

/// Columns that can appear in a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    MemberId,
    MemberName,
    MemberAge,
    MemberTeamId,
    TeamId,
    TeamName,
}

impl Column {
    pub fn entity(self) -> Entity {
        match self {
            Column::MemberId | Column::MemberName | Column::MemberAge | Column::MemberTeamId => Entity::Member,
            Column::TeamId | Column::TeamName => Entity::Team,
        }
    }

    /// Unqualified column name, as used in `UPDATE ... SET`
    pub fn name(self) -> &'static str {
        match self {
            Column::MemberId => "member_id",
            Column::MemberName => "name",
            Column::MemberAge => "age",
            Column::MemberTeamId => "team_id",
            Column::TeamId => "team_id",
            Column::TeamName => "name",
        }
    }

    /// Column name qualified with the table alias used by member queries
    pub fn qualified(self) -> &'static str {
        match self {
            Column::MemberId => "m.member_id",
            Column::MemberName => "m.name",
            Column::MemberAge => "m.age",
            Column::MemberTeamId => "m.team_id",
            Column::TeamId => "t.team_id",
            Column::TeamName => "t.name",
        }
    }

    pub fn eq(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Eq, value)
    }

    pub fn ne(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Ne, value)
    }

    pub fn lt(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Lt, value)
    }

    /// Less than or equal
    pub fn loe(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Loe, value)
    }

    pub fn gt(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Gt, value)
    }

    /// Greater than or equal
    pub fn goe(self, value: impl Into<Operand>) -> Predicate {
        Predicate::compare(self, Comparison::Goe, value)
    }

    /// Inclusive range, `low <= column <= high`
    pub fn between(self, low: impl Into<Operand>, high: impl Into<Operand>) -> Predicate {
        Predicate::Between {
            column: self,
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull { column: self, negated: false }
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNull { column: self, negated: true }
    }
}

/// A literal value bound as a query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Text(String),
    Int(i32),
    BigInt(i64),
}

impl Operand {
    pub(crate) fn push_bind_to(&self, query: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Operand::Text(value) => query.push_bind(value.clone()),
            Operand::Int(value) => query.push_bind(*value),
            Operand::BigInt(value) => query.push_bind(*value),
        };
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Text(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Text(value)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Int(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::BigInt(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Text(value) => write!(f, "'{}'", value.replace('\'', "''")),
            Operand::Int(value) => write!(f, "{value}"),
            Operand::BigInt(value) => write!(f, "{value}"),
        }
    }
}

/// Binary comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Loe,
    Gt,
    Goe,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Loe => "<=",
            Comparison::Gt => ">",
            Comparison::Goe => ">=",
        }
    }
}

/// Boolean filter expression usable in a WHERE or HAVING clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Compare {
        column: Column,
        op: Comparison,
        value: Operand,
    },
    Between {
        column: Column,
        low: Operand,
        high: Operand,
    },
    IsNull {
        column: Column,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(column: Column, op: Comparison, value: impl Into<Operand>) -> Self {
        Predicate::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    /// Conjunction of `self` and `other`. Nested conjunctions are flattened so that
    /// `a.and(b).and(c)` and `a.and(b.and(c))` produce the same tree.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, Predicate::And(mut right)) => {
                right.insert(0, left);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction of `self` and `other`, flattened like [`Predicate::and`]
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, Predicate::Or(mut right)) => {
                right.insert(0, left);
                Predicate::Or(right)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    /// Every column the predicate reads
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, out: &mut Vec<Column>) {
        match self {
            Predicate::Compare { column, .. } | Predicate::Between { column, .. } | Predicate::IsNull { column, .. } => {
                out.push(*column)
            }
            Predicate::And(parts) | Predicate::Or(parts) => parts.iter().for_each(|p| p.collect_columns(out)),
            Predicate::Not(inner) => inner.collect_columns(out),
        }
    }

    /// Whether evaluating the predicate needs the `teams` join
    pub fn references_team(&self) -> bool {
        self.columns().iter().any(|c| c.entity() == Entity::Team)
    }

    /// Append the predicate to `query`, binding operands as parameters
    pub fn push_to(&self, query: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::Compare { column, op, value } => {
                query.push(column.qualified());
                query.push(" ");
                query.push(op.as_sql());
                query.push(" ");
                value.push_bind_to(query);
            }
            Predicate::Between { column, low, high } => {
                query.push(column.qualified());
                query.push(" BETWEEN ");
                low.push_bind_to(query);
                query.push(" AND ");
                high.push_bind_to(query);
            }
            Predicate::IsNull { column, negated } => {
                query.push(column.qualified());
                query.push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::And(parts) => push_joined(query, parts, " AND ", "TRUE"),
            Predicate::Or(parts) => push_joined(query, parts, " OR ", "FALSE"),
            Predicate::Not(inner) => {
                query.push("NOT (");
                inner.push_to(query);
                query.push(")");
            }
        }
    }
}

fn push_joined(query: &mut QueryBuilder<'_, Postgres>, parts: &[Predicate], separator: &str, empty: &str) {
    if parts.is_empty() {
        query.push(empty);
        return;
    }
    query.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            query.push(separator);
        }
        part.push_to(query);
    }
    query.push(")");
}

impl std::ops::Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { column, op, value } => write!(f, "{} {} {}", column.qualified(), op.as_sql(), value),
            Predicate::Between { column, low, high } => write!(f, "{} BETWEEN {} AND {}", column.qualified(), low, high),
            Predicate::IsNull { column, negated: false } => write!(f, "{} IS NULL", column.qualified()),
            Predicate::IsNull { column, negated: true } => write!(f, "{} IS NOT NULL", column.qualified()),
            Predicate::And(parts) | Predicate::Or(parts) if parts.is_empty() => {
                write!(f, "{}", if matches!(self, Predicate::And(_)) { "TRUE" } else { "FALSE" })
            }
            Predicate::And(parts) | Predicate::Or(parts) => {
                let separator = if matches!(self, Predicate::And(_)) { " AND " } else { " OR " };
                let rendered: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "({})", rendered.join(separator))
            }
            Predicate::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

/// AND together every present predicate, skipping absent ones.
///
/// Returns `None` when nothing is present: the empty conjunction matches every row, so callers
/// omit the WHERE clause entirely rather than emitting an always-true condition.
pub fn all<I>(parts: I) -> Option<Predicate>
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    parts.into_iter().flatten().reduce(Predicate::and)
}

/// Append ` WHERE <predicate>` when a predicate is present
pub fn push_where(query: &mut QueryBuilder<'_, Postgres>, predicate: Option<&Predicate>) {
    if let Some(predicate) = predicate {
        query.push(" WHERE ");
        predicate.push_to(query);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(predicate: &Predicate) -> String {
        let mut query = QueryBuilder::<Postgres>::new("");
        predicate.push_to(&mut query);
        query.sql().to_string()
    }

    #[test]
    fn test_compare_binds_parameters() {
        assert_eq!(render(&Column::MemberName.eq("member1")), "m.name = $1");
        assert_eq!(render(&Column::MemberAge.goe(10)), "m.age >= $1");
        assert_eq!(render(&Column::TeamName.ne("teamB")), "t.name <> $1");
    }

    #[test]
    fn test_conjunction_rendering_numbers_parameters_in_order() {
        let predicate = Column::TeamName
            .eq("teamA")
            .and(Column::MemberAge.goe(10))
            .and(Column::MemberAge.loe(30));
        assert_eq!(render(&predicate), "(t.name = $1 AND m.age >= $2 AND m.age <= $3)");
    }

    #[test]
    fn test_between_null_and_negation() {
        assert_eq!(render(&Column::MemberAge.between(10, 30)), "m.age BETWEEN $1 AND $2");
        assert_eq!(render(&Column::MemberName.is_null()), "m.name IS NULL");
        assert_eq!(render(&!Column::MemberTeamId.is_not_null()), "NOT (m.team_id IS NOT NULL)");
    }

    #[test]
    fn test_mixed_and_or_keeps_grouping() {
        let predicate = Column::MemberAge
            .lt(20)
            .or(Column::MemberAge.gt(30))
            .and(Column::TeamName.eq("teamA"));
        assert_eq!(render(&predicate), "((m.age < $1 OR m.age > $2) AND t.name = $3)");
        assert_eq!(predicate.to_string(), "((m.age < 20 OR m.age > 30) AND t.name = 'teamA')");
    }

    #[test]
    fn test_and_flattens_nested_conjunctions() {
        let a = Column::MemberName.eq("a");
        let b = Column::MemberAge.eq(1);
        let c = Column::TeamName.eq("c");

        let left = a.clone().and(b.clone()).and(c.clone());
        let right = a.clone().and(b.clone().and(c.clone()));
        assert_eq!(left, right);
        assert_eq!(left, Predicate::And(vec![a, b, c]));
    }

    #[test]
    fn test_all_skips_absent_parts() {
        assert_eq!(all(Vec::<Option<Predicate>>::new()), None);
        assert_eq!(all([None, None]), None);

        let only = Column::MemberAge.loe(30);
        assert_eq!(all([None, Some(only.clone()), None]), Some(only));

        let both = all([Some(Column::MemberName.eq("x")), None, Some(Column::MemberAge.eq(3))]);
        assert_eq!(both, Some(Predicate::And(vec![Column::MemberName.eq("x"), Column::MemberAge.eq(3)])));
    }

    #[test]
    fn test_references_team() {
        assert!(!Column::MemberName.eq("x").and(Column::MemberAge.gt(1)).references_team());
        assert!(Column::MemberAge.gt(1).or(Column::TeamName.eq("t")).references_team());
        assert!((!Column::TeamId.is_null()).references_team());
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(Column::MemberName.eq("o'neil").to_string(), "m.name = 'o''neil'");
    }

    #[test]
    fn test_empty_connectives() {
        assert_eq!(render(&Predicate::And(vec![])), "TRUE");
        assert_eq!(Predicate::Or(vec![]).to_string(), "FALSE");
    }

    #[test]
    fn test_push_where_omits_clause_without_predicate() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM members m");
        push_where(&mut query, None);
        assert_eq!(query.sql(), "SELECT * FROM members m");

        let predicate = Column::MemberName.eq("member1");
        push_where(&mut query, Some(&predicate));
        assert_eq!(query.sql(), "SELECT * FROM members m WHERE m.name = $1");
    }
}
