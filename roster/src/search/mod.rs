//! Dynamic search predicates.
//!
//! Search endpoints accept a handful of optional filters. This module turns them into a single
//! WHERE predicate that contains only the conditions whose inputs were actually supplied:
//!
//! ```
//! use roster::search::{MemberSearchCondition, compose};
//!
//! let condition = MemberSearchCondition::default()
//!     .with_member_name("   ")
//!     .with_team_name("teamA")
//!     .with_age_goe(10);
//!
//! let predicate = compose(&condition).expect("team and age are present");
//! assert_eq!(predicate.to_string(), "(t.name = 'teamA' AND m.age >= 10)");
//!
//! // Nothing supplied: no WHERE clause at all
//! assert!(compose(&MemberSearchCondition::default()).is_none());
//! ```
//!
//! - [`predicate`]: the typed expression tree and its SQL rendering
//! - [`condition`]: search criteria, per-field predicate helpers and the composers

pub mod condition;
pub mod predicate;

pub use condition::{ConditionBuilder, MemberSearchCondition, all_eq, compose, compose_with_builder};
pub use predicate::{Column, Comparison, Operand, Predicate, all};
