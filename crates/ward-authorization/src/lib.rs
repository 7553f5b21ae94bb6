//! Ward Authorization
//!
//! Decides whether a session bound to a role may perform an action on a URI.
//!
//! A `Role` is an ordered list of `PermissionRule`s. Each rule matches URIs in
//! one of three ways, and the kinds are ranked:
//!
//! ```text
//! exact  >  wildcard  >  prefix
//! ```
//!
//! The first matching rule (in configured order) of the highest-ranked kind
//! that matches decides; its `allow` flag for the action is the answer even if
//! it is `false`. If nothing matches, the answer is deny.
//!
//! Evaluation is pure and synchronous. Roles are immutable once built and can
//! be shared across sessions behind an `Arc` without locking.

pub mod decision;
pub mod permission;
pub mod role;

pub use decision::Authorization;
pub use permission::{ActionFlags, DiscloseFlags, MatchKind, PermissionConfig, PermissionRule};
pub use role::{Role, RoleAuthorizer, TrustedRole};

pub use ward_core::{Action, Result, WardError};
