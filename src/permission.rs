//! Typed permission levels.
//!
//! Resource kinds name their levels with plain strings so each kind can pick
//! its own tiers. The stock kinds use the three standard levels defined here,
//! and callers that know the level at compile time can use the marker types
//! instead of spelling the name.
//!
//! # Example
//!
//! ```ignore
//! use resperm::level::Edit;
//!
//! service.grant::<Edit>(org_id, "42", &Principal::User(7)).await?;
//! ```

/// Marker trait for permission levels.
///
/// Implementors define an ordinal and the level name used in action set maps.
/// `Cascade::typed` uses the ordinal to keep typed levels in ascending order.
/// Standard levels: View (1) < Edit (2) < Admin (3)
pub trait Level: Clone + Copy + PartialEq + Eq + PartialOrd + Ord + std::fmt::Debug {
    /// Position among the standard levels. Higher ordinal = more permissive.
    const ORDINAL: u8;

    /// Name of the level as it appears in a kind's action set map.
    const NAME: &'static str;
}

/// Standard permission levels (View < Edit < Admin).
pub mod level {
    use super::Level;

    /// Read-only access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
    pub struct View;

    impl Level for View {
        const ORDINAL: u8 = 1;
        const NAME: &'static str = "View";
    }

    /// Content editing access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Edit;

    impl Level for Edit {
        const ORDINAL: u8 = 2;
        const NAME: &'static str = "Edit";
    }

    /// Administrative access level.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Admin;

    impl Level for Admin {
        const ORDINAL: u8 = 3;
        const NAME: &'static str = "Admin";
    }
}
