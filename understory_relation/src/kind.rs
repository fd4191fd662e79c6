// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relation kinds.
//!
//! Kinds come in three (parent-role, child-role) pairs. Only the parent-role
//! side of a pair is ever resolved; the child-role side is read back from the
//! links its counterparts hold.

use core::fmt;
use core::str::FromStr;

/// Number of [`RelationKind`] variants.
pub const KIND_COUNT: usize = 6;

/// The category of a declared relation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RelationKind {
    /// Any component ancestor, skipping intermediate components.
    Ancestor = 0,
    /// Any component descendant; dual of [`RelationKind::Ancestor`].
    Descendant = 1,
    /// The nearest ancestor that is not a passthrough node.
    ParentNonVirtualNode = 2,
    /// Dual of [`RelationKind::ParentNonVirtualNode`].
    ChildNonVirtualNode = 3,
    /// The nearest ancestor that is a component.
    ParentComponent = 4,
    /// Dual of [`RelationKind::ParentComponent`].
    ChildComponent = 5,
}

impl RelationKind {
    /// All kinds, in index order.
    pub const ALL: [Self; KIND_COUNT] = [
        Self::Ancestor,
        Self::Descendant,
        Self::ParentNonVirtualNode,
        Self::ChildNonVirtualNode,
        Self::ParentComponent,
        Self::ChildComponent,
    ];

    /// Returns the dense index of this kind, suitable for per-kind tables.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for the kinds that are actively resolved by a relink pass.
    #[must_use]
    #[inline]
    pub const fn is_parent_role(self) -> bool {
        self.parent_kind().is_some()
    }

    /// Returns the parent-seeking kind this is, if any.
    #[must_use]
    pub const fn parent_kind(self) -> Option<ParentKind> {
        match self {
            Self::Ancestor => Some(ParentKind::Ancestor),
            Self::ParentNonVirtualNode => Some(ParentKind::ParentNonVirtualNode),
            Self::ParentComponent => Some(ParentKind::ParentComponent),
            Self::Descendant | Self::ChildNonVirtualNode | Self::ChildComponent => None,
        }
    }

    /// Returns the other half of this kind's pair.
    #[must_use]
    pub const fn dual(self) -> Self {
        match self {
            Self::Ancestor => Self::Descendant,
            Self::Descendant => Self::Ancestor,
            Self::ParentNonVirtualNode => Self::ChildNonVirtualNode,
            Self::ChildNonVirtualNode => Self::ParentNonVirtualNode,
            Self::ParentComponent => Self::ChildComponent,
            Self::ChildComponent => Self::ParentComponent,
        }
    }

    /// Returns the declaration name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ancestor => "ancestor",
            Self::Descendant => "descendant",
            Self::ParentNonVirtualNode => "parent-common-node",
            Self::ChildNonVirtualNode => "child-common-node",
            Self::ParentComponent => "parent",
            Self::ChildComponent => "child",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ParseRelationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(ParseRelationKindError)
    }
}

/// Returned when a string does not name a [`RelationKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParseRelationKindError;

impl fmt::Display for ParseRelationKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the \"type\" property of a relation is not valid")
    }
}

impl core::error::Error for ParseRelationKindError {}

/// The three kinds that a relink pass resolves by walking up the tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentKind {
    /// See [`RelationKind::Ancestor`].
    Ancestor,
    /// See [`RelationKind::ParentNonVirtualNode`].
    ParentNonVirtualNode,
    /// See [`RelationKind::ParentComponent`].
    ParentComponent,
}

impl ParentKind {
    /// The order in which attach and detach visit the parent-seeking kinds.
    pub const ALL: [Self; 3] = [
        Self::ParentNonVirtualNode,
        Self::ParentComponent,
        Self::Ancestor,
    ];

    /// Returns the general [`RelationKind`] for this kind.
    #[must_use]
    pub const fn kind(self) -> RelationKind {
        match self {
            Self::Ancestor => RelationKind::Ancestor,
            Self::ParentNonVirtualNode => RelationKind::ParentNonVirtualNode,
            Self::ParentComponent => RelationKind::ParentComponent,
        }
    }

    /// Returns the child-role kind a target must declare to reciprocate.
    #[must_use]
    #[inline]
    pub const fn child(self) -> RelationKind {
        self.kind().dual()
    }
}

impl From<ParentKind> for RelationKind {
    fn from(kind: ParentKind) -> Self {
        kind.kind()
    }
}
