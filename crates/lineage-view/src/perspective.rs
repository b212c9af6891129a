//! Perspective state machine.
//!
//! A perspective is the scope of the currently fetched graph:
//!
//! ```text
//!            show architecture             open package(id)
//!   GLOBAL  ------------------>  ARCHITECTURE  -------------->  PACKAGE(id)
//!           <------------------                <--------------
//!              show global                       close package
//! ```
//!
//! `show global` is also accepted from `PACKAGE(id)`. Every other
//! combination, including a transition to the current state, is rejected
//! with [`Error::InvalidTransition`].

use crate::error::{Error, Result};
use lineage_graph::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scope of the fetched graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "packageId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Perspective {
    /// Whole solution
    #[default]
    Global,
    /// Package-level rollup
    Architecture,
    /// Internal components of one package
    Package(NodeId),
}

impl Perspective {
    /// Backend query mode for this perspective.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Perspective::Global => "GLOBAL",
            Perspective::Architecture => "ARCHITECTURE",
            Perspective::Package(_) => "PACKAGE",
        }
    }

    /// Package bound to a drill-down.
    #[must_use]
    pub fn package_id(&self) -> Option<&NodeId> {
        match self {
            Perspective::Package(id) => Some(id),
            _ => None,
        }
    }

    /// `GLOBAL -> ARCHITECTURE`
    pub fn show_architecture(&self) -> Result<Perspective> {
        match self {
            Perspective::Global => Ok(Perspective::Architecture),
            _ => Err(self.invalid("show architecture")),
        }
    }

    /// `ARCHITECTURE | PACKAGE -> GLOBAL`
    pub fn show_global(&self) -> Result<Perspective> {
        match self {
            Perspective::Architecture | Perspective::Package(_) => Ok(Perspective::Global),
            Perspective::Global => Err(self.invalid("show global")),
        }
    }

    /// `ARCHITECTURE -> PACKAGE(id)`
    pub fn open_package(&self, id: NodeId) -> Result<Perspective> {
        match self {
            Perspective::Architecture => Ok(Perspective::Package(id)),
            _ => Err(self.invalid("open package")),
        }
    }

    /// `PACKAGE(id) -> ARCHITECTURE`, dropping the bound id.
    pub fn close_package(&self) -> Result<Perspective> {
        match self {
            Perspective::Package(_) => Ok(Perspective::Architecture),
            _ => Err(self.invalid("close package")),
        }
    }

    fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.clone(),
            action,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perspective::Package(id) => write!(f, "PACKAGE({id})"),
            other => f.write_str(other.mode()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn package() -> Perspective {
        Perspective::Package(NodeId::new("pkg-1"))
    }

    #[test]
    fn drill_down_round_trip() {
        let architecture = Perspective::Global.show_architecture().unwrap();
        let drilled = architecture.open_package(NodeId::new("pkg-1")).unwrap();
        assert_eq!(drilled.package_id(), Some(&NodeId::new("pkg-1")));

        let closed = drilled.close_package().unwrap();
        assert_eq!(closed, Perspective::Architecture);
        assert_eq!(closed.package_id(), None);
        assert_eq!(closed.show_global().unwrap(), Perspective::Global);
    }

    #[rstest]
    #[case::open_from_global(Perspective::Global.open_package(NodeId::new("p")))]
    #[case::close_from_architecture(Perspective::Architecture.close_package())]
    #[case::architecture_twice(Perspective::Architecture.show_architecture())]
    #[case::global_twice(Perspective::Global.show_global())]
    #[case::nested_packages(package().open_package(NodeId::new("p")))]
    fn invalid_transitions_are_rejected(#[case] result: Result<Perspective>) {
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
    }

    #[test]
    fn global_reachable_from_package() {
        assert_eq!(package().show_global().unwrap(), Perspective::Global);
    }

    #[test]
    fn display_includes_package_id() {
        assert_eq!(package().to_string(), "PACKAGE(pkg-1)");
        assert_eq!(Perspective::Architecture.to_string(), "ARCHITECTURE");
    }

    #[test]
    fn serializes_as_tagged_mode() {
        let json = serde_json::to_value(package()).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "PACKAGE", "packageId": "pkg-1"}));
        let json = serde_json::to_value(Perspective::Global).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "GLOBAL"}));
    }
}
