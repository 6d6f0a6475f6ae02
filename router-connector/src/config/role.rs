use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// What kind of peer a connector or listener talks to. Carried through to the
/// management view, it does not change how failover works.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    Normal,
    InterRouter,
    RouteContainer,
    Edge,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Normal => "normal",
            Role::InterRouter => "inter-router",
            Role::RouteContainer => "route-container",
            Role::Edge => "edge",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
