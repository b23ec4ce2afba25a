use serde::{Deserialize, Serialize};
use std::fmt;

/// Responsible role, ordered from lowest to highest authority.
///
/// Ordering follows declaration order, so `Role::Employee < Role::GeneralManager`.
/// Serialized with the labels used by the rest of the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "员工")]
    Employee,
    #[serde(rename = "直属管理")]
    DirectSupervisor,
    #[serde(rename = "门店副总")]
    StoreVp,
    #[serde(rename = "总经理")]
    GeneralManager,
}

impl Role {
    /// Full hierarchy, lowest first
    pub const HIERARCHY: [Role; 4] = [
        Role::Employee,
        Role::DirectSupervisor,
        Role::StoreVp,
        Role::GeneralManager,
    ];

    /// The role one step above this one, or `None` at the top of the hierarchy
    pub fn next(self) -> Option<Role> {
        match self {
            Self::Employee => Some(Self::DirectSupervisor),
            Self::DirectSupervisor => Some(Self::StoreVp),
            Self::StoreVp => Some(Self::GeneralManager),
            Self::GeneralManager => None,
        }
    }

    pub fn is_top(self) -> bool {
        self.next().is_none()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Employee => "员工",
            Self::DirectSupervisor => "直属管理",
            Self::StoreVp => "门店副总",
            Self::GeneralManager => "总经理",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "员工" | "employee" => Ok(Self::Employee),
            "直属管理" | "direct_supervisor" => Ok(Self::DirectSupervisor),
            "门店副总" | "store_vp" => Ok(Self::StoreVp),
            "总经理" | "general_manager" => Ok(Self::GeneralManager),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}
