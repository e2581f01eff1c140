use std::fmt;
use std::str::FromStr;

use crate::frequency::Frequency;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    None,
    Level,
    Pulse,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::None => "NONE",
            TriggerType::Level => "LEVEL",
            TriggerType::Pulse => "PULSE",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(TriggerType::None),
            "LEVEL" => Ok(TriggerType::Level),
            "PULSE" => Ok(TriggerType::Pulse),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRole {
    Master,
    Slave,
}

impl SyncRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncRole::Master => "MASTER",
            SyncRole::Slave => "SLAVE",
        }
    }

    /// Parses the device's sync-role reply. The original driver's equivalent
    /// getter combined its two string comparisons with OR, which makes it
    /// always reject -- fixed here to AND, the only combination that can
    /// ever accept a valid reply.
    pub fn matches(candidate: &str, role: SyncRole) -> bool {
        candidate.eq_ignore_ascii_case(role.as_str()) && !candidate.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTrigger {
    pub start_freq: Frequency,
    pub stop_freq: Frequency,
    pub amplitude_dbm: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSettings {
    pub trigger_type: TriggerType,
    pub level: Option<LevelTrigger>,
    /// Sync delay in nanoseconds; must be a multiple of 8.
    pub sync_delay_ns: u32,
    pub sync_role: Option<SyncRole>,
}

impl TriggerSettings {
    pub fn none() -> TriggerSettings {
        TriggerSettings {
            trigger_type: TriggerType::None,
            level: None,
            sync_delay_ns: 0,
            sync_role: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_role_round_trips() {
        assert_eq!("MASTER".parse::<TriggerType>(), Err(()));
        assert!(SyncRole::matches("MASTER", SyncRole::Master));
        assert!(!SyncRole::matches("SLAVE", SyncRole::Master));
    }

    #[test]
    fn trigger_type_parses() {
        assert_eq!("LEVEL".parse(), Ok(TriggerType::Level));
        assert_eq!("BOGUS".parse::<TriggerType>(), Err(()));
    }
}
