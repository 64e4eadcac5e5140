//! Engine configuration: the knobs the engine's behavior is parameterized
//! by, plus the three named presets.

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::domain::ContextPolicy;
use crate::errors::{PtaError, PtaResult};

use super::policy::parse_policy;

/// How container element/value fields are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSensitivity {
    /// Attributes distinguished by name; containers still merge elements.
    AttrName,
    /// Every field, including named attributes, shares one slot.
    FieldInsensitive,
}

/// A container kind's field treatment, mirroring `FieldKey::for_container_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerTreatment {
    Elem,
    Value,
}

/// Complete, validated engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub policy: ContextPolicy,
    pub field_sensitivity: FieldSensitivity,
    pub containers: FxHashMap<String, ContainerTreatment>,
    /// `None` means no deadline.
    pub timeout: Option<Duration>,
    /// Iteration cap; `None` means unbounded.
    pub max_iterations: Option<u64>,
    pub verbose: bool,
    pub build_class_hierarchy: bool,
    pub use_mro: bool,
}

impl EngineConfig {
    /// Builder seeded with the `2-cfa` defaults matching the original's
    /// backward-compatible `k=2` default.
    pub fn new(policy: ContextPolicy) -> Self {
        let mut containers = FxHashMap::default();
        containers.insert("list".to_string(), ContainerTreatment::Elem);
        containers.insert("set".to_string(), ContainerTreatment::Elem);
        containers.insert("tuple".to_string(), ContainerTreatment::Elem);
        containers.insert("dict".to_string(), ContainerTreatment::Value);
        Self {
            policy,
            field_sensitivity: FieldSensitivity::AttrName,
            containers,
            timeout: None,
            max_iterations: None,
            verbose: false,
            build_class_hierarchy: true,
            use_mro: true,
        }
    }

    pub fn with_policy_token(token: &str) -> PtaResult<Self> {
        Ok(Self::new(parse_policy(token)?))
    }

    pub fn field_sensitivity(mut self, mode: FieldSensitivity) -> Self {
        self.field_sensitivity = mode;
        self
    }

    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = Some(d);
        self
    }

    pub fn max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    /// Validate range constraints not already enforced by the type
    /// system.
    pub fn validate(&self) -> PtaResult<()> {
        if let Some(n) = self.max_iterations {
            if n == 0 {
                return Err(PtaError::out_of_range(
                    "max_iterations",
                    n,
                    1,
                    u64::MAX,
                    "a zero iteration cap can never reach a fixpoint",
                ));
            }
        }
        Ok(())
    }
}

/// Complete configuration presets: three named analysis profiles
/// (fast/balanced/thorough) narrowed to this engine's own knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// `0-cfa`, small iteration cap: fast, imprecise.
    Fast,
    /// `2-cfa`: the default balance of precision and cost.
    Balanced,
    /// `1c1o` hybrid, no iteration cap: maximal precision.
    Thorough,
}

impl Preset {
    pub fn parse(s: &str) -> PtaResult<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            other => Err(PtaError::UnknownPreset(other.to_string())),
        }
    }

    pub fn build(self) -> EngineConfig {
        match self {
            Self::Fast => EngineConfig::new(ContextPolicy::Insensitive).max_iterations(50),
            Self::Balanced => EngineConfig::new(ContextPolicy::CallString(2)).max_iterations(500),
            Self::Thorough => EngineConfig::new(ContextPolicy::Hybrid { call_k: 1, obj_depth: 1 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_preset_is_context_insensitive() {
        let cfg = Preset::Fast.build();
        assert!(matches!(cfg.policy, ContextPolicy::Insensitive));
        assert_eq!(cfg.max_iterations, Some(50));
    }

    #[test]
    fn default_container_treatment_matches_python_defaults() {
        let cfg = EngineConfig::new(ContextPolicy::CallString(2));
        assert_eq!(cfg.containers["list"], ContainerTreatment::Elem);
        assert_eq!(cfg.containers["dict"], ContainerTreatment::Value);
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let cfg = EngineConfig::new(ContextPolicy::Insensitive).max_iterations(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_preset_name_errors() {
        assert!(Preset::parse("extreme").is_err());
    }
}
