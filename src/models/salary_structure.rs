//! Salary structure models.
//!
//! This module defines [`SalaryStructure`] and its ordered [`Component`] rules.
//! A structure is immutable once created: there is no method that edits one,
//! only [`SalaryStructure::next_version`] which builds its successor.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// Whether a component adds to gross pay or is deducted from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Adds to gross pay.
    Earning,
    /// Accumulates into total deductions.
    Deduction,
}

impl ComponentType {
    /// Returns the wire name of the component type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earning => "earning",
            Self::Deduction => "deduction",
        }
    }
}

/// How a component's amount is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    /// The component value is the amount, in minor units.
    Fixed,
    /// The component value is a percentage of base salary or running gross.
    Percentage,
}

impl CalculationType {
    /// Returns the wire name of the calculation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percentage => "percentage",
        }
    }
}

fn default_apply_on_base_only() -> bool {
    true
}

/// A single earning or deduction rule within a salary structure.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{CalculationType, Component, ComponentType};
/// use rust_decimal::Decimal;
///
/// let pf = Component {
///     name: "Provident Fund".to_string(),
///     code: "PF".to_string(),
///     component_type: ComponentType::Deduction,
///     calculation_type: CalculationType::Percentage,
///     value: Decimal::new(12, 0),
///     apply_on_base_only: true,
///     cap_amount: Some(Decimal::new(1800, 0)),
/// };
/// assert!(pf.is_deduction());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Display name (e.g., "House Rent Allowance").
    pub name: String,
    /// Short code, unique within a structure (e.g., "HRA").
    pub code: String,
    /// Earning or deduction.
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    /// Fixed amount or percentage.
    pub calculation_type: CalculationType,
    /// Minor units for fixed components, percent for percentage components.
    pub value: Decimal,
    /// When false, a percentage reads the running gross instead of base salary.
    #[serde(default = "default_apply_on_base_only")]
    pub apply_on_base_only: bool,
    /// Upper bound on a percentage component's amount, in minor units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_amount: Option<Decimal>,
}

impl Component {
    /// Returns true if the component is a deduction.
    pub fn is_deduction(&self) -> bool {
        self.component_type == ComponentType::Deduction
    }

    fn validate(&self, position: usize) -> EngineResult<()> {
        let label = if self.code.trim().is_empty() {
            format!("component #{}", position + 1)
        } else {
            format!("component '{}'", self.code)
        };

        if self.code.trim().is_empty() {
            return Err(EngineError::validation(format!("{label}: code is required")));
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::validation(format!("{label}: name is required")));
        }
        if self.value.is_sign_negative() {
            return Err(EngineError::validation(format!(
                "{label}: value must not be negative"
            )));
        }

        match self.calculation_type {
            CalculationType::Fixed => {
                if !self.value.fract().is_zero() {
                    return Err(EngineError::validation(format!(
                        "{label}: fixed value must be a whole number of minor units"
                    )));
                }
                if self.cap_amount.is_some() {
                    return Err(EngineError::validation(format!(
                        "{label}: cap_amount only applies to percentage components"
                    )));
                }
            }
            CalculationType::Percentage => {
                if let Some(cap) = self.cap_amount {
                    if cap.is_sign_negative() || !cap.fract().is_zero() {
                        return Err(EngineError::validation(format!(
                            "{label}: cap_amount must be a non-negative whole number of minor units"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// The caller-supplied definition of a new structure version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDefinition {
    /// Display name of the structure.
    pub name: String,
    /// First date the structure applies to.
    pub effective_from: NaiveDate,
    /// Last date the structure applies to, if bounded.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Ordered component rules. Order is part of the contract.
    pub components: Vec<Component>,
}

impl StructureDefinition {
    /// Checks the definition before a version is assigned.
    ///
    /// Rejects empty component lists, duplicate component codes, blank
    /// names, negative values, fractional fixed amounts or caps, caps on
    /// fixed components and an `effective_to` before `effective_from`.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::validation("structure name is required"));
        }
        if self.components.is_empty() {
            return Err(EngineError::validation(
                "salary structure must define at least one component",
            ));
        }
        if let Some(effective_to) = self.effective_to {
            if effective_to < self.effective_from {
                return Err(EngineError::validation(format!(
                    "effective_to {} is before effective_from {}",
                    effective_to, self.effective_from
                )));
            }
        }

        let mut seen = HashSet::new();
        for (position, component) in self.components.iter().enumerate() {
            component.validate(position)?;
            if !seen.insert(component.code.as_str()) {
                return Err(EngineError::validation(format!(
                    "duplicate component code '{}'",
                    component.code
                )));
            }
        }

        Ok(())
    }
}

/// One immutable version of an organization's compensation definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryStructure {
    /// Unique identifier for this version.
    pub id: Uuid,
    /// The owning organization.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// Version number, strictly increasing per organization from 1.
    pub version: u32,
    /// First date the structure applies to.
    pub effective_from: NaiveDate,
    /// Last date the structure applies to, if bounded.
    pub effective_to: Option<NaiveDate>,
    /// Ordered component rules.
    pub components: Vec<Component>,
    /// Set at creation. Not consulted when resolving the active version.
    pub is_active: bool,
    /// Who created this version.
    pub created_by: Uuid,
    /// When this version was created.
    pub created_at: DateTime<Utc>,
}

impl SalaryStructure {
    /// Builds the version that follows `latest` (or version 1 when the
    /// organization has none) from a validated definition.
    pub fn next_version(
        organization_id: Uuid,
        latest: Option<&SalaryStructure>,
        definition: StructureDefinition,
        created_by: Uuid,
    ) -> EngineResult<Self> {
        definition.validate()?;

        let version = latest.map_or(1, |s| s.version + 1);

        Ok(Self {
            id: Uuid::new_v4(),
            organization_id,
            name: definition.name,
            version,
            effective_from: definition.effective_from,
            effective_to: definition.effective_to,
            components: definition.components,
            is_active: true,
            created_by,
            created_at: Utc::now(),
        })
    }
}
