//! Payslip computation.
//!
//! This module turns a salary structure and a base salary into a full
//! payslip breakdown. Components are applied strictly in definition order: a
//! percentage component with `apply_on_base_only = false` reads the gross
//! accumulated so far, so reordering components can change the result.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, CalculationType, Component, ComponentType, PayslipComponent, PayslipComputation,
    SalaryStructure,
};

use super::rounding::round_net;

/// The result of applying one component, before it is folded into totals.
#[derive(Debug, Clone)]
pub struct ComponentAmountResult {
    /// The component's contribution.
    pub line: PayslipComponent,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Applies one component given the base salary and the gross so far.
///
/// # Arguments
///
/// * `component` - The rule to apply
/// * `base_salary` - The employee's base salary in minor units
/// * `running_gross` - Base plus every earning applied before this component
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::apply_component;
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
///
/// let base = Decimal::new(50000, 0);
/// let result = apply_component(&pf, base, base, 1).unwrap();
/// assert_eq!(result.line.amount, Decimal::new(1800, 0));
/// assert!(result.line.capped);
/// ```
pub fn apply_component(
    component: &Component,
    base_salary: Decimal,
    running_gross: Decimal,
    step_number: u32,
) -> EngineResult<ComponentAmountResult> {
    let (amount, capped, audit_step) = match component.calculation_type {
        CalculationType::Fixed => {
            let amount = component.value;
            let audit_step = AuditStep {
                step_number,
                rule_id: component.code.clone(),
                rule_name: component.name.clone(),
                input: serde_json::json!({
                    "calculation_type": "fixed",
                    "type": component.component_type.as_str(),
                    "value": amount.normalize().to_string()
                }),
                output: serde_json::json!({
                    "amount": amount.normalize().to_string(),
                    "capped": false
                }),
                reasoning: format!("Fixed {} of {}", component.component_type.as_str(), amount.normalize()),
            };
            (amount, false, audit_step)
        }
        CalculationType::Percentage => {
            let (target, target_label) = if component.apply_on_base_only {
                (base_salary, "base")
            } else {
                (running_gross, "running gross")
            };

            let computed = target
                .checked_mul(component.value)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .ok_or_else(|| {
                    EngineError::validation(format!(
                        "component '{}': amount overflows",
                        component.code
                    ))
                })?;

            let (amount, capped) = match component.cap_amount {
                Some(cap) if computed > cap => (cap, true),
                _ => (computed, false),
            };

            let reasoning = if capped {
                format!(
                    "{}% of {} {} = {}, capped at {}",
                    component.value.normalize(),
                    target_label,
                    target.normalize(),
                    computed.normalize(),
                    amount.normalize()
                )
            } else {
                format!(
                    "{}% of {} {} = {}",
                    component.value.normalize(),
                    target_label,
                    target.normalize(),
                    amount.normalize()
                )
            };

            let audit_step = AuditStep {
                step_number,
                rule_id: component.code.clone(),
                rule_name: component.name.clone(),
                input: serde_json::json!({
                    "calculation_type": "percentage",
                    "type": component.component_type.as_str(),
                    "percentage": component.value.normalize().to_string(),
                    "apply_on_base_only": component.apply_on_base_only,
                    "target": target.normalize().to_string(),
                    "cap_amount": component.cap_amount.map(|c| c.normalize().to_string())
                }),
                output: serde_json::json!({
                    "amount": amount.normalize().to_string(),
                    "capped": capped
                }),
                reasoning,
            };
            (amount, capped, audit_step)
        }
    };

    Ok(ComponentAmountResult {
        line: PayslipComponent {
            name: component.name.clone(),
            code: component.code.clone(),
            component_type: component.component_type,
            calculation_type: component.calculation_type,
            amount,
            capped,
        },
        audit_step,
    })
}

/// Computes the full payslip for `base_salary` under `structure`.
///
/// Pure and deterministic: the same inputs always produce the same output,
/// component order included. Fails with `ExcessDeductions` when total
/// deductions exceed gross; no partial computation is returned.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::compute_payslip;
/// use payroll_engine::models::{
///     CalculationType, Component, ComponentType, SalaryStructure, StructureDefinition,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let percentage = |code: &str, kind, value, cap| Component {
///     name: code.to_string(),
///     code: code.to_string(),
///     component_type: kind,
///     calculation_type: CalculationType::Percentage,
///     value: Decimal::new(value, 0),
///     apply_on_base_only: true,
///     cap_amount: cap,
/// };
///
/// let structure = SalaryStructure::next_version(
///     Uuid::new_v4(),
///     None,
///     StructureDefinition {
///         name: "Standard".to_string(),
///         effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///         effective_to: None,
///         components: vec![
///             percentage("HRA", ComponentType::Earning, 40, None),
///             percentage("PF", ComponentType::Deduction, 12, Some(Decimal::new(1800, 0))),
///         ],
///     },
///     Uuid::new_v4(),
/// )
/// .unwrap();
///
/// let payslip = compute_payslip(&structure, 50000).unwrap();
/// assert_eq!(payslip.gross, Decimal::new(70000, 0));
/// assert_eq!(payslip.deductions, Decimal::new(1800, 0));
/// assert_eq!(payslip.net_rounded, 68200);
/// ```
pub fn compute_payslip(
    structure: &SalaryStructure,
    base_salary: i64,
) -> EngineResult<PayslipComputation> {
    let base = Decimal::from(base_salary);
    let mut gross = base;
    let mut deductions = Decimal::ZERO;
    let mut components = Vec::with_capacity(structure.components.len());
    let mut audit_steps = Vec::with_capacity(structure.components.len());

    for (index, component) in structure.components.iter().enumerate() {
        let result = apply_component(component, base, gross, index as u32 + 1)?;
        let amount = result.line.amount;

        let total = match component.component_type {
            ComponentType::Earning => &mut gross,
            ComponentType::Deduction => &mut deductions,
        };
        *total = total.checked_add(amount).ok_or_else(|| {
            EngineError::validation(format!("component '{}': total overflows", component.code))
        })?;

        components.push(result.line);
        audit_steps.push(result.audit_step);
    }

    if deductions > gross {
        return Err(EngineError::ExcessDeductions {
            employee_id: None,
            gross,
            deductions,
        });
    }

    let net = gross - deductions;
    let net_rounded = round_net(net)?;

    Ok(PayslipComputation {
        base_salary,
        gross,
        deductions,
        net,
        net_rounded,
        components,
        audit_steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructureDefinition;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn component(
        code: &str,
        component_type: ComponentType,
        calculation_type: CalculationType,
        value: &str,
    ) -> Component {
        Component {
            name: code.to_string(),
            code: code.to_string(),
            component_type,
            calculation_type,
            value: dec(value),
            apply_on_base_only: true,
            cap_amount: None,
        }
    }

    fn structure(components: Vec<Component>) -> SalaryStructure {
        SalaryStructure::next_version(
            Uuid::new_v4(),
            None,
            StructureDefinition {
                name: "Test".to_string(),
                effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                effective_to: None,
                components,
            },
            Uuid::new_v4(),
        )
        .unwrap()
    }

    fn hra_and_pf() -> SalaryStructure {
        let mut pf = component(
            "PF",
            ComponentType::Deduction,
            CalculationType::Percentage,
            "12",
        );
        pf.cap_amount = Some(dec("1800"));
        structure(vec![
            component("HRA", ComponentType::Earning, CalculationType::Percentage, "40"),
            pf,
        ])
    }

    /// PC-001: HRA 40% of base, PF 12% of base capped at 1800
    #[test]
    fn test_hra_and_capped_pf_scenario() {
        let result = compute_payslip(&hra_and_pf(), 50000).unwrap();

        assert_eq!(result.components[0].amount, dec("20000"));
        assert_eq!(result.components[1].amount, dec("1800"));
        assert!(result.components[1].capped);
        assert_eq!(result.gross, dec("70000"));
        assert_eq!(result.deductions, dec("1800"));
        assert_eq!(result.net, dec("68200"));
        assert_eq!(result.net_rounded, 68200);
    }

    /// PC-002: percentage of running gross reads gross at that point
    #[test]
    fn test_percentage_of_running_gross_uses_partial_gross() {
        let mut bonus = component(
            "BONUS",
            ComponentType::Earning,
            CalculationType::Percentage,
            "10",
        );
        bonus.apply_on_base_only = false;
        let special = component(
            "SPECIAL",
            ComponentType::Earning,
            CalculationType::Fixed,
            "5000",
        );

        // BONUS before SPECIAL: 10% of 10000
        let before = compute_payslip(&structure(vec![bonus.clone(), special.clone()]), 10000).unwrap();
        assert_eq!(before.components[0].amount, dec("1000"));
        assert_eq!(before.gross, dec("16000"));

        // BONUS after SPECIAL: 10% of 15000
        let after = compute_payslip(&structure(vec![special, bonus]), 10000).unwrap();
        assert_eq!(after.components[1].amount, dec("1500"));
        assert_eq!(after.gross, dec("16500"));
    }

    /// PC-003: deductions never feed the running gross
    #[test]
    fn test_running_gross_ignores_deductions() {
        let tax = component(
            "DED",
            ComponentType::Deduction,
            CalculationType::Fixed,
            "3000",
        );
        let mut bonus = component(
            "BONUS",
            ComponentType::Earning,
            CalculationType::Percentage,
            "50",
        );
        bonus.apply_on_base_only = false;

        let result = compute_payslip(&structure(vec![tax, bonus]), 10000).unwrap();
        assert_eq!(result.components[1].amount, dec("5000"));
        assert_eq!(result.net, dec("12000"));
    }

    /// PC-004: excess deductions abort
    #[test]
    fn test_excess_deductions_rejected() {
        let result = compute_payslip(
            &structure(vec![component(
                "LOAN",
                ComponentType::Deduction,
                CalculationType::Fixed,
                "10001",
            )]),
            10000,
        );

        match result {
            Err(EngineError::ExcessDeductions {
                employee_id,
                gross,
                deductions,
            }) => {
                assert_eq!(employee_id, None);
                assert_eq!(gross, dec("10000"));
                assert_eq!(deductions, dec("10001"));
            }
            other => panic!("Expected ExcessDeductions, got {:?}", other),
        }
    }

    /// PC-005: deductions equal to gross are allowed
    #[test]
    fn test_deductions_equal_to_gross_allowed() {
        let result = compute_payslip(
            &structure(vec![component(
                "LOAN",
                ComponentType::Deduction,
                CalculationType::Fixed,
                "10000",
            )]),
            10000,
        )
        .unwrap();

        assert_eq!(result.net, Decimal::ZERO);
        assert_eq!(result.net_rounded, 0);
    }

    /// PC-006: fractional net is rounded half up only at the end
    #[test]
    fn test_fractional_amounts_rounded_only_at_end() {
        let hra = component(
            "HRA",
            ComponentType::Earning,
            CalculationType::Percentage,
            "12.5",
        );
        let pt = component(
            "PT",
            ComponentType::Deduction,
            CalculationType::Percentage,
            "0.5",
        );

        // base 1001: HRA 125.125, PT 5.005, net 1121.12
        let result = compute_payslip(&structure(vec![hra, pt]), 1001).unwrap();
        assert_eq!(result.components[0].amount, dec("125.125"));
        assert_eq!(result.components[1].amount, dec("5.005"));
        assert_eq!(result.net, dec("1121.12"));
        assert_eq!(result.net_rounded, 1121);
    }

    #[test]
    fn test_half_minor_unit_rounds_up() {
        let hra = component(
            "HRA",
            ComponentType::Earning,
            CalculationType::Percentage,
            "50",
        );
        let result = compute_payslip(&structure(vec![hra]), 1).unwrap();
        assert_eq!(result.net, dec("1.5"));
        assert_eq!(result.net_rounded, 2);
    }

    #[test]
    fn test_component_order_mirrors_definition() {
        let result = compute_payslip(&hra_and_pf(), 50000).unwrap();
        let codes: Vec<&str> = result.components.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["HRA", "PF"]);

        let steps: Vec<u32> = result.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(steps, vec![1, 2]);
    }

    #[test]
    fn test_audit_reasoning_explains_cap() {
        let result = compute_payslip(&hra_and_pf(), 50000).unwrap();
        let pf_step = &result.audit_steps[1];

        assert_eq!(pf_step.rule_id, "PF");
        assert_eq!(pf_step.reasoning, "12% of base 50000 = 6000, capped at 1800");
        assert_eq!(pf_step.output["capped"].as_bool().unwrap(), true);
        assert_eq!(pf_step.input["cap_amount"].as_str().unwrap(), "1800");
    }

    #[test]
    fn test_cap_above_computed_amount_is_not_applied() {
        let mut pf = component(
            "PF",
            ComponentType::Deduction,
            CalculationType::Percentage,
            "12",
        );
        pf.cap_amount = Some(dec("1800"));

        let result = compute_payslip(&structure(vec![pf]), 10000).unwrap();
        assert_eq!(result.components[0].amount, dec("1200"));
        assert!(!result.components[0].capped);
    }

    #[test]
    fn test_zero_base_salary() {
        let result = compute_payslip(&hra_and_pf(), 0).unwrap();
        assert_eq!(result.gross, Decimal::ZERO);
        assert_eq!(result.net_rounded, 0);
    }

    // ==========================================================================
    // Properties
    // ==========================================================================

    fn arb_component() -> impl Strategy<Value = Component> {
        (
            prop_oneof![Just(ComponentType::Earning), Just(ComponentType::Deduction)],
            prop_oneof![Just(CalculationType::Fixed), Just(CalculationType::Percentage)],
            0i64..100_000,
            0u32..3,
            any::<bool>(),
            proptest::option::of(0i64..50_000),
        )
            .prop_map(|(component_type, calculation_type, raw, scale, on_base, cap)| {
                let (value, cap_amount) = match calculation_type {
                    CalculationType::Fixed => (Decimal::new(raw, 0), None),
                    CalculationType::Percentage => (
                        Decimal::new(raw % 10_000, scale),
                        cap.map(|c| Decimal::new(c, 0)),
                    ),
                };
                Component {
                    name: "generated".to_string(),
                    code: String::new(),
                    component_type,
                    calculation_type,
                    value,
                    apply_on_base_only: on_base,
                    cap_amount,
                }
            })
    }

    fn arb_structure() -> impl Strategy<Value = SalaryStructure> {
        proptest::collection::vec(arb_component(), 1..8).prop_map(|mut components| {
            for (i, c) in components.iter_mut().enumerate() {
                c.code = format!("C{i}");
            }
            structure(components)
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_compute_is_deterministic(s in arb_structure(), base in 0i64..10_000_000) {
            let first = compute_payslip(&s, base);
            let second = compute_payslip(&s, base);
            prop_assert_eq!(
                serde_json::to_string(&first.ok()).unwrap(),
                serde_json::to_string(&second.ok()).unwrap()
            );
        }

        #[test]
        fn prop_totals_close_over_components(s in arb_structure(), base in 0i64..10_000_000) {
            if let Ok(p) = compute_payslip(&s, base) {
                let earnings: Decimal = p.components.iter()
                    .filter(|c| c.component_type == ComponentType::Earning)
                    .map(|c| c.amount)
                    .sum();
                let deductions: Decimal = p.components.iter()
                    .filter(|c| c.component_type == ComponentType::Deduction)
                    .map(|c| c.amount)
                    .sum();
                prop_assert_eq!(p.gross, Decimal::from(base) + earnings);
                prop_assert_eq!(p.deductions, deductions);
                prop_assert_eq!(p.net, p.gross - p.deductions);
                prop_assert_eq!(p.components.len(), s.components.len());
            }
        }

        #[test]
        fn prop_cap_is_never_exceeded(s in arb_structure(), base in 0i64..10_000_000) {
            if let Ok(p) = compute_payslip(&s, base) {
                for (line, rule) in p.components.iter().zip(&s.components) {
                    if let Some(cap) = rule.cap_amount {
                        prop_assert!(line.amount <= cap);
                    }
                }
            }
        }

        #[test]
        fn prop_rounding_is_within_one_unit(s in arb_structure(), base in 0i64..10_000_000) {
            if let Ok(p) = compute_payslip(&s, base) {
                let rounded = Decimal::from(p.net_rounded);
                prop_assert!((rounded - p.net).abs() < Decimal::ONE);
                prop_assert!(p.net_rounded >= 0);
            }
        }

        #[test]
        fn prop_excess_deductions_always_rejected(s in arb_structure(), base in 0i64..10_000_000) {
            let mut gross = Decimal::from(base);
            let mut deductions = Decimal::ZERO;
            for rule in &s.components {
                let amount = apply_component(rule, Decimal::from(base), gross, 1).unwrap().line.amount;
                match rule.component_type {
                    ComponentType::Earning => gross += amount,
                    ComponentType::Deduction => deductions += amount,
                }
            }
            let result = compute_payslip(&s, base);
            if deductions > gross {
                let is_excess = matches!(result, Err(EngineError::ExcessDeductions { .. }));
                prop_assert!(is_excess);
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
