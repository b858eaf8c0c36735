//! Performance benchmarks for the payroll engine.
//!
//! This benchmark suite covers:
//! - Single payslip calculation against a four-component structure
//! - Payslip preview through the HTTP router
//! - Payroll runs of 100 and 1000 employees
//! - Sequential vs parallel batch computation
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use axum::{body::Body, http::Request};
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use tower::ServiceExt;
use uuid::Uuid;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::audit::InMemoryAuditLog;
use payroll_engine::calculation::{compute_batch, compute_payslip};
use payroll_engine::engine::PayrollEngine;
use payroll_engine::models::{
    Actor, CalculationType, Component, ComponentType, EmployeeSalary, SalaryStructure,
    StructureDefinition,
};

fn component(
    code: &str,
    component_type: ComponentType,
    calculation_type: CalculationType,
    value: i64,
    cap: Option<i64>,
) -> Component {
    Component {
        name: code.to_string(),
        code: code.to_string(),
        component_type,
        calculation_type,
        value: Decimal::new(value, 0),
        apply_on_base_only: true,
        cap_amount: cap.map(|c| Decimal::new(c, 0)),
    }
}

/// HRA 40%, special allowance 2500, PF 12% capped at 1800, professional tax 200.
fn create_definition() -> StructureDefinition {
    StructureDefinition {
        name: "Benchmark".to_string(),
        effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        effective_to: None,
        components: vec![
            component("HRA", ComponentType::Earning, CalculationType::Percentage, 40, None),
            component("SPECIAL", ComponentType::Earning, CalculationType::Fixed, 2500, None),
            component("PF", ComponentType::Deduction, CalculationType::Percentage, 12, Some(1800)),
            component("PT", ComponentType::Deduction, CalculationType::Fixed, 200, None),
        ],
    }
}

fn create_structure() -> SalaryStructure {
    SalaryStructure::next_version(Uuid::new_v4(), None, create_definition(), Uuid::new_v4())
        .unwrap()
}

fn create_employees(count: usize) -> Vec<EmployeeSalary> {
    (0..count)
        .map(|i| EmployeeSalary {
            employee_id: format!("emp_{:05}", i),
            base_salary: 30_000 + (i as i64 % 97) * 1_013,
        })
        .collect()
}

/// Creates an in-memory engine with one structure version for `org`.
fn create_engine(org: Uuid, actor: &Actor) -> PayrollEngine {
    let engine = PayrollEngine::in_memory(Arc::new(InMemoryAuditLog::new()));
    engine
        .create_salary_structure(org, create_definition(), actor)
        .unwrap();
    engine
}

/// Benchmark: Single payslip calculation.
fn bench_single_payslip(c: &mut Criterion) {
    let structure = create_structure();

    c.bench_function("single_payslip", |b| {
        b.iter(|| black_box(compute_payslip(&structure, black_box(50_000)).unwrap()))
    });
}

/// Benchmark: Payslip preview through the router, including JSON handling.
fn bench_preview_endpoint(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::new(PayrollEngine::in_memory(Arc::new(InMemoryAuditLog::new())));
    let router = create_router(state);
    let body = serde_json::json!({
        "structure": create_definition(),
        "base_salary": 50_000,
    })
    .to_string();

    c.bench_function("preview_endpoint", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/payslips/preview")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

fn bench_run(c: &mut Criterion, name: &str, employee_count: usize) {
    let org = Uuid::new_v4();
    let actor = Actor::new(Uuid::new_v4());
    let engine = create_engine(org, &actor);
    let employees = create_employees(employee_count);
    let period_start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let period_end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Elements(employee_count as u64));
    group.sample_size(20);
    group.bench_function("run", |b| {
        b.iter(|| {
            let run = engine
                .start_payroll_run(org, period_start, period_end, employees.clone(), &actor)
                .unwrap();
            black_box(run)
        })
    });
    group.finish();
}

/// Benchmark: Payroll run of 100 employees, persisted and audited.
fn bench_run_100(c: &mut Criterion) {
    bench_run(c, "run_100", 100);
}

/// Benchmark: Payroll run of 1000 employees, persisted and audited.
fn bench_run_1000(c: &mut Criterion) {
    bench_run(c, "run_1000", 1000);
}

/// Benchmark: Batch computation with and without the parallel path.
fn bench_batch_scaling(c: &mut Criterion) {
    let structure = create_structure();
    let mut group = c.benchmark_group("batch_scaling");

    for count in [10usize, 100, 1000, 5000].iter() {
        let employees = create_employees(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("sequential", count), count, |b, _| {
            b.iter(|| black_box(compute_batch(&structure, &employees, 0).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("parallel", count), count, |b, _| {
            b.iter(|| black_box(compute_batch(&structure, &employees, 1).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_payslip,
    bench_preview_endpoint,
    bench_run_100,
    bench_run_1000,
    bench_batch_scaling,
);
criterion_main!(benches);
