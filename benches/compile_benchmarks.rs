//! Performance benchmarks for the snek pipeline.
//!
//! Programs are generated in memory at several sizes, then each phase is
//! measured on its own:
//! - Type checking
//! - Code generation and module rendering
//! - Execution on the reference VM
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect phase timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

#![allow(clippy::collapsible_if)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use snek::ast::{ClassDef, Expr, FuncDef, Param, Stmt, VarDef};
use snek::{
    BinaryOp, CodeGenerator, CompileOptions, Literal, Program, RecordingHost, Type, TypeChecker,
    Vm, VmConfig,
};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[cfg(feature = "profile-with-puffin")]
fn collect_scopes_recursive(
    stream: &puffin::Stream,
    scope: &puffin::Scope,
    scope_collection: &puffin::ScopeCollection,
    scope_timings: &mut HashMap<String, i64>,
) {
    use puffin::Reader;

    if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
        *scope_timings.entry(details.name().to_string()).or_insert(0) += scope.record.duration_ns;
    }
    if scope.child_begin_position < scope.child_end_position {
        if let Ok(reader) = Reader::with_offset(stream, scope.child_begin_position) {
            if let Ok(children) = reader.read_top_scopes() {
                for child in children {
                    collect_scopes_recursive(stream, &child, scope_collection, scope_timings);
                }
            }
        }
    }
}

/// Print average time per phase over all recorded frames.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };
    let view = frame_view.lock();
    let scope_collection = view.scope_collection();

    let mut scope_timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;
    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread_info, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            if let Ok(scopes) = reader.read_top_scopes() {
                for scope in scopes {
                    collect_scopes_recursive(
                        &stream_info.stream,
                        &scope,
                        scope_collection,
                        &mut scope_timings,
                    );
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frame_count} frames) ===");
    let mut entries: Vec<_> = scope_timings.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    for (name, ns) in entries {
        let avg = if frame_count > 0 { ns / frame_count } else { *ns };
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg as u64)
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

/// A program with `n` counter classes, `n` helper functions and a loop that
/// exercises all of them.
fn workload(n: usize) -> Program {
    let mut program = Program::new()
        .with_var(VarDef::new("i", Type::Int, Literal::Number(0)))
        .with_var(VarDef::new("total", Type::Int, Literal::Number(0)));

    for k in 0..n {
        let class = format!("C{k}");
        let bump = FuncDef::new(
            "bump",
            vec![Param::new("self", Type::object(&class))],
            Type::Int,
            vec![
                Stmt::assign_field(
                    Expr::name("self"),
                    "v",
                    Expr::binary(
                        BinaryOp::Add,
                        Expr::field(Expr::name("self"), "v"),
                        Expr::number(k as i32),
                    ),
                ),
                Stmt::ret(Expr::field(Expr::name("self"), "v")),
            ],
        );
        program = program
            .with_class(ClassDef::new(
                &class,
                vec![VarDef::new("v", Type::Int, Literal::Number(0))],
                vec![bump],
            ))
            .with_func(FuncDef::new(
                &format!("f{k}"),
                vec![Param::new("x", Type::Int)],
                Type::Int,
                vec![
                    Stmt::var_def("o", Type::object(&class), Expr::call(&class, vec![])),
                    Stmt::ret(Expr::binary(
                        BinaryOp::Add,
                        Expr::name("x"),
                        Expr::method_call(Expr::name("o"), "bump", vec![]),
                    )),
                ],
            ));
    }

    let mut body = Vec::new();
    for k in 0..n {
        body.push(Stmt::assign(
            "total",
            Expr::call(&format!("f{k}"), vec![Expr::name("total")]),
        ));
    }
    body.push(Stmt::assign(
        "i",
        Expr::binary(BinaryOp::Add, Expr::name("i"), Expr::number(1)),
    ));
    program
        .with_stmt(Stmt::while_loop(
            Expr::binary(BinaryOp::Less, Expr::name("i"), Expr::number(10)),
            body,
        ))
        .with_stmt(Stmt::expr(Expr::name("total")))
}

const SIZES: [usize; 4] = [1, 10, 100, 500];

fn phase_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let options = CompileOptions::default();

    let mut group = c.benchmark_group("pipeline/check");
    for n in SIZES {
        let program = workload(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &program, |b, program| {
            b.iter(|| {
                let typed = TypeChecker::check(black_box(program.clone())).unwrap();
                end_profiling_frame();
                black_box(typed.ty)
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("pipeline/generate");
    for n in SIZES {
        let typed = TypeChecker::check(workload(n)).unwrap();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &typed, |b, typed| {
            b.iter(|| {
                let module = CodeGenerator::generate(black_box(typed), &options).unwrap();
                let text = module.to_string();
                end_profiling_frame();
                black_box(text.len())
            });
        });
    }
    group.finish();

    let mut group = c.benchmark_group("pipeline/run");
    for n in SIZES {
        let module = snek::compile_program(workload(n), &options).unwrap();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &module, |b, module| {
            b.iter(|| {
                let mut vm = Vm::new(module, RecordingHost::new(), VmConfig::default());
                let result = vm.run(&options.entry_export).unwrap();
                end_profiling_frame();
                black_box(result)
            });
        });
    }
    group.finish();

    print_profiling_stats();
}

criterion_group!(benches, phase_benchmarks);
criterion_main!(benches);
