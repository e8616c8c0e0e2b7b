//! Criterion benchmarks for wowlua critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Parser: tokenizing and parsing Lua chunks
//! - Preprocessor: variable substitution and block macro expansion
//! - Analyzer: symbol extraction over a parsed file
//! - Graph: dependency ordering across many files

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use indexmap::IndexMap;
use wowlua::analyze::Analyzer;
use wowlua::build::resolve_order;
use wowlua::config::VariableValue;
use wowlua::lua::{LuaParser, StandardParser};
use wowlua::preprocess::directives::expand_file;
use wowlua::preprocess::variables::substitute;
use wowlua::preprocess::DirectiveRegistry;
use wowlua::source::SourceFile;
use wowlua::version::GameVersion;

// =============================================================================
// Test Data Generators
// =============================================================================

/// Generate a Lua module declaring `n` functions on a global table.
fn make_module(name: &str, n: usize) -> String {
    let mut source = format!("{} = {{}}\nlocal cache = {{}}\n\n", name);
    for i in 0..n {
        source.push_str(&format!(
            "function {name}:Method{i}(a, b)\n    local value = cache[a] or (b * {i} + 1)\n    if value > 10 then\n        print(\"large\", value)\n    end\n    return value .. \"@VERSION@\"\nend\n\n",
            name = name,
            i = i
        ));
    }
    source
}

/// Generate a module wrapped in version blocks.
fn make_versioned_module(n: usize) -> String {
    let mut source = String::new();
    for i in 0..n {
        source.push_str(&format!(
            "--{{@GameVersion Retail\nRetailThing{i} = C_Container.GetContainerNumSlots({i})\n--}}@GameVersion\nShared{i} = {i}\n",
            i = i
        ));
    }
    source
}

/// Generate a chain of `n` files where each one uses the previous one's global.
fn make_chain(n: usize) -> Vec<SourceFile> {
    (0..n)
        .rev()
        .map(|i| {
            let mut file = SourceFile::new("/src", format!("File{}.lua", i), "");
            file.declared_globals.insert(format!("G{}", i));
            if i > 0 {
                file.imported_globals.insert(format!("G{}", i - 1));
            }
            file
        })
        .collect()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    let parser = StandardParser;

    for size in [10, 100, 500] {
        let source = make_module("Bench", size);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_module", size), &source, |b, source| {
            b.iter(|| parser.parse(black_box(source)))
        });
    }

    group.finish();
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");

    let mut variables = IndexMap::new();
    variables.insert("VERSION".to_string(), VariableValue::String("1.0.0".to_string()));
    let source = make_module("Bench", 100);
    group.bench_function("substitute_100_methods", |b| {
        b.iter(|| {
            let mut file = SourceFile::new("/src", "Bench.lua", &source);
            substitute(black_box(&mut file), &variables)
        })
    });

    let registry = DirectiveRegistry::builtin();
    let versions = GameVersion::ALL;
    let source = make_versioned_module(100);
    group.bench_function("expand_100_blocks", |b| {
        b.iter(|| {
            let mut file = SourceFile::new("/src", "Versioned.lua", &source);
            expand_file(&registry, black_box(&mut file), &versions)
        })
    });

    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let parser = StandardParser;
    let analyzer = Analyzer::new(&parser);

    for size in [10, 100] {
        let source = make_module("Bench", size).replace("@VERSION@", "1.0.0");
        group.bench_with_input(BenchmarkId::new("analyze_module", size), &source, |b, source| {
            b.iter(|| {
                let mut file = SourceFile::new("/src", "Bench.lua", source);
                analyzer.analyze(black_box(&mut file))
            })
        });
    }

    group.finish();
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");

    for size in [10, 100, 500] {
        let files = make_chain(size);
        group.bench_with_input(BenchmarkId::new("resolve_chain", size), &files, |b, files| {
            b.iter(|| resolve_order(black_box(files), &[]))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parser, bench_preprocess, bench_analyze, bench_graph);
criterion_main!(benches);
