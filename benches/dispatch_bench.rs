//! Performance benchmarks for command dispatch.
//!
//! Measures the full request path (name lookup, parameter binding, register
//! access, response rendering) against a simulated board.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench dispatch_bench
//! ```

use controld_command::{CommandHandler, commands};
use controld_core::Mode;
use controld_hardware::{Board, BoardConfig};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

fn handler() -> (Board, CommandHandler) {
    let board = Board::new(&BoardConfig {
        mode: Mode::Simulated,
        ..BoardConfig::default()
    })
    .unwrap();
    let handler = CommandHandler::new();
    commands::register_all(&handler, &board);
    (board, handler)
}

/// Benchmark representative requests of each command shape.
fn bench_dispatch(c: &mut Criterion) {
    let (_board, handler) = handler();
    let cases: [(&str, &str, Value); 5] = [
        ("gpio_read", "gpio", json!({"bank": 1, "pin": 5})),
        (
            "gpio_write",
            "gpio",
            json!({"bank": 1, "pin": 5, "output": true, "direction": "output"}),
        ),
        ("led_toggle", "led", json!({"led": 0, "enable": true})),
        ("help", "help", json!({"command": "gpio"})),
        ("unknown", "nope", json!({})),
    ];

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));
    for (label, name, params) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(label), params, |b, params| {
            b.iter(|| handler.dispatch(black_box(name), black_box(params)));
        });
    }
    group.finish();
}

/// Benchmark parsing a request line and dispatching it, as the transports do.
fn bench_request_line(c: &mut Criterion) {
    let (_board, handler) = handler();
    let line = r#"{"command": "gpio", "params": {"bank": 2, "pin": 9, "output": false}}"#;

    c.bench_function("request_line", |b| {
        b.iter(|| {
            let request: Value = serde_json::from_str(black_box(line)).unwrap();
            let reply = handler.dispatch(
                request["command"].as_str().unwrap_or_default(),
                &request["params"],
            );
            black_box(reply.to_string())
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_request_line);
criterion_main!(benches);
