use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use sysmon::app::SortMode;
use sysmon::kernel::{Channel, ProcState, ProcessTable};
use sysmon::telemetry::ProcessRecord;
use sysmon::telemetry::counters::SyscallRegistry;
use sysmon::telemetry::procs::{get_process_info, process_queue_summary};
use sysmon::ui::proc_table;
use sysmon::ui::theme::Theme;

const STATES: [ProcState; 4] = [
    ProcState::Sleeping,
    ProcState::Runnable,
    ProcState::Running,
    ProcState::Zombie,
];

fn full_table(nproc: usize) -> ProcessTable {
    let table = ProcessTable::new(nproc);
    if let Ok(mut t) = table.lock() {
        for i in 0..nproc {
            let Ok(pid) = t.alloc(&format!("proc_{i}"), 1, 4096 * (i as u32 % 8 + 1)) else {
                break;
            };
            let _ = t.set_state(pid, STATES[i % STATES.len()], Channel::NONE);
        }
    }
    table
}

fn bench_syscall_record(c: &mut Criterion) {
    let registry = SyscallRegistry::new();
    c.bench_function("syscall_record", |b| {
        let mut id = 0u32;
        b.iter(|| {
            id = id % 26 + 1;
            registry.record(black_box(id));
        });
    });
}

fn bench_process_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_snapshot_64_256_1024");
    for nproc in [64usize, 256, 1024] {
        let table = full_table(nproc);
        let mut out = vec![ProcessRecord::default(); nproc];
        group.bench_with_input(BenchmarkId::from_parameter(nproc), &table, |b, table| {
            b.iter(|| {
                let n = get_process_info(table, &mut out, nproc).unwrap_or(0);
                black_box(n);
            });
        });
    }
    group.finish();
}

fn bench_queue_summary(c: &mut Criterion) {
    let table = full_table(1024);
    c.bench_function("queue_summary_1024", |b| {
        b.iter(|| black_box(process_queue_summary(&table).ok()));
    });
}

fn bench_proc_table_render(c: &mut Criterion) {
    let table = full_table(64);
    let mut procs = vec![ProcessRecord::default(); 64];
    let n = get_process_info(&table, &mut procs, 64).unwrap_or(0);
    procs.truncate(n);
    let theme = Theme::dark();
    let mut terminal = match Terminal::new(TestBackend::new(160, 50)) {
        Ok(t) => t,
        Err(_) => return,
    };
    c.bench_function("proc_table_render_64", |b| {
        b.iter(|| {
            let _ = terminal.draw(|frame| {
                proc_table::render(frame, frame.area(), &procs, 3, SortMode::Pid, &theme);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_syscall_record,
    bench_process_snapshot,
    bench_queue_summary,
    bench_proc_table_render
);
criterion_main!(benches);
