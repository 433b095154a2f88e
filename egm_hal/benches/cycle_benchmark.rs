//! Cycle benchmark: cyclic read → command update → write through the adapter.
//!
//! Uses the simulated channel manager so only the adapter's own per-cycle
//! work (lifecycle guard, handle resolution, motion data copies) is measured.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use egm_common::hal::config::{ComponentInfo, HardwareInfo, InterfaceInfo};
use egm_common::hal::driver::SystemInterface;
use egm_hal::EgmSystem;
use egm_hal::drivers::simulation::{SnapshotDescriptionProvider, manager_factory};

fn interface(name: &str, bounds: Option<(&str, &str)>) -> InterfaceInfo {
    InterfaceInfo {
        name: name.to_string(),
        min: bounds.map(|b| b.0.to_string()),
        max: bounds.map(|b| b.1.to_string()),
    }
}

/// Local-mode cell with `n` revolute joints.
fn cell(n: usize) -> HardwareInfo {
    let joints = (1..=n)
        .map(|i| ComponentInfo {
            name: format!("joint_{i}"),
            command_interfaces: vec![
                interface("position", Some(("-3.14", "3.14"))),
                interface("velocity", None),
            ],
            state_interfaces: vec![interface("position", None), interface("velocity", None)],
            ..Default::default()
        })
        .collect();

    HardwareInfo {
        name: "bench".to_string(),
        parameters: [("configure_via_rws", "false"), ("egm_port", "6511")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        joints,
    }
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_io");
    group.sample_size(500);

    for &n_joints in &[1usize, 6, 7, 12, 24] {
        let provider = SnapshotDescriptionProvider::from_description(Default::default());
        let mut system = EgmSystem::new(Box::new(provider), manager_factory());
        if let Err(e) = system
            .on_init(&cell(n_joints))
            .and_then(|_| system.on_activate())
        {
            panic!("bench setup failed: {e}");
        }

        let commands = system.export_command_interfaces().unwrap_or_default();
        let period = Duration::from_micros(4000);
        let mut cycle = 0u64;

        group.bench_with_input(BenchmarkId::new("joints", n_joints), &n_joints, |b, _| {
            b.iter(|| {
                cycle += 1;
                let _ = system.read(period);
                let target = (cycle as f64 * 0.004).sin();
                for handle in &commands {
                    let _ = system.set_command(handle, target);
                }
                let _ = system.write(black_box(period));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
