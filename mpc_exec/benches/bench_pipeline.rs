use criterion::{black_box, criterion_group, criterion_main, Criterion};

use mpc_lib::{
    ctrl_loop::ControlLoop,
    frame,
    optimiser::RolloutOptimiser,
    params::Params,
    pose::{Pose, Waypoints},
    ref_fit,
};
use util::module::State;

const TELEMETRY_FRAME: &str = "42[\"telemetry\",{\"ptsx\":[-32.16173,-43.49173,-61.09,-78.29172,-93.05002,-107.7717],\"ptsy\":[113.361,105.941,92.88499,78.73102,65.34102,50.57938],\"psi_unity\":4.120315,\"psi\":3.733651,\"x\":-40.62,\"y\":108.73,\"steering_angle\":0,\"throttle\":0,\"speed\":20}]";

fn bench_fit(c: &mut Criterion) {
    let pose = Pose {
        x_m: -40.62,
        y_m: 108.73,
        heading_rad: 3.733651,
        speed_ms: 9.0,
    };
    let world = Waypoints::from_xy(
        &[-32.16173, -43.49173, -61.09, -78.29172, -93.05002, -107.7717],
        &[113.361, 105.941, 92.88499, 78.73102, 65.34102, 50.57938],
    );

    c.bench_function("transform_and_fit", |b| {
        b.iter(|| {
            let pts = frame::to_vehicle_frame(black_box(&world), black_box(&pose));
            ref_fit::fit(&pts)
        })
    });
}

fn bench_cycle(c: &mut Criterion) {
    let params = Params {
        latency_s: 0.0,
        ..Params::default()
    };
    let mut ctrl = ControlLoop::new(RolloutOptimiser::new(&params));
    if ctrl.init(params).is_err() {
        return;
    }

    c.bench_function("control_cycle", |b| {
        b.iter(|| {
            let out = ctrl.proc(black_box(TELEMETRY_FRAME));
            if out.is_ok() {
                let _ = ctrl.hold_elapsed();
                let _ = ctrl.cycle_complete();
            }
            out.is_ok()
        })
    });
}

criterion_group!(benches, bench_fit, bench_cycle);
criterion_main!(benches);
