use lw_controls::{
    calculate_pid, simulate_closed_loop, suggest_step, Aggressiveness, ClosedLoopSimulator,
    OutputLimits, PidParams, SimulationOptions, StandardProfile,
};
use lw_core::linspace;
use lw_model::ProcessModel;

fn step_profile(initial: f64, final_value: f64, at: f64) -> StandardProfile {
    StandardProfile::Step {
        initial,
        final_value,
        at,
    }
}

#[test]
fn pi_loop_tracks_setpoint_step() {
    let model = ProcessModel::new(1.0, 10.0, 0.0, 0.0).unwrap();
    let pid = PidParams::new(1.0, 10.0, 0.0);
    let grid = linspace(0.0, 100.0, 101);
    let limits = OutputLimits::new(-100.0, 100.0).unwrap();

    let trace =
        simulate_closed_loop(&model, &pid, &step_profile(0.0, 10.0, 10.0), &grid, limits).unwrap();

    assert_eq!(trace.len(), 101);
    assert_eq!(trace.measurement[10], 0.0);
    assert!(trace.measurement[11] > trace.measurement[10]);
    assert!((trace.measurement[100] - 10.0).abs() < 0.1);
}

#[test]
fn output_never_leaves_limits() {
    let model = ProcessModel::new(10.0, 1.0, 0.0, 0.0).unwrap();
    let pid = PidParams::new(100.0, 0.1, 0.0);
    let grid = linspace(0.0, 20.0, 201);
    let limits = OutputLimits::new(0.0, 50.0).unwrap();

    let trace = simulate_closed_loop(
        &model,
        &pid,
        &StandardProfile::Constant { value: 100.0 },
        &grid,
        limits,
    )
    .unwrap();

    assert!(trace.output.iter().all(|&u| (0.0..=50.0).contains(&u)));
    assert!(trace.output.iter().any(|&u| u == 50.0));
}

#[test]
fn anti_windup_releases_saturation_immediately() {
    let model = ProcessModel::new(1.0, 10.0, 0.0, 0.0).unwrap();
    let pid = PidParams::new(2.0, 5.0, 0.0);
    let grid = linspace(0.0, 100.0, 101);
    let options = SimulationOptions {
        limits: OutputLimits::new(0.0, 10.0).unwrap(),
        ..SimulationOptions::default()
    };
    let sim = ClosedLoopSimulator::new(model, options).unwrap();

    // Unreachable setpoint until t = 50, then an easy one.
    let trace = sim
        .simulate(&pid, &|t: f64| if t < 50.0 { 100.0 } else { 5.0 }, &grid)
        .unwrap();

    assert!(trace.output[..50].iter().all(|&u| u == 10.0));
    assert!(trace.output[50] < 10.0);
    assert!(trace.integral.iter().all(|i| i.abs() <= 200.0));
    assert!((trace.measurement[100] - 5.0).abs() < 0.05);

    // Back-calculation keeps the PI identity exact even while clamped.
    for k in 0..trace.len() {
        let e = trace.setpoint[k] - trace.measurement[k];
        let rebuilt = pid.kp * e + trace.integral[k];
        assert!((rebuilt - trace.output[k]).abs() < 1e-9, "sample {k}");
    }
}

#[test]
fn dead_time_shifts_response() {
    let model = ProcessModel::new(1.0, 5.0, 3.0, 0.0).unwrap();
    let pid = PidParams::new(0.5, 10.0, 0.0);
    let grid = linspace(0.0, 50.0, 51);
    let trace = simulate_closed_loop(
        &model,
        &pid,
        &StandardProfile::Constant { value: 1.0 },
        &grid,
        OutputLimits::default(),
    )
    .unwrap();

    assert!(trace.measurement[..4].iter().all(|&y| y == 0.0));
    assert!(trace.measurement[4] > 0.0);
}

#[test]
fn bounded_workflow_ramps_toward_target() {
    let target = PidParams::new(0.2, 50.0, 0.0);
    let mut current = PidParams::new(0.1, 50.0, 0.0);
    let mut history = vec![current.kp];

    for _ in 0..2 {
        current = suggest_step(&current, &target, 20.0).next_step;
        history.push(current.kp);
    }

    assert!((history[1] - 0.12).abs() < 1e-12);
    assert!((history[2] - 0.144).abs() < 1e-12);

    for _ in 0..10 {
        current = suggest_step(&current, &target, 20.0).next_step;
    }
    assert_eq!(current, target);
}

#[test]
fn tuned_loop_settles_on_model() {
    let model = ProcessModel::new(2.0, 50.0, 10.0, 50.0).unwrap();
    let pid = calculate_pid(&model, Aggressiveness::Moderate);
    let options = SimulationOptions {
        limits: OutputLimits::new(-100.0, 100.0).unwrap(),
        ..SimulationOptions::default()
    };
    let sim = ClosedLoopSimulator::new(model, options).unwrap();
    let grid = linspace(0.0, 600.0, 601);

    let trace = sim
        .simulate(&pid, &step_profile(50.0, 60.0, 50.0), &grid)
        .unwrap();

    let last = *trace.measurement.last().unwrap();
    assert!((last - 60.0).abs() < 0.1, "final measurement {last}");
    let peak = trace.measurement.iter().cloned().fold(f64::MIN, f64::max);
    assert!(peak < 62.0, "peak {peak}");
}

#[test]
fn overflowing_gain_keeps_output_clamped() {
    let model = ProcessModel::new(1.0, 10.0, 0.0, 0.0).unwrap();
    let pid = PidParams::new(1e300, 1.0, 0.0);
    let grid = linspace(0.0, 100.0, 101);
    let limits = OutputLimits::new(0.0, 100.0).unwrap();

    let trace = simulate_closed_loop(
        &model,
        &pid,
        &StandardProfile::Constant { value: 1e10 },
        &grid,
        limits,
    )
    .unwrap();

    assert!(trace.output.iter().all(|&u| u == 100.0));
    assert!(trace.integral.iter().all(|i| i.is_finite()));
    assert!(trace.measurement.iter().all(|y| y.is_finite()));
    assert!(trace.measurement[100] > trace.measurement[1]);
}
