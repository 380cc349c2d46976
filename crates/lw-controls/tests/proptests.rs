use lw_controls::{
    simulate_closed_loop, suggest_step, OutputLimits, PidLaw, PidParams, PidState,
    StandardProfile,
};
use lw_core::linspace;
use lw_model::ProcessModel;
use proptest::prelude::*;

proptest! {
    #[test]
    fn bounded_step_never_exceeds_allowance(
        kp in -10.0f64..10.0,
        ti in 0.0f64..500.0,
        target_kp in -10.0f64..10.0,
        target_ti in 0.0f64..500.0,
        pct in 0.0f64..100.0,
    ) {
        let current = PidParams::new(kp, ti, 0.0);
        let target = PidParams::new(target_kp, target_ti, 0.0);
        let s = suggest_step(&current, &target, pct);

        for step in &s.steps {
            if step.current == 0.0 {
                prop_assert_eq!(step.next, step.target);
                continue;
            }
            let allowance = step.current.abs() * (pct / 100.0);
            prop_assert!((step.next - step.current).abs() <= allowance * (1.0 + 1e-12) + 1e-12);
            if (step.target - step.current).abs() <= allowance {
                prop_assert_eq!(step.next, step.target);
            }
        }
    }

    #[test]
    fn pid_output_respects_limits(
        kp in -1e300f64..1e300,
        ti in 0.0f64..100.0,
        td in 0.0f64..10.0,
        errors in prop::collection::vec(-1e10f64..1e10, 1..50),
    ) {
        let limits = OutputLimits::new(-5.0, 20.0).unwrap();
        let law = PidLaw::new(PidParams::new(kp, ti, td), limits).unwrap();
        let mut state = PidState::default();
        for e in errors {
            let (next, u) = law.update(&state, e, 0.5);
            prop_assert!((-5.0..=20.0).contains(&u));
            prop_assert!(next.integral.is_finite());
            state = next;
        }
    }

    #[test]
    fn closed_loop_stays_bounded_for_extreme_gains(
        kp in prop_oneof![Just(1e300), -1e300f64..1e300],
        ti in prop_oneof![Just(0.0), 1e-3f64..100.0],
        setpoint in -1e10f64..1e10,
    ) {
        let model = ProcessModel::new(1.0, 10.0, 2.0, 0.0).unwrap();
        let trace = simulate_closed_loop(
            &model,
            &PidParams::new(kp, ti, 0.0),
            &StandardProfile::Constant { value: setpoint },
            &linspace(0.0, 50.0, 51),
            OutputLimits::new(0.0, 100.0).unwrap(),
        )
        .unwrap();
        prop_assert!(trace.output.iter().all(|u| (0.0..=100.0).contains(u)));
        prop_assert!(trace.integral.iter().all(|i| i.is_finite()));
        prop_assert!(trace.measurement.iter().all(|y| y.is_finite()));
    }
}
