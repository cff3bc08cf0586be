//! Every scenario passes, for any seed.

use proptest::prelude::*;
use std::sync::Arc;

use wayfarer_core::sequencer::TransportCommand;
use wayfarer_core::PlaybackConfig;
use wayfarer_env::MemoryStore;
use wayfarer_sim::{fixtures, ScenarioId, ScenarioRunner, SimContext, TourDriver};

#[test]
fn all_scenarios_pass() {
    for seed in [1, 42, 1337] {
        let runner = ScenarioRunner::new(seed);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} (seed={}) failed: {:?}",
                scenario,
                seed,
                result.failure_reason
            );
        }
    }
}

#[test]
fn scenarios_pass_at_30hz() {
    let config = PlaybackConfig {
        frame_rate_hz: 30,
        dwell_frames: 20,
        progress_per_frame: 0.05,
        ..PlaybackConfig::default()
    };
    let runner = ScenarioRunner::new(7).with_config(config);
    for scenario in [
        ScenarioId::FullTour,
        ScenarioId::DuplicateStop,
        ScenarioId::PauseResume,
    ] {
        let result = runner.run(scenario);
        assert!(result.passed, "{}: {:?}", scenario, result.failure_reason);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn demo_tour_holds_for_any_seed(seed in any::<u64>(), jitter in 0.0f64..0.8) {
        let config = PlaybackConfig {
            dwell_frames: 30,
            progress_per_frame: 0.02,
            ..PlaybackConfig::default()
        };
        let mut driver = TourDriver::new(
            Arc::new(fixtures::demo_itinerary()),
            &config,
            Arc::new(MemoryStore::new()),
            SimContext::new(seed).rng(0),
            jitter,
        );

        driver.submit(TransportCommand::Play);
        let last = driver.run_until(120.0, |frame| !frame.state.playing);
        prop_assert!(last.is_ok(), "{:?}", last.err());
        prop_assert_eq!(driver.visited().len(), 5);
        prop_assert!(driver.check_notifications().is_ok());
    }
}
