//! Integration tests for the sampling loop and analysis chain
//!
//! These tests drive the public API end to end with scripted sources:
//! - Light-mode classification and celebration scenarios
//! - Mode switches taking effect without a restart
//! - Start/stop lifecycle and handle release
//! - Error propagation from the source and from analysis

use std::time::{Duration, Instant};

use futures::StreamExt;
use noise_monitor::audio::{AudioFrame, ScriptedSource};
use noise_monitor::{
    AcquisitionError, AnalysisError, AppConfig, Category, CelebrationReason, ComplianceState,
    ErrorCode, Intensity, LevelScale, Mode, MonitorError, PolicySetting, Reading, SamplingLoop,
    Session,
};
use tokio::sync::broadcast;

fn test_config(mode: Mode) -> AppConfig {
    let mut config = AppConfig::default();
    config.cadence.tick_interval_ms = 2;
    config.hard_mode = mode.is_hard();
    config
}

fn scripted(levels: &[f64]) -> ScriptedSource {
    ScriptedSource::from_levels(levels, &LevelScale::default(), 128)
}

fn next_reading(rx: &mut broadcast::Receiver<Reading>) -> Reading {
    loop {
        match rx.blocking_recv() {
            Ok(reading) => return reading,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(err) => panic!("reading channel closed: {}", err),
        }
    }
}

#[test]
fn test_light_mode_quiet_room() {
    let config = test_config(Mode::Light);
    let mut sampling_loop = SamplingLoop::new(scripted(&[15.0]), config.clone(), config.mode_handle());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    let reading = next_reading(&mut rx);
    sampling_loop.stop().unwrap();

    assert_eq!(reading.mode, Mode::Light);
    assert_eq!(reading.category, Category::Low);
    assert_eq!(reading.compliance, ComplianceState::WithinLimit);
    assert!((reading.level - 15.0).abs() < 0.5, "level {}", reading.level);
}

#[test]
fn test_light_mode_loud_then_restored() {
    let config = test_config(Mode::Light);
    let source = scripted(&[45.0, 45.0, 35.0]);
    let mut sampling_loop = SamplingLoop::new(source.clone(), config.clone(), config.mode_handle());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    let readings: Vec<Reading> = (0..6).map(|_| next_reading(&mut rx)).collect();
    sampling_loop.stop().unwrap();

    assert_eq!(readings[0].category, Category::High);
    assert_eq!(readings[0].compliance, ComplianceState::Exceeding);

    let fired: Vec<usize> = readings
        .iter()
        .enumerate()
        .filter(|(_, r)| r.event.is_some())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(fired, vec![2], "exactly one event, on the third sample");
    assert_eq!(
        readings[2].event.map(|e| e.reason),
        Some(CelebrationReason::LimitRestored)
    );
    // the celebration outlives the tick that fired it
    assert!(readings[3].is_celebrating());
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_breach_policy_fires_on_fifth_sample() {
    let mut config = test_config(Mode::Light);
    config.celebration.policy = PolicySetting::OnBreach;
    let source = scripted(&[45.0, 45.0, 35.0, 35.0, 45.0]);
    let mut sampling_loop = SamplingLoop::new(source, config.clone(), config.mode_handle());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    let readings: Vec<Reading> = (0..5).map(|_| next_reading(&mut rx)).collect();
    sampling_loop.stop().unwrap();

    let reasons: Vec<Option<CelebrationReason>> =
        readings.iter().map(|r| r.event.map(|e| e.reason)).collect();
    assert_eq!(
        reasons,
        vec![None, None, None, None, Some(CelebrationReason::LimitBreached)]
    );
}

#[test]
fn test_hard_mode_switch_at_fifty() {
    let config = test_config(Mode::Light);
    let mode = config.mode_handle();
    let source = scripted(&[50.0]);
    let mut sampling_loop = SamplingLoop::new(source.clone(), config, mode.clone());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    let before = next_reading(&mut rx);
    assert_eq!(before.compliance, ComplianceState::Exceeding);

    mode.set(Mode::Hard);
    let after = loop {
        let reading = next_reading(&mut rx);
        if reading.mode == Mode::Hard {
            break reading;
        }
    };
    sampling_loop.stop().unwrap();

    assert_eq!(after.compliance, ComplianceState::WithinLimit);
    assert_eq!(after.category, Category::Low);
    // no restart happened
    assert_eq!(source.opened_total(), 1);
}

#[test]
fn test_high_water_latch_holds_maximum_intensity() {
    let config = test_config(Mode::Light);
    let source = scripted(&[30.0, 65.0, 10.0]);
    let mut sampling_loop = SamplingLoop::new(source, config.clone(), config.mode_handle());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    let readings: Vec<Reading> = (0..4).map(|_| next_reading(&mut rx)).collect();
    sampling_loop.stop().unwrap();

    assert!(!readings[0].latched);
    assert_eq!(readings[0].intensity, Intensity::Elevated);
    assert!(readings[1..].iter().all(|r| r.latched));
    assert_eq!(readings[2].category, Category::Low);
    assert_eq!(readings[2].intensity, Intensity::Maximum);
}

#[test]
fn test_stop_before_start_and_twice() {
    let config = test_config(Mode::Hard);
    let source = scripted(&[80.0]);
    let mut sampling_loop = SamplingLoop::new(source.clone(), config.clone(), config.mode_handle());

    assert!(sampling_loop.stop().is_ok());
    sampling_loop.start().unwrap();
    assert!(sampling_loop.stop().is_ok());
    assert!(sampling_loop.stop().is_ok());
    assert_eq!(source.open_handles(), 0);
}

#[test]
fn test_permission_denied_surfaces_with_code() {
    let config = test_config(Mode::Hard);
    let mut sampling_loop = SamplingLoop::new(
        ScriptedSource::failing(AcquisitionError::PermissionDenied),
        config.clone(),
        config.mode_handle(),
    );

    let err = sampling_loop.start().unwrap_err();
    assert_eq!(
        err,
        MonitorError::Acquisition(AcquisitionError::PermissionDenied)
    );
    assert_eq!(err.code(), 1001);
    assert!(!sampling_loop.is_running());
}

#[test]
fn test_invalid_frame_is_reported_on_stop() {
    let config = test_config(Mode::Light);
    let source = ScriptedSource::new(vec![AudioFrame::uniform(16, 10), AudioFrame::default()]);
    let mut sampling_loop = SamplingLoop::new(source.clone(), config.clone(), config.mode_handle());
    let mut rx = sampling_loop.subscribe();

    sampling_loop.start().unwrap();
    // the valid frame is still published
    let first = next_reading(&mut rx);
    assert_eq!(first.category, Category::Low);

    let deadline = Instant::now() + Duration::from_secs(5);
    while sampling_loop.is_running() {
        assert!(Instant::now() < deadline, "worker did not stop");
        std::thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(source.open_handles(), 0);
    assert_eq!(
        sampling_loop.stop(),
        Err(MonitorError::Analysis(AnalysisError::InvalidFrame))
    );
}

#[test]
fn test_session_summary_from_stream() {
    let config = test_config(Mode::Light);
    let mut sampling_loop = SamplingLoop::new(
        scripted(&[45.0, 45.0, 35.0, 15.0]),
        config.clone(),
        config.mode_handle(),
    );
    let stream = sampling_loop.reading_stream();

    sampling_loop.start().unwrap();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build test runtime");
    let readings: Vec<Reading> = runtime.block_on(stream.take(4).collect());
    sampling_loop.stop().unwrap();

    let mut session = Session::new(config.history_capacity);
    for reading in &readings {
        session.record(reading);
    }
    let summary = session.summary();

    assert_eq!(summary.readings, 4);
    assert_eq!(summary.limit_restored, 1);
    assert_eq!(summary.within_limit_ratio, Some(0.5));
    assert_eq!(session.history().len(), 4);
}
