use super::*;

fn cli(args: &[&str]) -> Cli {
    Cli::parse_from(std::iter::once("particle-cli").chain(args.iter().copied()))
}

#[test]
fn pointer_parses_with_spaces() {
    let p = parse_pointer(" 400, 300.5 ").expect("pointer");
    assert!((p.x - 400.0).abs() < f64::EPSILON);
    assert!((p.y - 300.5).abs() < f64::EPSILON);
}

#[test]
fn pointer_rejects_bad_input() {
    for raw in ["400", "a,b", "1,2,3", "nan,4", ","] {
        assert!(matches!(parse_pointer(raw), Err(CliError::InvalidPointer(_))), "{raw}");
    }
}

#[test]
fn desktop_run_keeps_full_count_and_stays_contained() {
    let summary = run(&cli(&["--viewport-width", "1280", "--steps", "300", "--seed", "3", "--pointer", "400,300"])).expect("run");
    assert!(summary.profile.is_desktop);
    assert_eq!(summary.particles, 50);
    assert!(summary.interaction);
    assert_eq!(summary.circles, 50);
    assert!(summary.contained);
}

#[test]
fn phone_run_reduces_count_and_disables_interaction() {
    let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
    let summary = run(&cli(&["--width", "375", "--height", "667", "--steps", "10", "--user-agent", ua])).expect("run");
    assert!(summary.profile.is_mobile);
    assert!(summary.profile.is_low_power);
    assert_eq!(summary.particles, 20);
    assert!(!summary.interaction);
}

#[test]
fn zero_steps_draws_nothing() {
    let summary = run(&cli(&["--steps", "0", "--count", "5"])).expect("run");
    assert_eq!(summary.circles, 0);
    assert_eq!(summary.lines, 0);
    assert!(summary.contained);
}

#[test]
fn zero_count_runs() {
    let summary = run(&cli(&["--steps", "5", "--count", "0"])).expect("run");
    assert_eq!(summary.particles, 0);
    assert_eq!(summary.circles, 0);
    assert!(summary.mean_speed.abs() < f64::EPSILON);
}

#[test]
fn empty_surface_is_an_error() {
    let err = run(&cli(&["--width", "0"])).unwrap_err();
    assert!(matches!(err, CliError::EmptySurface { .. }));
}

#[test]
fn missing_config_file_is_an_error() {
    let err = run(&cli(&["--config", "/nonexistent/particles.json"])).unwrap_err();
    assert!(matches!(err, CliError::ReadConfig { .. }));
}

#[test]
fn invalid_config_json_is_an_error() {
    let path = std::env::temp_dir().join(format!("particle-cli-{}.json", std::process::id()));
    fs::write(&path, "{ not json").expect("write");
    let err = run(&cli(&["--config", path.to_str().expect("utf8 path")])).unwrap_err();
    fs::remove_file(&path).expect("cleanup");
    assert!(matches!(err, CliError::Engine(EngineError::Config(_))));
}

#[test]
fn config_file_values_apply_and_flags_override() {
    let path = std::env::temp_dir().join(format!("particle-cli-override-{}.json", std::process::id()));
    fs::write(&path, r#"{ "particle_count": 12, "mouse_interaction": true }"#).expect("write");
    let summary = run(&cli(&["--config", path.to_str().expect("utf8 path"), "--no-interaction", "--steps", "1"]))
        .expect("run");
    fs::remove_file(&path).expect("cleanup");
    assert_eq!(summary.requested, 12);
    assert!(!summary.interaction);
}
