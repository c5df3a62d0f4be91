//! Coordinator tests - show/hide timing, progress and timer ownership,
//! replayed in virtual time

use std::time::Duration;

use autentica_preloader::overlay::OverlayRenderer;
use autentica_preloader::sim::{OverlayCall, Simulation, VirtualScheduler};
use autentica_preloader::{Coordinator, Mode, Phase, PreloaderConfig, TimerKind};

fn sim() -> Simulation {
    Simulation::new(PreloaderConfig::default())
}

#[test]
fn navigation_hide_before_min_display_is_deferred() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(200);
    sim.act(|c| c.hide(false));

    assert!(sim.overlay().fully_visible(), "early hide must not take effect");
    assert!(sim.coordinator.state().debug_snapshot().hide_pending);

    sim.run_until_ms(1499);
    assert!(sim.overlay().fully_visible());
    assert!(sim.coordinator.is_visible());

    sim.run_until_ms(1500);
    assert!(sim.overlay().displayed);
    assert!(sim.overlay().fading, "fade-out starts at the minimum display time");
    assert_eq!(sim.coordinator.progress(), 100.0);

    sim.run_until_ms(1999);
    assert!(sim.overlay().displayed);

    sim.run_until_ms(2000);
    assert!(!sim.overlay().displayed, "node hidden after the 500ms grace period");
    assert!(!sim.overlay().scroll_locked);
    assert_eq!(sim.coordinator.progress(), 0.0);
    assert_eq!(sim.coordinator.state().phase, Phase::Hidden);
}

#[test]
fn navigation_hide_after_min_display_is_immediate() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(2000);
    sim.act(|c| c.hide(false));

    assert!(sim.overlay().fading);
    assert!(!sim.coordinator.is_visible());
    assert_eq!(sim.coordinator.state().mode, Mode::Normal);
    assert_eq!(sim.coordinator.state().started_at, None);

    sim.run_until_ms(2500);
    assert!(!sim.overlay().displayed);
}

#[test]
fn forced_navigation_hide_skips_min_display() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(100);
    sim.act(|c| c.hide(true));
    assert!(sim.overlay().fading);
    sim.run_until_ms(600);
    assert!(!sim.overlay().displayed);
}

#[test]
fn normal_hide_is_immediate() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.run_until_ms(10);
    sim.act(|c| c.hide(false));
    assert!(sim.overlay().fading);
}

#[test]
fn forgotten_normal_overlay_is_forced_hidden_at_6s() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.run_until_ms(5999);
    assert!(sim.overlay().fully_visible());
    sim.run_until_ms(6000);
    assert!(!sim.coordinator.is_visible());
    sim.run_until_ms(6500);
    assert!(!sim.overlay().displayed);
}

#[test]
fn forgotten_navigation_overlay_is_forced_hidden_at_8s() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(7999);
    assert!(sim.overlay().fully_visible());
    sim.run_until_ms(8000);
    assert!(!sim.coordinator.is_visible());
    sim.run_until_ms(8500);
    assert!(!sim.overlay().displayed);
}

#[test]
fn busy_overlay_keeps_its_message_and_uses_5s_guard() {
    let mut sim = sim();
    sim.act(|c| c.show_busy("Processando formulário..."));
    sim.run_until_ms(4000);
    assert_eq!(sim.overlay().message, "Processando formulário...");
    sim.run_until_ms(4999);
    assert!(sim.coordinator.is_visible());
    sim.run_until_ms(5000);
    assert!(!sim.coordinator.is_visible());
}

#[test]
fn hide_without_overlay_is_noop() {
    let mut sim = sim();
    sim.act(|c| c.hide(false));
    sim.act(|c| c.hide(true));
    assert!(!sim.overlay().mounted);
    assert!(sim.timeline().is_empty());
    assert_eq!(sim.scheduler().pending(), 0);
}

#[test]
fn second_show_replaces_progress_animation() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.run_until_ms(500);
    let first = sim.coordinator.state().progress_timer.unwrap();
    let before = sim.coordinator.progress();

    sim.act(|c| c.show(false));
    let second = sim.coordinator.state().progress_timer.unwrap();
    assert_ne!(first, second);
    assert_eq!(sim.scheduler().active_progress_timers(), 1);
    assert!(!sim.scheduler().is_live(first));

    sim.run_until_ms(1500);
    let ticks_after_restart: Vec<_> = sim
        .fired()
        .iter()
        .filter(|(at, _, kind)| at.as_millis() > 500 && *kind == TimerKind::ProgressTick)
        .collect();
    assert!(!ticks_after_restart.is_empty());
    assert!(ticks_after_restart.iter().all(|(_, id, _)| *id == second));
    assert!(sim.coordinator.progress() >= before, "restart never moves progress back");
}

#[test]
fn progress_animation_completes_and_stops() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(1000);
    let mid = sim.coordinator.progress();
    assert!(mid > 30.0 && mid < 50.0, "navigation progress at 1s was {mid}");

    sim.run_until_ms(2600);
    assert!((sim.coordinator.progress() - 100.0).abs() < 1e-6);
    assert_eq!(sim.coordinator.state().progress_timer, None);
    assert_eq!(sim.scheduler().active_progress_timers(), 0);
    assert_eq!(sim.overlay().progress_label, "100%");
}

#[test]
fn update_progress_clamps() {
    let mut sim = sim();
    sim.act(|c| c.show(false));

    sim.act(|c| c.update_progress(150.0));
    assert_eq!(sim.coordinator.progress(), 100.0);
    assert_eq!(sim.overlay().progress, 100.0);

    sim.act(|c| c.update_progress(-5.0));
    assert_eq!(sim.coordinator.progress(), 0.0);

    sim.act(|c| c.update_progress(f64::NAN));
    assert_eq!(sim.coordinator.progress(), 0.0);

    sim.act(|c| c.update_progress(42.0));
    assert_eq!(sim.overlay().progress_label, "42%");
}

#[test]
fn explicit_progress_stops_simulated_animation() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.run_until_ms(300);
    sim.act(|c| c.update_progress(70.0));
    assert!(!sim.coordinator.state().animating());
    sim.run_until_ms(1000);
    assert_eq!(sim.coordinator.progress(), 70.0);
}

#[test]
fn update_progress_without_overlay_has_no_effect() {
    let mut sim = sim();
    sim.act(|c| c.update_progress(50.0));
    assert_eq!(sim.coordinator.progress(), 0.0);
    assert!(!sim.overlay().mounted);
}

#[test]
fn start_and_stop_progress() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.act(|c| c.stop_progress());
    assert_eq!(sim.scheduler().active_progress_timers(), 0);
    sim.run_until_ms(500);
    let frozen = sim.coordinator.progress();
    assert_eq!(frozen, 0.0);

    sim.act(|c| c.start_progress(Some(std::time::Duration::from_millis(500))));
    sim.run_until_ms(1000);
    assert!((sim.coordinator.progress() - 100.0).abs() < 1e-6);
    assert!(!sim.coordinator.state().animating());
}

#[test]
fn start_progress_while_hidden_is_ignored() {
    let mut sim = sim();
    sim.act(|c| c.start_progress(None));
    assert_eq!(sim.scheduler().active_progress_timers(), 0);
}

#[test]
fn reshow_drops_stale_deferred_hide() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    sim.run_until_ms(200);
    sim.act(|c| c.hide(false));
    sim.run_until_ms(1000);
    sim.act(|c| c.show(true));

    sim.run_until_ms(1500);
    assert!(sim.overlay().fully_visible(), "stale deferred hide must not hide the re-shown overlay");
    assert_eq!(sim.coordinator.state().started_at.map(|d| d.as_millis()), Some(1000));

    sim.run_until_ms(2400);
    sim.act(|c| c.hide(false));
    assert!(sim.overlay().fully_visible());
    sim.run_until_ms(2500);
    assert!(sim.overlay().fading);
    sim.run_until_ms(3000);
    assert!(!sim.overlay().displayed);
}

#[test]
fn reshow_during_fade_out_keeps_overlay() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.run_until_ms(100);
    sim.act(|c| c.hide(true));
    sim.run_until_ms(300);
    sim.act(|c| c.show(false));

    assert!(sim.overlay().fully_visible());
    assert!(sim.overlay().scroll_locked);
    sim.run_until_ms(700);
    assert!(sim.overlay().fully_visible(), "old fade-out completion must not hide it");
    assert!(sim.coordinator.progress() < 100.0);
}

#[test]
fn messages_rotate_while_visible() {
    let cfg = PreloaderConfig::default();
    let mut sim = Simulation::new(cfg.clone());
    sim.act(|c| c.show(false));
    assert_eq!(sim.overlay().message, cfg.messages[0]);
    sim.run_until_ms(2000);
    assert_eq!(sim.overlay().message, cfg.messages[1]);
    sim.run_until_ms(4000);
    assert_eq!(sim.overlay().message, cfg.messages[2]);
    sim.act(|c| c.hide(false));
    sim.run_until_ms(9000);
    assert_eq!(sim.overlay().message, cfg.messages[2]);
}

#[test]
fn staged_run_walks_every_stage_then_hides() {
    let cfg = PreloaderConfig::default();
    let mut sim = Simulation::new(cfg.clone());
    sim.act(|c| c.run_stages(None));
    assert!(sim.coordinator.is_visible());
    assert_eq!(sim.overlay().message, cfg.stages[0]);

    sim.run_until_ms(1000);
    assert!(cfg.stages.contains(&sim.overlay().message));

    sim.run_until_ms(2750);
    assert_eq!(sim.coordinator.progress(), 100.0);
    assert_eq!(sim.overlay().message, "Carregamento concluído!");
    assert!(sim.coordinator.is_visible());

    sim.run_until_ms(3250);
    assert!(sim.overlay().fading);
    sim.run_until_ms(3750);
    assert!(!sim.overlay().displayed);

    let progress: Vec<f64> = sim
        .timeline()
        .iter()
        .filter_map(|e| match e.call {
            OverlayCall::Progress(p) if e.at_ms < 3250 => Some(p),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[1] >= w[0]), "staged progress went backwards");
}

#[test]
fn back_to_back_staged_runs_do_not_cut_each_other_short() {
    let mut sim = sim();
    sim.act(|c| c.show(false));
    sim.act(|c| c.run_stages(Some(vec!["a".into()])));

    // First run finishes at 550ms; its hide would land at 1050ms
    sim.run_until_ms(600);
    assert_eq!(sim.overlay().message, "Carregamento concluído!");
    let names: Vec<String> = ["x", "y", "z", "w"].iter().map(|s| s.to_string()).collect();
    sim.act(|c| c.run_stages(Some(names.clone())));

    sim.run_until_ms(1100);
    assert!(sim.coordinator.is_visible());
    assert!(!sim.overlay().fading);
    assert!(sim.coordinator.debug_snapshot().stages_running);
    assert!(names.contains(&sim.overlay().message));

    sim.run_until_ms(2800);
    assert_eq!(sim.coordinator.progress(), 100.0);
    assert!(sim.coordinator.is_visible());
    sim.run_until_ms(3300);
    assert!(sim.overlay().fading);
}

#[test]
fn hide_cancels_pending_stages_complete_hide() {
    let mut sim = sim();
    sim.act(|c| c.run_stages(Some(vec!["a".into()])));
    sim.run_until_ms(600);
    sim.act(|c| c.hide(false));
    sim.run_until_ms(1100);
    sim.act(|c| c.show(false));

    sim.run_until_ms(2000);
    assert!(sim.overlay().fully_visible(), "old staged run must not hide a new show");
}

/// Renderer whose mount never takes, like a page without `<body>`
#[derive(Default)]
struct UnmountableOverlay {
    mount_attempts: usize,
}

impl OverlayRenderer for UnmountableOverlay {
    fn is_mounted(&self) -> bool {
        false
    }
    fn mount(&mut self) {
        self.mount_attempts += 1;
    }
    fn reveal(&mut self) {}
    fn begin_fade_out(&mut self) {}
    fn hide_node(&mut self) {}
    fn set_progress(&mut self, _percent: f64) {}
    fn set_message(&mut self, _text: &str) {}
    fn set_scroll_locked(&mut self, _locked: bool) {}
}

#[test]
fn failed_mount_leaves_coordinator_hidden_without_timers() {
    let mut c = Coordinator::new(
        UnmountableOverlay::default(),
        VirtualScheduler::new(),
        PreloaderConfig::default(),
    );
    c.show(false);
    c.show(true);
    c.show_busy("Processando...");
    c.run_stages(None);

    assert_eq!(c.overlay().mount_attempts, 4);
    assert!(!c.is_visible());
    assert_eq!(c.state().phase, Phase::Hidden);
    assert_eq!(c.scheduler().pending(), 0);

    let horizon = Duration::from_secs(60);
    while let Some((id, kind)) = c.scheduler_mut().pop_due(horizon) {
        c.fire(id, kind);
    }
    assert!(!c.is_visible());
}

#[test]
fn debug_snapshot_serializes() {
    let mut sim = sim();
    sim.act(|c| c.show(true));
    let json = serde_json::to_value(sim.coordinator.debug_snapshot()).unwrap();
    assert_eq!(json["visible"], true);
    assert_eq!(json["mode"], "navigation");
    assert_eq!(json["phase"], "visible");
    assert_eq!(json["started_at_ms"], 0);
    assert_eq!(json["guard_armed"], true);
}

/// Small deterministic generator for call sequences
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn invariants_hold_for_arbitrary_call_sequences() {
    for seed in 1..=20u64 {
        let mut rng = Lcg(seed);
        let mut sim = sim();
        for _ in 0..300 {
            let before = sim.coordinator.progress();
            let timer_before = sim.coordinator.state().progress_timer;
            let mut advanced = false;
            match rng.next() % 8 {
                0 => sim.act(|c| c.show(false)),
                1 => sim.act(|c| c.show(true)),
                2 => sim.act(|c| c.hide(false)),
                3 => sim.act(|c| c.hide(true)),
                4 => {
                    let p = (rng.next() % 200) as f64 - 50.0;
                    sim.act(|c| c.update_progress(p))
                }
                5 => sim.act(|c| c.start_progress(None)),
                6 => sim.act(|c| c.stop_progress()),
                _ => {
                    let dt = rng.next() % 700;
                    sim.advance_ms(dt);
                    advanced = true;
                }
            }

            let state = sim.coordinator.state();
            let p = state.progress_percent;
            assert!((0.0..=100.0).contains(&p), "seed {seed}: progress {p} out of range");
            assert!(sim.scheduler().active_progress_timers() <= 1, "seed {seed}: two progress timers");
            if let Some(id) = state.progress_timer {
                assert!(sim.scheduler().is_live(id));
            }
            if state.phase == Phase::Hidden {
                assert_eq!(p, 0.0, "seed {seed}: hidden overlay with progress");
                assert_eq!(state.progress_timer, None);
            }
            if state.mode == Mode::Navigation {
                assert!(state.started_at.is_some());
            }
            if advanced && timer_before.is_some() && state.progress_timer == timer_before {
                assert!(p >= before, "seed {seed}: progress went backwards while animating");
            }
        }
    }
}
