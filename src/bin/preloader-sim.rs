// Replays one page load against the preloader coordinator in virtual time
// and prints when the overlay appears, fades and disappears.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use autentica_preloader::config::SimArgs;
use autentica_preloader::flags::{mark_navigation_pending, FlagStore, MemoryFlagStore, APP_LOADED};
use autentica_preloader::platform;
use autentica_preloader::sim::{OverlayCall, Simulation, TimelineEntry};
use autentica_preloader::{BootPlan, PageContext, ReadyState};

/// Something the page does at a given virtual time
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Action {
    DomParsed,
    Loaded,
    Hide,
    Stages,
}

#[derive(Serialize)]
struct Report<'a> {
    plan: String,
    shown_at_ms: Option<u64>,
    hidden_at_ms: Option<u64>,
    final_progress: f64,
    timeline: Vec<&'a TimelineEntry>,
}

fn main() -> Result<()> {
    // Load .env file if it exists (safe to ignore if not found)
    dotenvy::dotenv().ok();
    platform::init_logging(log::Level::Info);

    let args = SimArgs::parse();
    let config = args.resolve_config().context("Failed to load configuration")?;
    let ready_state: ReadyState = args.ready_state.parse()?;

    let mut store = MemoryFlagStore::new();
    if args.app_loaded {
        store.set(APP_LOADED, "true");
    }
    if args.pending_navigation {
        mark_navigation_pending(&mut store);
    }

    let mut actions: Vec<(u64, Action)> = Vec::new();
    if let Some(t) = args.dom_parsed_at {
        actions.push((t, Action::DomParsed));
    }
    if let Some(t) = args.loaded_at {
        actions.push((t, Action::Loaded));
    }
    if let Some(t) = args.stages_at {
        actions.push((t, Action::Stages));
    }
    actions.extend(args.hide_at.iter().map(|&t| (t, Action::Hide)));
    actions.retain(|(t, _)| *t <= args.until);
    actions.sort();

    let mut sim = Simulation::with_store(config, store);
    let page = PageContext {
        ready_state,
        path: args.path.clone(),
    };
    let plan = sim.boot(&page);
    log::info!("boot plan: {plan:?}");

    for (t, action) in actions {
        sim.run_until_ms(t);
        log::debug!("t={t}ms {action:?}");
        sim.act(|c| match action {
            Action::DomParsed => c.on_dom_parsed(),
            Action::Loaded => c.on_resources_loaded(),
            Action::Hide => c.hide(false),
            Action::Stages => c.run_stages(None),
        });
    }
    sim.run_until_ms(args.until);

    let shown_at_ms = sim
        .timeline()
        .iter()
        .find(|e| e.call == OverlayCall::Reveal)
        .map(|e| e.at_ms);
    let hidden_at_ms = sim
        .timeline()
        .iter()
        .rev()
        .find(|e| e.call == OverlayCall::HideNode)
        .map(|e| e.at_ms);
    let timeline: Vec<&TimelineEntry> = sim
        .timeline()
        .iter()
        .filter(|e| args.verbose || !matches!(e.call, OverlayCall::Progress(_)))
        .collect();

    let report = Report {
        plan: format!("{plan:?}"),
        shown_at_ms,
        hidden_at_ms,
        final_progress: sim.coordinator.progress(),
        timeline,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("plan: {}", report.plan);
    for entry in &report.timeline {
        println!("{:>6}ms  {}", entry.at_ms, describe(&entry.call));
    }
    match (plan, shown_at_ms, hidden_at_ms) {
        (BootPlan::Idle, None, _) => println!("no overlay shown"),
        (_, Some(shown), Some(hidden)) => {
            println!("overlay on screen {}ms", hidden.saturating_sub(shown))
        }
        (_, Some(_), None) => println!("overlay still on screen at {}ms", args.until),
        _ => {}
    }
    Ok(())
}

fn describe(call: &OverlayCall) -> String {
    match call {
        OverlayCall::Mount => "mount overlay".to_string(),
        OverlayCall::Reveal => "show".to_string(),
        OverlayCall::BeginFadeOut => "fade out".to_string(),
        OverlayCall::HideNode => "hidden".to_string(),
        OverlayCall::Progress(p) => format!("progress {p:.1}%"),
        OverlayCall::Message(m) => format!("message \"{m}\""),
        OverlayCall::ScrollLocked(true) => "scroll locked".to_string(),
        OverlayCall::ScrollLocked(false) => "scroll restored".to_string(),
    }
}
