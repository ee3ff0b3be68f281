//! Scripted demo run of the automation engine
//!
//! Drives the engine against a synthetic snapshot whose health oscillates,
//! with logging backends standing in for real input and overlay layers.
//! Useful for eyeballing gate/rule/effect behavior without a host.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reflex::backend::{InputBackend, OverlayBackend};
use reflex::bridge::BridgeRegistry;
use reflex::core::types::{Color, KeyCode, KeyRequest, Rect, Vec2};
use reflex::effect::display::DisplayProgressBar;
use reflex::effect::key::PressKey;
use reflex::effect::timing::{Hover, Sequence};
use reflex::effect::vars::{ResetFlag, SetFlag};
use reflex::snapshot::{AreaClass, NearbyEntity, Snapshot, Vitals};
use reflex::{ContextFlags, Engine, EngineConfig, Group, Profile, Rule, SideEffect};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 40)]
    ticks: u64,

    /// Milliseconds between simulated ticks
    #[arg(long, default_value_t = 50)]
    interval_ms: u64,

    /// Optional engine config in TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

struct LogInput;

impl InputBackend for LogInput {
    fn key_press(&mut self, key: KeyCode) {
        info!(code = key.0, "input: key press");
    }
    fn key_down(&mut self, key: KeyCode) {
        info!(code = key.0, "input: key down");
    }
    fn key_up(&mut self, key: KeyCode) {
        info!(code = key.0, "input: key up");
    }
    fn pointer_down(&mut self) {
        info!("input: pointer down");
    }
    fn pointer_up(&mut self) {
        info!("input: pointer up");
    }
    fn pointer_move(&mut self, pos: Vec2) {
        info!(x = pos.x, y = pos.y, "input: pointer move");
    }
}

struct LogOverlay;

impl OverlayBackend for LogOverlay {
    fn measure_text(&mut self, text: &str) -> Vec2 {
        Vec2::new(text.len() as f32 * 7.0, 12.0)
    }
    fn draw_box(&mut self, rect: Rect, _color: Color) {
        tracing::debug!(x = rect.x, y = rect.y, w = rect.width, "overlay: box");
    }
    fn draw_text(&mut self, text: &str, _pos: Vec2, _color: Color) {
        tracing::debug!(%text, "overlay: text");
    }
    fn draw_image(&mut self, id: &str, _rect: Rect, _tint: Color) {
        tracing::debug!(%id, "overlay: image");
    }
    fn load_image(&mut self, id: &str, path: &str) -> bool {
        info!(%id, %path, "overlay: load image");
        true
    }
}

fn demo_profile(hover_dwell: Duration) -> Profile {
    let low_life = Rule::new("low-life flask", |ctx| {
        let Some(vitals) = ctx.snapshot.vitals else {
            return Ok(Vec::new());
        };
        if vitals.health_fraction() < 0.5 && ctx.frame.can_press_key {
            Ok(vec![SideEffect::PressKey(PressKey::new(KeyRequest::Key(
                KeyCode::from_char('1'),
            )))])
        } else {
            Ok(Vec::new())
        }
    });

    let panic_marker = Rule::new("panic marker", |ctx| {
        let Some(vitals) = ctx.snapshot.vitals else {
            return Ok(Vec::new());
        };
        if vitals.health_fraction() < 0.25 {
            Ok(vec![SideEffect::SetFlag(SetFlag::new("panic"))])
        } else {
            Ok(vec![SideEffect::ResetFlag(ResetFlag::new("panic"))])
        }
    });

    let health_bar = Rule::new("health bar", |ctx| {
        let Some(vitals) = ctx.snapshot.vitals else {
            return Ok(Vec::new());
        };
        let bar = DisplayProgressBar::new(
            Rect::new(20.0, 20.0, 200.0, 14.0),
            vitals.health_fraction() as f32,
            Color::GREEN,
            Color::BLACK,
        )
        .with_label("health");
        Ok(vec![SideEffect::DisplayProgressBar(bar)])
    });

    // Hover-then-cast on the nearest hostile: the classic multi-tick
    // protocol, driven by the retry queue until the dwell elapses
    let cull = Rule::new("cull nearest hostile", move |ctx| {
        let target = ctx
            .snapshot
            .nearby
            .iter()
            .filter(|e| e.is_hostile)
            .min_by(|a, b| a.distance.total_cmp(&b.distance));
        let Some(target) = target else {
            return Ok(Vec::new());
        };
        if !ctx.frame.can_press_key {
            return Ok(Vec::new());
        }
        Ok(vec![SideEffect::Sequence(Sequence::new(
            SideEffect::Hover(Hover::new(target.position, hover_dwell)),
            SideEffect::PressKey(PressKey::new(KeyRequest::Key(KeyCode::from_char('Q')))),
        ))])
    });

    Profile::new("demo")
        .with_group(
            Group::new("recovery", ContextFlags::combat_only())
                .with_rule(low_life)
                .with_rule(panic_marker),
        )
        .with_group(Group::new("offense", ContextFlags::combat_only()).with_rule(cull))
        .with_group(Group::new("overlay", ContextFlags::everywhere()).with_rule(health_bar))
}

fn scripted_snapshot(tick: u64, rng: &mut impl Rng) -> Snapshot {
    // Health swings through a slow wave with a little noise so the
    // low-life rule fires in bursts
    let wave = ((tick as f64 / 8.0).sin() + 1.0) / 2.0;
    let health = (wave * 100.0 + rng.gen_range(-5.0..5.0)).clamp(0.0, 100.0);

    // A hostile wanders into range now and then to exercise hover-then-cast
    let nearby = if tick % 13 < 4 {
        vec![NearbyEntity {
            position: Vec2::new(
                rng.gen_range(200.0..1000.0),
                rng.gen_range(150.0..600.0),
            ),
            distance: rng.gen_range(10.0..60.0),
            is_hostile: true,
            health_fraction: rng.gen_range(0.1..1.0),
        }]
    } else {
        Vec::new()
    };

    Snapshot {
        nearby,
        window_focused: true,
        area: AreaClass::Map,
        vitals: Some(Vitals {
            health,
            max_health: 100.0,
            mana: 80.0,
            max_mana: 100.0,
        }),
        has_actor: true,
        ..Snapshot::default()
    }
}

fn main() -> reflex::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => EngineConfig::from_toml(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };

    let mut engine = Engine::new(config)?;
    let mut registry = BridgeRegistry::new();
    engine.install_bridge_queries(&mut registry);

    let profile = demo_profile(engine.config().hover_dwell());
    let mut input = LogInput;
    let mut overlay = LogOverlay;
    let mut rng = rand::thread_rng();

    for tick in 0..args.ticks {
        let snapshot = scripted_snapshot(tick, &mut rng);
        let report = engine.tick(
            Instant::now(),
            &snapshot,
            &profile,
            &registry,
            &mut input,
            &mut overlay,
        );

        info!(
            tick = report.tick,
            verdict = report.verdict.reason(),
            produced = report.produced,
            applied = report.pass_after.applied_unique,
            pending = report.pending,
            "tick complete"
        );

        std::thread::sleep(Duration::from_millis(args.interval_ms));
    }

    info!("history:");
    for entry in engine.history().iter() {
        info!("  {}", entry.description);
    }

    Ok(())
}
