use anyhow::Result;
use std::sync::{mpsc, Mutex};
use std::time::{Duration, Instant};

use bevy::app::{App, AppExit, ScheduleRunnerPlugin, Update};
use bevy::ecs::prelude::*;

use motion_kinematics::config::{Config, MotionEntry};
use motion_kinematics::log;
use motion_kinematics::logging::Logger;
use motion_kinematics::motion::{walking_cycle, Motion, ProceduralBody};
use motion_kinematics::playback::{MotionSession, TickOutcome};
use motion_kinematics::render::{ArrowKind, MeshState, RecordingScene};

const CONFIG_PATH: &str = "config.toml";
const SYNTHETIC_FRAMES: usize = 240;
const SYNTHETIC_FPS: f64 = 30.0;

// --- Bevy Resources ---

/// セッションとシーン（ワーカーの Receiver を持つのでメインスレッド専用）
struct Player {
    session: MotionSession,
    scene: RecordingScene,
}

#[derive(Resource)]
struct CommandRx(Mutex<mpsc::Receiver<String>>);

#[derive(Resource)]
struct Catalog(Vec<MotionEntry>);

#[derive(Resource)]
struct StatsTimer {
    ticks: u32,
    timer: Instant,
}

#[derive(Resource)]
struct LogRes(Logger);

fn synthetic_motion(entry: &MotionEntry) -> Result<Motion> {
    let params = walking_cycle(SYNTHETIC_FRAMES, SYNTHETIC_FPS);
    Motion::load(entry.info(), &params, &ProceduralBody::new())
}

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let logger = Logger::open(&config.app.log_dir, "player")?;

    log!(logger, "Motion Kinematics player {}", motion_kinematics::VERSION);
    log!(logger, "Target FPS: {}", config.app.target_fps);
    log!(logger, "Motions: {}", config.motions.len());

    let Some(first) = config.motions.first() else {
        anyhow::bail!("motion catalog is empty");
    };
    let mut session = MotionSession::new(synthetic_motion(first)?, &config, logger.clone())?;
    let mut scene = RecordingScene::new();
    session.show(&mut scene);
    session.spawn_angle_worker();

    // コンソール入力スレッド
    let (cmd_tx, cmd_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if cmd_tx.send(line.trim().to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    log!(logger, "");
    log!(
        logger,
        "操作: play / reverse / pause / reset / seek N / vel on|off / acc on|off / mesh STATE / motion N / q"
    );
    log!(logger, "");

    let frame_duration = Duration::from_secs_f64(1.0 / config.app.target_fps.max(1) as f64);

    let mut app = App::new();
    app.add_plugins(ScheduleRunnerPlugin::run_loop(frame_duration))
        .insert_non_send_resource(Player { session, scene })
        .insert_resource(CommandRx(Mutex::new(cmd_rx)))
        .insert_resource(Catalog(config.motions.clone()))
        .insert_resource(StatsTimer {
            ticks: 0,
            timer: Instant::now(),
        })
        .insert_resource(LogRes(logger.clone()))
        .add_systems(Update, (command_system, tick_system, stats_system).chain());

    app.run();

    log!(logger, "Shutting down...");
    logger.flush();
    Ok(())
}

// --- Systems ---

fn command_system(
    mut player: NonSendMut<Player>,
    rx: Res<CommandRx>,
    catalog: Res<Catalog>,
    lf: Res<LogRes>,
    mut exit: EventWriter<AppExit>,
) {
    let Ok(rx) = rx.0.lock() else {
        return;
    };
    let Player { session, scene } = &mut *player;

    while let Ok(line) = rx.try_recv() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["play"] => {
                session.play(scene);
            }
            ["reverse"] => {
                session.reverse(scene);
            }
            ["pause"] => session.pause(),
            ["reset"] => session.reset(scene),
            ["seek", n] => match n.parse() {
                Ok(frame) => session.seek(frame, scene),
                Err(e) => log!(lf.0, "seek: {}", e),
            },
            [kind @ ("vel" | "acc"), on] => {
                let kind = if *kind == "vel" {
                    ArrowKind::Velocity
                } else {
                    ArrowKind::Acceleration
                };
                session.set_arrow_enabled(kind, *on == "on", scene);
            }
            ["mesh", state] => {
                let state = match *state {
                    "opaque" => MeshState::Opaque,
                    "hidden" => MeshState::Hidden,
                    _ => MeshState::Transparent,
                };
                session.set_mesh_state(state, scene);
            }
            ["motion", n] => {
                let entry = n.parse::<usize>().ok().and_then(|i| catalog.0.get(i));
                match entry.map(synthetic_motion) {
                    Some(Ok(motion)) => {
                        session.switch_motion(motion, scene);
                        session.spawn_angle_worker();
                    }
                    Some(Err(e)) => log!(lf.0, "motion load failed: {:#}", e),
                    None => log!(lf.0, "no motion #{}", n),
                }
            }
            ["q"] | ["quit"] => {
                exit.send(AppExit::Success);
            }
            _ => log!(lf.0, "unknown command: {}", line),
        }
    }
}

fn tick_system(mut player: NonSendMut<Player>, mut stats: ResMut<StatsTimer>) {
    let Player { session, scene } = &mut *player;
    if let TickOutcome::Stepped { .. } | TickOutcome::Stopped { .. } = session.tick(scene) {
        stats.ticks += 1;
    }
    // 停止中にだけ角度テーブルを取り込む
    session.poll_angle_worker();
}

fn stats_system(player: NonSend<Player>, mut stats: ResMut<StatsTimer>, lf: Res<LogRes>) {
    let elapsed = stats.timer.elapsed();
    if elapsed < Duration::from_secs(1) {
        return;
    }
    let session = &player.session;
    log!(
        lf.0,
        "[{}] frame {}/{} state={} ticks/s={:.1} scene={} (vel {} / acc {})",
        session.motion().name(),
        session.current_frame(),
        session.motion().num_frames().saturating_sub(1),
        session.state(),
        stats.ticks as f64 / elapsed.as_secs_f64(),
        player.scene.len(),
        player.scene.arrow_count(ArrowKind::Velocity),
        player.scene.arrow_count(ArrowKind::Acceleration),
    );
    stats.ticks = 0;
    stats.timer = Instant::now();
}
