use anyhow::{bail, Result};
use std::io::{self, Write};

use motion_kinematics::config::{Config, MotionEntry};
use motion_kinematics::log;
use motion_kinematics::logging::Logger;
use motion_kinematics::motion::{walking_cycle, Motion, ProceduralBody};
use motion_kinematics::playback::{MotionSession, TickOutcome};
use motion_kinematics::render::{ArrowKind, MeshState, RecordingScene};
use motion_kinematics::skeleton::{JointGroup, JointIndex, JOINTS};

const CONFIG_PATH: &str = "config.toml";
const SYNTHETIC_FRAMES: usize = 120;
const SYNTHETIC_FPS: f64 = 30.0;

/// カタログの正規化値で合成歩行モーションを作る
fn synthetic_motion(entry: &MotionEntry) -> Result<Motion> {
    let params = walking_cycle(SYNTHETIC_FRAMES, SYNTHETIC_FPS);
    Motion::load(entry.info(), &params, &ProceduralBody::new())
}

fn parse_kind(s: &str) -> Result<ArrowKind> {
    match s {
        "vel" | "velocity" => Ok(ArrowKind::Velocity),
        "acc" | "acceleration" => Ok(ArrowKind::Acceleration),
        _ => bail!("unknown arrow kind: {}", s),
    }
}

fn parse_on_off(s: &str) -> Result<bool> {
    match s {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => bail!("expected on/off: {}", s),
    }
}

fn parse_mesh(s: &str) -> Result<MeshState> {
    match s {
        "transparent" | "t" => Ok(MeshState::Transparent),
        "opaque" | "o" => Ok(MeshState::Opaque),
        "hidden" | "h" => Ok(MeshState::Hidden),
        _ => bail!("unknown mesh state: {}", s),
    }
}

fn parse_group(s: &str) -> Result<JointGroup> {
    match s {
        "torso" => Ok(JointGroup::Torso),
        "rarm" => Ok(JointGroup::RightArm),
        "larm" => Ok(JointGroup::LeftArm),
        "rleg" => Ok(JointGroup::RightLeg),
        "lleg" => Ok(JointGroup::LeftLeg),
        _ => bail!("unknown group: {} (torso/rarm/larm/rleg/lleg)", s),
    }
}

fn print_help() {
    println!("コマンド:");
    println!("  play | reverse | pause | reset");
    println!("  seek N                 - フレーム移動");
    println!("  run N                  - N tick 進める");
    println!("  vel on|off, acc on|off - 矢印の表示");
    println!("  size vel|acc N         - 矢印サイズ (1-5)");
    println!("  window vel|acc N       - 平滑化窓 (1-10)");
    println!("  scale vel|acc on|off   - 大きさを矢印に反映");
    println!("  mesh transparent|opaque|hidden");
    println!("  joint N | group NAME | all on|off");
    println!("  motion N               - カタログ N 番に切り替え");
    println!("  report | status | help | q");
}

fn print_tick(outcome: TickOutcome) {
    match outcome {
        TickOutcome::Idle => {}
        TickOutcome::Stepped { frame } => println!("  frame {}", frame),
        TickOutcome::Stopped { frame, reason } => println!("  stopped at {} ({})", frame, reason),
    }
}

/// 1行分のコマンドを処理する。終了なら false
fn handle(
    parts: &[&str],
    session: &mut MotionSession,
    scene: &mut RecordingScene,
    config: &Config,
) -> Result<bool> {
    match parts {
        ["play"] => {
            session.play(scene);
        }
        ["reverse"] => {
            session.reverse(scene);
        }
        ["pause"] => session.pause(),
        ["reset"] => session.reset(scene),
        ["seek", n] => session.seek(n.parse()?, scene),
        ["run", n] => {
            let n: usize = n.parse()?;
            for _ in 0..n {
                let outcome = session.tick(scene);
                print_tick(outcome);
                if !matches!(outcome, TickOutcome::Stepped { .. }) {
                    break;
                }
            }
        }
        [kind @ ("vel" | "acc"), on] => {
            session.set_arrow_enabled(parse_kind(kind)?, parse_on_off(on)?, scene)
        }
        ["size", kind, n] => session.set_arrow_size(parse_kind(kind)?, n.parse()?)?,
        ["window", kind, n] => session.set_smoothing_window(parse_kind(kind)?, n.parse()?)?,
        ["scale", kind, on] => session.set_scaling_enabled(parse_kind(kind)?, parse_on_off(on)?),
        ["mesh", state] => session.set_mesh_state(parse_mesh(state)?, scene),
        ["joint", n] => {
            let index: usize = n.parse()?;
            let Some(joint) = JointIndex::from_index(index) else {
                bail!("joint index out of range: {}", index);
            };
            let states = session.toggle_joint(joint);
            println!(
                "  {} = {}, all = {}",
                JOINTS[index].name,
                session.selection().is_checked(index),
                states.all
            );
        }
        ["group", name] => {
            let group = parse_group(name)?;
            let states = session.toggle_group(group);
            println!("  {} = {}, all = {}", group.label(), states.get(group), states.all);
        }
        ["all", on] => {
            session.select_all(parse_on_off(on)?);
        }
        ["motion", n] => {
            let index: usize = n.parse()?;
            let Some(entry) = config.motions.get(index) else {
                bail!("no motion #{}", index);
            };
            session.switch_motion(synthetic_motion(entry)?, scene);
            session.spawn_angle_worker();
        }
        ["report"] => {
            let report = session.report();
            println!("  {} frames, {} joints", report.frames, report.joint_count());
            for series in &report.angles {
                if let Some((lo, hi)) = report.angle_range(series.joint) {
                    println!("  {:>16}: {:7.1} .. {:7.1} deg", series.name, lo, hi);
                }
            }
        }
        ["status"] => {
            println!("  motion: {}", session.motion().name());
            println!("  mesh: {:?}, scene: {} geometries", session.mesh_state(), scene.len());
            for kind in ArrowKind::ALL {
                println!("  {:?}: {:?}", kind, session.arrow_setting(kind));
            }
        }
        ["help"] => print_help(),
        ["q"] | ["quit"] => return Ok(false),
        _ => println!("不明なコマンド (help で一覧)"),
    }
    Ok(true)
}

fn main() -> Result<()> {
    let config = Config::load_or_default(CONFIG_PATH);
    let logger = Logger::open(&config.app.log_dir, "session").unwrap_or_else(|e| {
        eprintln!("log file disabled: {:#}", e);
        Logger::console()
    });

    println!("=== Motion Kinematics {} ===", motion_kinematics::VERSION);
    for (i, entry) in config.motions.iter().enumerate() {
        println!("  [{}] {}", i, entry.name);
    }
    println!();
    print_help();
    println!();

    let Some(first) = config.motions.first() else {
        bail!("motion catalog is empty");
    };
    let mut session = MotionSession::new(synthetic_motion(first)?, &config, logger.clone())?;
    let mut scene = RecordingScene::new();
    session.show(&mut scene);
    session.spawn_angle_worker();

    loop {
        print!(
            "[{} {}/{}] > ",
            session.state(),
            session.current_frame(),
            session.motion().num_frames().saturating_sub(1)
        );
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match handle(&parts, &mut session, &mut scene, &config) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                println!("エラー: {:#}", e);
                continue;
            }
        }

        // ループが動いていれば1 tick 進める
        if session.is_loop_active() {
            print_tick(session.tick(&mut scene));
        }
        if session.poll_angle_worker() {
            println!("  angle tables ready");
        }
    }

    log!(logger, "[session] exit");
    logger.flush();
    Ok(())
}
