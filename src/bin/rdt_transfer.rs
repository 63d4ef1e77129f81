//! 单向可靠传输实验
//!
//! client 经不可靠通道把一段文本发给 server，打印迭代次数、通道统计与收发双方计数。

use clap::Parser;
use rdt_sim::error::ConfigError;
use rdt_sim::net::ChannelConfig;
use rdt_sim::sim::{Iteration, ScenarioSpec, Simulator, TransferWorld};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

const DEFAULT_TEXT: &str = "The quick brown fox jumps over the lazy dog. \
Pack my box with five dozen liquor jugs. \
How vexingly quick daft zebras jump!";

#[derive(Debug, Parser)]
#[command(name = "rdt-transfer", about = "经不可靠通道的单向可靠数据传输（逻辑迭代驱动）")]
struct Args {
    /// 要发送的文本
    #[arg(long, conflicts_with = "input")]
    text: Option<String>,

    /// 从文件读取要发送的文本
    #[arg(long)]
    input: Option<PathBuf>,

    /// 场景文件（JSON）；命令行参数覆盖其中的同名项
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// 通道随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 最多运行多少次迭代
    #[arg(long)]
    max_iterations: Option<u64>,

    /// forward 方向丢包比例
    #[arg(long)]
    drop: Option<f64>,

    /// forward 方向延迟比例
    #[arg(long)]
    delay: Option<f64>,

    /// 被延迟的段推迟多少次迭代
    #[arg(long)]
    delay_iterations: Option<u64>,

    /// forward 方向损坏比例
    #[arg(long)]
    corrupt: Option<f64>,

    /// forward 方向乱序比例
    #[arg(long)]
    reorder: Option<f64>,

    /// forward 方向重复比例
    #[arg(long)]
    duplicate: Option<f64>,

    /// 故障同样作用于 reverse（ACK）方向；通道只损坏数据段，`--corrupt` 对 ACK 无效
    #[arg(long, default_value_t = false)]
    faulty_acks: bool,

    /// 输出事件 JSON 文件；不填则不生成
    #[arg(long)]
    viz_json: Option<PathBuf>,

    /// 以 JSON 输出汇总（而不是文本）
    #[arg(long, default_value_t = false)]
    summary_json: bool,
}

const DEFAULT_MAX_ITERATIONS: u64 = 1000;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

/// 返回传输是否完整完成
fn run(args: Args) -> Result<bool, ConfigError> {
    let scenario = match args.scenario.as_deref() {
        Some(path) => Some((ScenarioSpec::from_path(path)?, path.parent().map(PathBuf::from))),
        None => None,
    };

    let data = if let Some(text) = args.text.clone() {
        text
    } else if let Some(path) = args.input.as_ref() {
        fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?
    } else if let Some((spec, dir)) = scenario.as_ref() {
        spec.load_data(dir.as_deref())?
    } else {
        DEFAULT_TEXT.to_owned()
    };

    let spec = scenario.map(|(spec, _)| spec);
    let mut forward = spec.as_ref().map(|s| s.forward.clone()).unwrap_or_default();
    let mut reverse = spec.as_ref().map(|s| s.reverse.clone()).unwrap_or_default();
    apply_overrides(&mut forward, &args);
    if args.faulty_acks {
        apply_overrides(&mut reverse, &args);
    }
    if reverse.corrupt_ratio > 0.0 {
        warn!(
            corrupt_ratio = reverse.corrupt_ratio,
            "reverse 通道只承载 ACK，损坏比例不会生效"
        );
    }

    let seed = args
        .seed
        .or(spec.as_ref().and_then(|s| s.seed))
        .unwrap_or(0);
    let max_iterations = args
        .max_iterations
        .or(spec.as_ref().and_then(|s| s.max_iterations))
        .unwrap_or(DEFAULT_MAX_ITERATIONS);

    let mut sim = Simulator::default();
    let mut world = TransferWorld::new(&data, forward, reverse, seed)?;
    if args.viz_json.is_some() {
        world.enable_viz();
    }

    let outcome = sim.run_until(Iteration(max_iterations), &mut world)?;
    let summary = world.finish(outcome);

    if let Some(path) = args.viz_json.as_ref() {
        if let Some(v) = world.viz.take() {
            let json = v.to_json_pretty()?;
            fs::write(path, json).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            eprintln!("wrote viz events to {}", path.display());
        }
    }

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let f = summary.forward;
        let r = summary.reverse;
        println!(
            "done @ iteration {}\n  transfer: completed={}, intact={}, data_chars={}, received_chars={}\n  forward: data={}, acks={}, dropped={}, delayed={}, corrupted={}, duplicated={}, reordered={}\n  reverse: data={}, acks={}, dropped={}, delayed={}, corrupted={}, duplicated={}, reordered={}",
            summary.iterations,
            summary.completed,
            summary.intact,
            summary.data_chars,
            summary.received_chars,
            f.data_segments,
            f.ack_segments,
            f.dropped,
            f.delayed,
            f.corrupted,
            f.duplicated,
            f.reordered,
            r.data_segments,
            r.ack_segments,
            r.dropped,
            r.delayed,
            r.corrupted,
            r.duplicated,
            r.reordered,
        );
        if let Some(s) = summary.sender {
            println!(
                "  sender: new_segments={}, retransmits={}, acks_seen={}, gap_signals={}",
                s.new_segments, s.retransmits, s.acks_seen, s.gap_signals
            );
        }
        if let Some(r) = summary.receiver {
            println!(
                "  receiver: accepted={}, duplicates={}, corrupted={}, acks_sent={}, gap_acks={}",
                r.accepted, r.duplicates, r.corrupted, r.acks_sent, r.gap_acks
            );
        }
    }

    Ok(summary.completed && summary.intact)
}

fn apply_overrides(cfg: &mut ChannelConfig, args: &Args) {
    if let Some(v) = args.drop {
        cfg.drop_ratio = v;
    }
    if let Some(v) = args.delay {
        cfg.delay_ratio = v;
    }
    if let Some(v) = args.delay_iterations {
        cfg.delay_iterations = v;
    }
    if let Some(v) = args.corrupt {
        cfg.corrupt_ratio = v;
    }
    if let Some(v) = args.reorder {
        cfg.reorder_ratio = v;
    }
    if let Some(v) = args.duplicate {
        cfg.duplicate_ratio = v;
    }
}
