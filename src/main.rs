// ==========================================
// 采购计划决策支持系统 - 命令行入口
// ==========================================
// 用法:
//   procurement-planner [data_dir] [config.json] [--feedback "<text>"] [--json-logs]
//
// - data_dir 默认 ./data; config.json 默认取用户配置目录下的 procurement-planner/config.json
// - data_dir 需包含 forecasts.csv / costs.csv (budget.csv / capacity.csv 可选)
// - 需要人工复核且未给出 --feedback 时,从 stdin 读取一行 (空行 = 批准)
// - 状态快照以 JSON 输出到 stdout,日志输出到 stderr
// ==========================================

use anyhow::Context;
use procurement_planner::config::{default_config_path, PlannerConfig};
use procurement_planner::domain::HumanInput;
use procurement_planner::engine::PlanningOrchestrator;
use procurement_planner::{i18n, logging, PlanningApi, WorkflowState, WorkflowStatus};
use std::io::BufRead;
use std::path::PathBuf;

struct CliArgs {
    data_dir: PathBuf,
    config_path: Option<PathBuf>,
    feedback: Option<String>,
    json_logs: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut positional = Vec::new();
    let mut feedback = None;
    let mut json_logs = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--feedback" => {
                let text = args.next().context("--feedback 需要一个参数")?;
                feedback = Some(text);
            }
            "--json-logs" => json_logs = true,
            "-h" | "--help" => {
                println!("用法: procurement-planner [data_dir] [config.json] [--feedback \"<text>\"] [--json-logs]");
                std::process::exit(0);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    Ok(CliArgs {
        data_dir: positional
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data")),
        config_path: positional.next().map(PathBuf::from),
        feedback,
        json_logs,
    })
}

fn print_state(state: &WorkflowState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

fn read_feedback_line() -> anyhow::Result<String> {
    eprintln!("需要人工复核，请输入反馈 (空行 = 批准):");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config_path = args.config_path.clone().unwrap_or_else(default_config_path);
    let config = PlannerConfig::load(Some(config_path.as_path()))
        .with_context(|| format!("加载规划配置失败: {}", config_path.display()))?;
    i18n::set_locale(&config.locale);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", procurement_planner::APP_NAME, procurement_planner::VERSION);
    tracing::info!("数据目录: {}", args.data_dir.display());
    tracing::info!("==================================================");

    let api = PlanningApi::new(PlanningOrchestrator::from_config(&config));
    tracing::info!(reasoner = api.orchestrator().explainer().reasoner_name(), "解释服务已选定");

    let state = api
        .start_run_from_dir(&args.data_dir, config)
        .await
        .context("规划运行失败")?;
    print_state(&state)?;

    if state.status() == WorkflowStatus::WaitingForInput {
        let feedback = match args.feedback {
            Some(text) => text,
            None => read_feedback_line()?,
        };
        let finished = api
            .submit_feedback(&state.run_id, HumanInput::new(feedback).with_author("cli"))
            .context("提交人工反馈失败")?;
        print_state(&finished)?;
    }

    Ok(())
}
