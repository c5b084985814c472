use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use taskboard::auth::Credentials;
use taskboard::config::AppConfig;
use taskboard::error::Result;
use taskboard::realtime::{ProjectHub, RealtimeServer};
use taskboard::search::ProjectFilter;
use taskboard::service::AppServices;
use taskboard::service::seed::{MOCK_EMAIL, MOCK_PASSWORD};
use taskboard::tasks::{
    NewSubtask, NewTask, Priority, Progress, SubtaskPatch, TaskPatch, TaskStats, TaskStatus,
    parse_due_date,
};

#[derive(Parser)]
#[command(name = "taskboard", version, about = "项目任务看板：任务、子任务与进度聚合")]
struct Cli {
    /// YAML 配置文件；环境变量 TASKBOARD_* 会覆盖其中的值
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 列出全部任务
    List,
    /// 查看单个任务
    Show { id: String },
    /// 新建任务
    Create(CreateArgs),
    /// 修改任务字段
    Update(UpdateArgs),
    /// 删除任务
    Delete { id: String },
    /// 给任务添加子任务
    SubtaskAdd(SubtaskAddArgs),
    /// 设置子任务进度 (0-100)
    SubtaskProgress {
        task: String,
        subtask: String,
        value: i64,
    },
    /// 搜索当前用户负责或参与的任务
    Search(SearchArgs),
    /// 任务统计
    Stats,
    /// 登录并输出会话
    Login(LoginArgs),
    /// 启动 WebSocket 房间服务
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// YYYY-MM-DD
    #[arg(long)]
    due: String,
    /// low | medium | high
    #[arg(long, default_value = "medium")]
    priority: String,
    #[arg(long, default_value = "1")]
    owner: String,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// "In Progress" | completed | expired | closed
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    due: Option<String>,
}

#[derive(Args)]
struct SubtaskAddArgs {
    task: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    progress: Option<i64>,
    #[arg(long = "assignee")]
    assignees: Vec<String>,
    #[arg(long, default_value = "1")]
    by: String,
}

#[derive(Args)]
struct LoginArgs {
    #[arg(long, default_value = MOCK_EMAIL)]
    email: String,
    #[arg(long, default_value = MOCK_PASSWORD)]
    password: String,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    /// 截止日期下限 (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// 截止日期上限 (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    #[command(flatten)]
    login: LoginArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error[{}]: {}", e.kind().as_str(), e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            dotenv::dotenv().ok();
            AppConfig::load(path)?.merge_env(std::env::vars())
        }
        None => AppConfig::from_env(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let services = AppServices::from_config(&config)?;
    let tasks = &services.tasks;

    match cli.command {
        Command::List => print_json(&tasks.get_tasks().await?),
        Command::Show { id } => print_json(&tasks.get_task(&id).await?),
        Command::Create(args) => {
            let input = NewTask::new(
                args.title,
                args.description,
                parse_due_date(&args.due)?,
                args.owner,
            )
            .with_priority(args.priority.parse::<Priority>()?);
            print_json(&tasks.create_task(input).await?)
        }
        Command::Update(args) => {
            let mut patch = TaskPatch::new();
            if let Some(title) = args.title {
                patch = patch.title(title);
            }
            if let Some(description) = args.description {
                patch = patch.description(description);
            }
            if let Some(status) = args.status {
                patch = patch.status(status.parse::<TaskStatus>()?);
            }
            if let Some(priority) = args.priority {
                patch = patch.priority(priority.parse::<Priority>()?);
            }
            if let Some(due) = args.due {
                patch = patch.due_date(parse_due_date(&due)?);
            }
            print_json(&tasks.update_task(&args.id, patch).await?)
        }
        Command::Delete { id } => {
            tasks.delete_task(&id).await?;
            println!("已删除任务 {}", id);
            Ok(())
        }
        Command::SubtaskAdd(args) => {
            let mut input = NewSubtask::new(args.title).with_assignee(args.assignees);
            if let Some(progress) = args.progress {
                input = input.with_progress(Progress::new(progress)?);
            }
            print_json(&tasks.add_subtask(&args.task, input, &args.by).await?)
        }
        Command::SubtaskProgress {
            task,
            subtask,
            value,
        } => {
            let patch = SubtaskPatch::progress(Progress::new(value)?);
            let task = tasks.update_subtask(&task, &subtask, patch).await?;
            tracing::info!(task = %task.id, progress = task.progress(), "子任务进度已更新");
            print_json(&task)
        }
        Command::Search(args) => {
            let session = services
                .users
                .login(&Credentials::new(args.login.email, args.login.password))
                .await?;
            let mut filter = ProjectFilter::new();
            if let Some(query) = args.query {
                filter = filter.query(query);
            }
            if let Some(status) = args.status {
                filter = filter.status(status.parse::<TaskStatus>()?);
            }
            if let Some(priority) = args.priority {
                filter = filter.priority(priority.parse::<Priority>()?);
            }
            let start = args.from.as_deref().map(parse_due_date).transpose()?;
            let end = args.to.as_deref().map(parse_due_date).transpose()?;
            filter = filter.between(start, end);
            print_json(&tasks.search(&session, &filter).await?)
        }
        Command::Stats => {
            let all = tasks.get_tasks().await?;
            let stats = TaskStats::collect(&all, chrono::Local::now().date_naive());
            eprintln!("{}", stats.summary());
            print_json(&stats)
        }
        Command::Login(args) => {
            let session = services
                .users
                .login(&Credentials::new(args.email, args.password))
                .await?;
            print_json(&session)
        }
        Command::Serve { port } => {
            let port = port.unwrap_or(config.realtime_port);
            let server = RealtimeServer::bind(("127.0.0.1", port), ProjectHub::new()).await?;
            tracing::info!(addr = %server.local_addr(), "按 Ctrl+C 退出");
            tokio::select! {
                result = server.wait() => result,
                _ = tokio::signal::ctrl_c() => Ok(()),
            }
        }
    }
}
