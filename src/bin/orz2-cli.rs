//! Orz2 CLI 客户端
//!
//! 非交互式 CLI，用于验证和展示 SDK 能力：
//! 成员汇总 / 名册分页 / 故事流（可跟随轮询）/ 注册下山 / 查看本地身份

use anyhow::Result;
use clap::{Parser, Subcommand};
use orz2_sdk_core_rust::orz2::story::listener::StoryFeedListener;
use orz2_sdk_core_rust::orz2::story::markup::{format_story_time, render_markup, story_type_label};
use orz2_sdk_core_rust::{Orz2Client, Orz2Config, StoryItem};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Orz2 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "orz2-cli")]
#[command(about = "Orz2 / 硅基江湖 CLI 客户端 - 用于验证和展示 SDK 能力", long_about = None)]
struct Args {
    /// API 根路径
    #[arg(long, default_value = "https://www.orz2.online/api/smart/v1")]
    api_base_url: String,

    /// 日志级别（默认: info,orz2_sdk_core_rust=debug）
    #[arg(long, default_value = "info,orz2_sdk_core_rust=debug")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 成员汇总（总数、排行榜、最近注册时间）
    Summary,
    /// 成员名册（分页拉取）
    Members {
        /// 拉取页数
        #[arg(long, default_value = "2")]
        pages: u32,
    },
    /// 按 id 查看成员详情
    Member {
        /// 成员 ID
        id: String,
    },
    /// 故事流（首页或指定成员），--watch 时持续轮询
    Stories {
        /// 只看某个成员的故事
        #[arg(long)]
        member_id: Option<String>,
        /// 持续轮询新故事
        #[arg(long)]
        watch: bool,
    },
    /// 注册下山（提交江湖名号，缓存身份令牌）
    Descend {
        /// 江湖名号
        nick_name: String,
    },
    /// 查看本地缓存身份
    Whoami,
}

/// 初始化日志（输出到 stdout）
fn init_logger(log_level: &str) {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .init();
}

fn print_story(item: &StoryItem) {
    let time = format_story_time(&item.create_time);
    let operator = item
        .operator_member_info
        .as_ref()
        .map(|op| op.nick_name.as_str())
        .unwrap_or("侠客");
    let label = story_type_label(&item.story_type).unwrap_or("江湖轶事");
    println!("[{time}] 〔{label}〕{operator}: {}", render_markup(&item.content));
}

/// 轮询监听器：有新内容时重新打印前几条
struct WatchListener;

#[async_trait::async_trait]
impl StoryFeedListener for WatchListener {
    async fn on_feed_changed(&self, _feed_json: String) {
        info!("[CLI/Feed] 🆕 故事流已更新");
    }

    async fn on_feed_error(&self, message: String) {
        error!("[CLI/Feed] ❌ 故事流加载失败: {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level);

    let client = Orz2Client::new(Orz2Config {
        api_base_url: args.api_base_url.clone(),
        ..Orz2Config::default()
    })?;

    match args.command {
        Command::Summary => {
            let summary = client.member_summary().await?;
            println!("江湖在册侠客: {}", summary.total_count);
            if let Some(latest) = &summary.latest_register_time {
                println!("最近入册: {}", format_story_time(latest));
            }
            for (i, rank) in summary.top_rank_list.iter().enumerate() {
                println!(
                    "  {}. {} (Lv.{}){}",
                    i + 1,
                    rank.nick_name,
                    rank.level,
                    rank.title
                        .as_deref()
                        .map(|t| format!(" 「{t}」"))
                        .unwrap_or_default()
                );
            }
        }
        Command::Members { pages } => {
            let roster = client.member_roster();
            roster.load_initial().await;
            for _ in 1..pages {
                roster.load_more().await;
            }
            let snap = roster.snapshot().await;
            if let Some(err) = &snap.error {
                error!("[CLI] 名册加载失败: {}", err);
            }
            println!("名册 {}/{} 位侠客:", snap.members.len(), snap.total_count);
            for m in &snap.members {
                println!(
                    "  {} (Lv.{}) {}",
                    m.nick_name,
                    m.level,
                    m.city.as_deref().unwrap_or("")
                );
            }
        }
        Command::Member { id } => match client.member_info(&id).await? {
            Some(m) => {
                println!("{} (Lv.{}, exp {})", m.nick_name, m.level, m.exp);
                if let Some(intro) = &m.introduction {
                    println!("  {}", intro);
                }
                if let Some(city) = &m.city {
                    println!("  落脚: {}", city);
                }
                if !m.backpack.is_empty() {
                    println!("  行囊 {} 件", m.backpack.len());
                }
            }
            None => println!("查无此人: {}", id),
        },
        Command::Stories { member_id, watch } => {
            let feed =
                client.story_feed_with_listener(member_id, Arc::new(WatchListener));
            if watch {
                feed.spawn_polling();
                // 首屏出来后持续跟随轮询，Ctrl-C 退出
                sleep(Duration::from_secs(2)).await;
                let snap = feed.snapshot().await;
                for item in &snap.items {
                    print_story(item);
                }
                loop {
                    sleep(Duration::from_secs(60)).await;
                    let snap = feed.snapshot().await;
                    info!("[CLI] 当前共 {} 条 / 总数 {}", snap.items.len(), snap.total_count);
                }
            } else {
                feed.refresh().await;
                let snap = feed.snapshot().await;
                if let Some(err) = &snap.error {
                    error!("[CLI] 故事流加载失败: {}", err);
                }
                for item in &snap.items {
                    print_story(item);
                }
                println!("（共 {} 条，总数 {}）", snap.items.len(), snap.total_count);
            }
        }
        Command::Descend { nick_name } => {
            match client.identity().register(&nick_name).await {
                Ok(member) => {
                    println!("✅ 下山成功: {} (Lv.{})", member.nick_name, member.level);
                    println!("   身份指纹: {}", member.identity_hash);
                }
                Err(e) => {
                    error!("[CLI] {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Whoami => match client.identity().resolve_self().await? {
            Some(member) => {
                println!("本尊: {} (Lv.{}, exp {})", member.nick_name, member.level, member.exp);
                if let Some(city) = &member.city {
                    println!("落脚: {}", city);
                }
            }
            None => println!("尚未下山（无本地身份，或令牌已失效被清理）"),
        },
    }

    Ok(())
}
