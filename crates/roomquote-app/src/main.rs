//! RoomQuote 命令行入口
//!
//! 读取 JSON 快照或 `.rqa` 自动存档，重新计算并输出分组报价单。

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use roomquote_core::config::LayoutConfig;
use roomquote_core::model::LayoutDocument;
use roomquote_core::pricing::{calculate_full_quotation, Quotation};
use roomquote_file::{load_catalog, native, snapshot};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "roomquote-app")]
#[command(about = "Print the grouped quotation of a RoomQuote layout")]
#[command(version)]
struct CliArgs {
    /// 项目快照（.json）或自动存档（.rqa）
    snapshot: PathBuf,

    /// 覆盖默认阈值的配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 目录文件，加载后列出条目
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// 以 JSON 输出报价单
    #[arg(long)]
    json: bool,

    /// 同时写出压缩自动存档
    #[arg(long)]
    autosave: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn load_document(path: &Path, config: &LayoutConfig) -> Result<LayoutDocument> {
    let is_archive = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("rqa"));
    let loaded = if is_archive {
        native::load(path, config)
    } else {
        snapshot::load(path, config)
    };
    loaded.with_context(|| format!("loading {}", path.display()))
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn print_quotation(quotation: &Quotation, construction_area: f64) {
    for line in &quotation.line_items {
        if line.is_header {
            println!();
            println!("【{}】 小計 {}", line.name, format_amount(line.total_price));
        } else if line.is_addon {
            println!(
                "    + {} {} {} = {}",
                line.name,
                format_amount(line.quantity),
                line.unit,
                format_amount(line.total_price)
            );
        } else {
            let note = if line.note.is_empty() {
                String::new()
            } else {
                format!(" ({})", line.note)
            };
            println!(
                "  {}{} {} {} = {}",
                line.name,
                note,
                format_amount(line.quantity),
                line.unit,
                format_amount(line.total_price)
            );
        }
    }
    println!();
    if construction_area > 0.0 {
        println!("施工面積 {} 坪", format_amount(construction_area));
    }
    println!("總計 {}", format_amount(quotation.grand_total));
}

fn main() -> Result<()> {
    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let args = CliArgs::parse();
    info!("Starting RoomQuote...");

    let config = load_config(args.config.as_deref())?;

    if let Some(path) = &args.catalog {
        let entries = load_catalog(path)?;
        for entry in &entries {
            info!(
                "Catalog: {} {}x{} @ {} / {}",
                entry.name,
                entry.width,
                entry.depth,
                entry.unit_price,
                entry.unit_label()
            );
        }
    }

    let doc = load_document(&args.snapshot, &config)?;
    let quotation = calculate_full_quotation(&doc, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&quotation)?);
    } else {
        print_quotation(&quotation, doc.construction_area);
    }

    if let Some(path) = &args.autosave {
        native::save(&doc, path).with_context(|| format!("writing {}", path.display()))?;
    }

    Ok(())
}
