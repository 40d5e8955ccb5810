// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use flowprobe::application::runner::TierRunner;
use flowprobe::config::settings::Settings;
use flowprobe::domain::models::verdict::Tier;
use flowprobe::utils::telemetry;
use tracing::info;

/// 命令行可选的层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TierSelection {
    /// 单元层：独立的功能用例
    Unit,
    /// 集成层：串联的完整流程
    Integration,
    /// 可用性层：浏览器计时与元素检查
    Usability,
    /// 全部层级
    All,
}

/// flowprobe: Biblioteca CUBO 黑盒测试工具
#[derive(Debug, Parser)]
#[command(name = "flowprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// 要运行的层级；省略时使用配置中的 `harness.tiers`
    #[arg(value_enum)]
    tier: Option<TierSelection>,
}

impl Cli {
    /// 解析要运行的层级
    ///
    /// # 参数
    ///
    /// * `configured` - 配置中的默认层级
    fn tiers(&self, configured: &[Tier]) -> Vec<Tier> {
        match self.tier {
            None => configured.to_vec(),
            Some(TierSelection::All) => Tier::all(),
            Some(TierSelection::Unit) => vec![Tier::Unit],
            Some(TierSelection::Integration) => vec![Tier::Integration],
            Some(TierSelection::Usability) => vec![Tier::Usability],
        }
    }
}

/// 主函数
///
/// 加载配置、运行选定层级、在标准输出打印JSON报告；
/// 任一流程未通过时以状态码 1 退出
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    // 2. Initialize logging
    telemetry::init_telemetry(settings.log.json);
    info!(base_url = %settings.target.base_url, "Starting flowprobe...");

    // 3. Select tiers
    let tiers = cli.tiers(&settings.harness.tiers);

    // 4. Run
    let runner = TierRunner::new(settings);
    let reports = runner.run_all(&tiers).await;

    println!("{}", serde_json::to_string_pretty(&reports)?);

    let passed = reports.iter().all(|r| r.passed);
    info!(passed, tiers = reports.len(), "flowprobe finished");
    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
