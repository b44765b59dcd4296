use cafe_server::{Config, DbService, PointsLedger, init_logger_with_file};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 加载配置 (.env + 环境变量)
    let config = Config::from_env();

    // 2. 日志
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );

    tracing::info!(environment = %config.environment, "Cafe server starting...");

    // 3. 数据库 + 迁移
    std::fs::create_dir_all(&config.work_dir)?;
    let db = DbService::new(&config.database_path).await?;

    // 4. 等级配置 + 积分账本
    let ledger = PointsLedger::load(db.pool.clone()).await?;
    for tier in ledger.engine().tiers() {
        tracing::info!(
            tier = %tier.tier,
            min_points = tier.min_points,
            multiplier = %tier.earning_multiplier,
            max_discount = %tier.max_discount_percentage,
            "Tier loaded"
        );
    }

    tracing::info!(database = %config.database_path, "Settlement core ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
