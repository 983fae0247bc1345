use std::env;

use anyhow::Result;
use tokio::sync::watch;

use crate::{
    config::SETTINGS, crawler::nse::Quoter, event::nifty::quote::CollectorContext,
    sheet::google::GoogleSheet,
};

pub mod bot;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod event;
pub mod logging;
pub mod scheduler;
pub mod sheet;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // 必要設定缺漏時在進入輪詢前中止
    SETTINGS.validate()?;

    let mode = SETTINGS.sheet.sheet_mode()?;
    let sheet = GoogleSheet::new(&SETTINGS.sheet)?;
    let quoter = Quoter::new(&SETTINGS.nse).await?;

    // 表格為空時先補標題列,只在啟動時做一次
    sheet::ensure_header(&sheet, &quoter.profile().header()).await?;

    let ctx = CollectorContext {
        quoter,
        sheet: Box::new(sheet),
        mode,
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(scheduler::start(ctx, shutdown_rx));

    let msg = format!(
        "QuoteCollector 已啟動\r\nRust OS/Arch: {}/{}\r\n",
        env::consts::OS,
        env::consts::ARCH
    );
    if let Err(why) = bot::telegram::send(&msg).await {
        logging::error_file_async(format!("Failed to send telegram because {:?}", why));
    }

    tokio::signal::ctrl_c().await?;
    logging::info_file_async("Received shutdown signal".to_string());

    let _ = shutdown_tx.send(true);
    worker.await?;

    Ok(())
}
