use std::time::Duration;

use tokio::{sync::watch, time};

use crate::{bot, config::SETTINGS, event::nifty::quote::CollectorContext, event, logging};

/// 啟動輪詢排程:一輪蒐集加一段休眠,直到收到關閉訊號。
///
/// 單一股票抓取失敗不會中斷該輪,寫入表格失敗也只影響該輪,
/// 記錄並通知操作者後照常進入下一輪。
pub async fn start(ctx: CollectorContext, mut shutdown: watch::Receiver<bool>) {
    let cycle_interval = Duration::from_secs(SETTINGS.collector.cycle_interval_secs);

    logging::info_file_async(format!(
        "Scheduler started, {} symbols per cycle, cycle interval {}s",
        SETTINGS.collector.symbols.len(),
        SETTINGS.collector.cycle_interval_secs
    ));

    loop {
        if *shutdown.borrow() {
            break;
        }

        let start = time::Instant::now();

        if let Err(why) = event::nifty::quote::execute(&ctx, &mut shutdown).await {
            logging::error_file_async(format!(
                "Failed to execute quote collection because {:?}",
                why
            ));

            let alert = format!("QuoteCollector 寫入失敗\r\n{:?}", why);
            if let Err(why) = bot::telegram::send(&alert).await {
                logging::error_file_async(format!(
                    "Failed to send telegram alert because {:?}",
                    why
                ));
            }
        }

        logging::debug_file_async(format!(
            "cycle finished in {} ms",
            start.elapsed().as_millis()
        ));

        if wait_or_shutdown(cycle_interval, &mut shutdown).await {
            break;
        }
    }

    logging::info_file_async("Scheduler stopped".to_string());
}

/// 可被關閉訊號中斷的休眠。
///
/// 回傳 true 表示收到關閉訊號;檔間延遲與輪間休眠都經過這裡,
/// 關閉的延遲上限因此只剩單一請求的逾時。
pub(crate) async fn wait_or_shutdown(
    delay: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    tokio::select! {
        _ = time::sleep(delay) => false,
        _ = shutdown.changed() => true,
    }
}

#[cfg(test)]
mod tests {
    // 注意這個慣用法：在 tests 模組中，從外部範疇匯入所有名字。
    use super::*;

    #[tokio::test]
    async fn test_wait_or_shutdown_completes_without_signal() {
        let (_tx, mut rx) = watch::channel(false);

        assert!(!wait_or_shutdown(Duration::from_millis(10), &mut rx).await);
    }

    #[tokio::test]
    async fn test_wait_or_shutdown_observes_existing_signal() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        assert!(wait_or_shutdown(Duration::from_secs(3600), &mut rx).await);
    }

    #[tokio::test]
    async fn test_wait_or_shutdown_interrupts_long_sleep() {
        let (tx, mut rx) = watch::channel(false);

        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(true);
        });

        let interrupted = time::timeout(
            Duration::from_secs(5),
            wait_or_shutdown(Duration::from_secs(3600), &mut rx),
        )
        .await
        .unwrap();

        assert!(interrupted);
    }
}
