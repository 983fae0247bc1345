use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::{Asia::Kolkata, Tz};
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::{
    config::SETTINGS,
    crawler::nse::Quoter,
    declare::{QuoteRecord, SheetMode},
    logging, scheduler, sheet,
    sheet::SheetWriter,
    util::datetime::Weekend,
};

/// 輪詢迴圈共用的工作階段與寫入端,啟動時建構一次後以參考傳遞
pub struct CollectorContext {
    pub quoter: Quoter,
    pub sheet: Box<dyn SheetWriter>,
    pub mode: SheetMode,
}

/// 執行一輪報價蒐集。
///
/// 依設定順序逐檔抓取,失敗的股票以空值列補位,批次長度恆等於
/// 追蹤清單長度,輸出列的順序與清單一致。整批組完才一次寫入表格。
pub async fn execute(ctx: &CollectorContext, shutdown: &mut watch::Receiver<bool>) -> Result<()> {
    let cfg = &SETTINGS.collector;
    let now = Utc::now().with_timezone(&Kolkata);

    if cfg.trading_hours_only && !within_trading_hours(&now) {
        logging::debug_file_async("非交易時段,本輪略過".to_string());
        return Ok(());
    }

    let recorded_at = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let field_count = ctx.quoter.profile().field_count();
    let mut batch = Vec::with_capacity(cfg.symbols.len());

    for stock_symbol in &cfg.symbols {
        let fetched = ctx.quoter.quote(stock_symbol).await;
        batch.push(record_from_fetch(
            &recorded_at,
            stock_symbol,
            field_count,
            fetched,
        ));

        // 與上游保持最小請求間距,避免被 NSE 封禁
        let delay = Duration::from_millis(cfg.symbol_delay_millis);
        if scheduler::wait_or_shutdown(delay, shutdown).await {
            logging::info_file_async("Shutdown signalled during cycle, batch discarded".to_string());
            return Ok(());
        }
    }

    sheet::deliver(
        ctx.sheet.as_ref(),
        &batch,
        ctx.mode,
        SETTINGS.sheet.data_start_row,
    )
    .await?;

    logging::info_file_async(format!("{} pushed {} rows", recorded_at, batch.len()));

    Ok(())
}

/// 抓取結果轉成批次中的一列,失敗時以空值列補位維持列的對齊
pub(crate) fn record_from_fetch(
    recorded_at: &str,
    stock_symbol: &str,
    field_count: usize,
    fetched: Result<Vec<Option<Decimal>>>,
) -> QuoteRecord {
    match fetched {
        Ok(values) => QuoteRecord::new(
            recorded_at.to_string(),
            stock_symbol.to_string(),
            values,
        ),
        Err(why) => {
            logging::error_file_async(format!(
                "Failed to fetch quote({}) because {:?}",
                stock_symbol, why
            ));

            QuoteRecord::null_filled(
                recorded_at.to_string(),
                stock_symbol.to_string(),
                field_count,
            )
        }
    }
}

/// NSE 盤中時段為 IST 09:15-15:30,週六日休市
fn within_trading_hours(now: &DateTime<Tz>) -> bool {
    if now.is_weekend() {
        return false;
    }

    let minutes = now.hour() * 60 + now.minute();

    (9 * 60 + 15..=15 * 60 + 30).contains(&minutes)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_record_from_fetch_keeps_values_on_success() {
        let record = record_from_fetch(
            "2026-08-06 10:15:00",
            "RELIANCE",
            5,
            Ok(vec![Some(dec!(101.5)), None, Some(dec!(99.0))]),
        );

        assert_eq!(record.stock_symbol, "RELIANCE");
        assert_eq!(record.values, vec![Some(dec!(101.5)), None, Some(dec!(99.0))]);
    }

    #[test]
    fn test_record_from_fetch_null_fills_on_failure() {
        let record = record_from_fetch(
            "2026-08-06 10:15:00",
            "SBIN",
            5,
            Err(anyhow!("connection timed out")),
        );

        assert_eq!(record.stock_symbol, "SBIN");
        assert_eq!(record.recorded_at, "2026-08-06 10:15:00");
        assert_eq!(record.values, vec![None; 5]);
    }

    #[test]
    fn test_batch_keeps_symbol_alignment_and_single_timestamp() {
        // A 與 C 抓取成功,B 逾時,批次仍須三列且共用同一個時間戳
        let recorded_at = "2026-08-06 10:15:00";
        let fetched = vec![
            Ok(vec![Some(dec!(101.5))]),
            Err(anyhow!("connection timed out")),
            Ok(vec![Some(dec!(99.0))]),
        ];
        let symbols = ["A", "B", "C"];

        let batch: Vec<QuoteRecord> = symbols
            .iter()
            .zip(fetched)
            .map(|(symbol, result)| record_from_fetch(recorded_at, symbol, 1, result))
            .collect();

        assert_eq!(batch.len(), symbols.len());
        assert!(batch.iter().all(|r| r.recorded_at == recorded_at));
        assert_eq!(batch[0].values, vec![Some(dec!(101.5))]);
        assert_eq!(batch[1].values, vec![None]);
        assert_eq!(batch[2].values, vec![Some(dec!(99.0))]);
    }

    #[test]
    fn test_within_trading_hours() {
        // 2026-08-06 是星期四
        let in_session = Kolkata.with_ymd_and_hms(2026, 8, 6, 10, 0, 0).unwrap();
        let before_open = Kolkata.with_ymd_and_hms(2026, 8, 6, 9, 14, 0).unwrap();
        let at_close = Kolkata.with_ymd_and_hms(2026, 8, 6, 15, 30, 0).unwrap();
        let after_close = Kolkata.with_ymd_and_hms(2026, 8, 6, 15, 31, 0).unwrap();
        let saturday = Kolkata.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap();

        assert!(within_trading_hours(&in_session));
        assert!(!within_trading_hours(&before_open));
        assert!(within_trading_hours(&at_close));
        assert!(!within_trading_hours(&after_close));
        assert!(!within_trading_hours(&saturday));
    }
}
