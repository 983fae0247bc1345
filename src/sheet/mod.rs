use anyhow::Result;
use async_trait::async_trait;

use crate::declare::{QuoteRecord, SheetMode};

/// Google Sheets
pub mod google;

/// 表格後端的窄介面,輪詢迴圈只透過這組操作寫入
#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// 目前已使用的列數
    async fn row_count(&self) -> Result<usize>;

    /// 將多列附加在既有資料之後
    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<()>;

    /// 從指定列(1 起算)開始覆寫多列
    async fn write_rows(&self, start_row: usize, rows: &[Vec<String>]) -> Result<()>;
}

/// 將一批報價依寫入模式送進表格
pub async fn deliver(
    writer: &dyn SheetWriter,
    batch: &[QuoteRecord],
    mode: SheetMode,
    data_start_row: usize,
) -> Result<()> {
    let rows: Vec<Vec<String>> = batch.iter().map(QuoteRecord::to_row).collect();

    match mode {
        SheetMode::Append => writer.append_rows(&rows).await,
        SheetMode::Overwrite => writer.write_rows(data_start_row, &rows).await,
    }
}

/// 表格還是空的才寫入標題列,啟動時執行一次,不在每一輪重複檢查
pub async fn ensure_header(writer: &dyn SheetWriter, header: &[String]) -> Result<()> {
    if writer.row_count().await? == 0 {
        writer.append_rows(&[header.to_vec()]).await?;
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::{testing::MemorySheet, *};

    fn batch(recorded_at: &str, symbols: &[&str]) -> Vec<QuoteRecord> {
        symbols
            .iter()
            .map(|s| QuoteRecord::null_filled(recorded_at.to_string(), s.to_string(), 5))
            .collect()
    }

    #[tokio::test]
    async fn test_ensure_header_writes_once() {
        let sheet = MemorySheet::new();
        let header = vec!["Timestamp".to_string(), "Symbol".to_string()];

        ensure_header(&sheet, &header).await.unwrap();
        ensure_header(&sheet, &header).await.unwrap();

        assert_eq!(*sheet.rows.lock().unwrap(), vec![header]);
    }

    #[tokio::test]
    async fn test_deliver_append_advances_by_batch_length() {
        let sheet = MemorySheet::new();
        let header = vec!["Timestamp".to_string(), "Symbol".to_string()];
        ensure_header(&sheet, &header).await.unwrap();

        let first = batch("2026-08-06 10:15:00", &["A", "B", "C"]);
        let second = batch("2026-08-06 10:16:00", &["A", "B", "C"]);

        deliver(&sheet, &first, SheetMode::Append, 2).await.unwrap();
        deliver(&sheet, &second, SheetMode::Append, 2).await.unwrap();

        let deliveries = sheet.deliveries.lock().unwrap();
        // 標題佔第 1 列,第一批從第 2 列開始,第二批 = 第一批起點 + 批次長度
        assert_eq!(*deliveries, vec![1, 2, 5]);
        assert_eq!(sheet.rows.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_deliver_overwrite_reuses_start_row() {
        let sheet = MemorySheet::new();
        let header = vec!["Timestamp".to_string(), "Symbol".to_string()];
        ensure_header(&sheet, &header).await.unwrap();

        let first = batch("2026-08-06 10:15:00", &["A", "B", "C"]);
        let second = batch("2026-08-06 10:16:00", &["A", "B", "C"]);

        deliver(&sheet, &first, SheetMode::Overwrite, 2)
            .await
            .unwrap();
        deliver(&sheet, &second, SheetMode::Overwrite, 2)
            .await
            .unwrap();

        let deliveries = sheet.deliveries.lock().unwrap();
        assert_eq!(*deliveries, vec![1, 2, 2]);
        // 表格永遠只保留標題與最新一輪
        assert_eq!(sheet.rows.lock().unwrap().len(), 4);

        let grid = sheet.rows.lock().unwrap();
        assert_eq!(grid[1][0], "2026-08-06 10:16:00");
    }
}
