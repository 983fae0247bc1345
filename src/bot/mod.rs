/// 通知操作者用的 Telegram bot
pub mod telegram;
